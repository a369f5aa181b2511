pub mod error;
pub mod benchmark_utils;
pub mod sweep_config;
pub mod output_paths;
pub mod command;
pub mod grid_runner;
pub mod text_extract;
pub mod formatted_report;
pub mod profiler_report;
pub mod summary;
