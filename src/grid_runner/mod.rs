use crate::benchmark_utils::format_decimal;
use crate::command::{ExternalCommand, ProcessRunner};
use crate::error::{Result, SweepError};
use crate::output_paths::CellPaths;
use crate::sweep_config::{GridCell, SweepConfig};
use std::fs;

/// Benchmark invocation for one cell. stdout and stderr both land in the raw output file.
pub fn benchmark_command(config: &SweepConfig, cell: &GridCell, paths: &CellPaths) -> ExternalCommand {
    let command = ExternalCommand::new(&config.benchmark_executable, &paths.raw_output)
        .flag("input_filename", config.input_file.display())
        .flag("bulkload_percent", format_decimal(cell.bulkload_ratio))
        .flag("insert_method", cell.insert_method.code());

    let command = if config.records_counters() {
        command.flag("perf_datafile", paths.counter_data.display())
    } else {
        command
    };

    command.merge_stderr()
}

/// Counter report rendering for one cell: call-graph annotated, demangled, sorted by period.
pub fn report_command(config: &SweepConfig, paths: &CellPaths) -> ExternalCommand {
    ExternalCommand::new(&config.report_tool, &paths.counter_report)
        .arg("report")
        .arg("--show-nr-samples")
        .arg("--show-total-period")
        .arg("-g")
        .arg("graph,0.5,caller,period")
        .arg("--children")
        .arg("--fields=+period")
        .arg("--field-separator=,")
        .arg("--demangle")
        .flag("input", paths.counter_data.display())
}

/// Executes the whole grid, one cell at a time, ratio-major.
pub struct ParameterGridRunner<'a, R: ProcessRunner> {
    config: &'a SweepConfig,
    runner: R,
}

impl<'a, R: ProcessRunner> ParameterGridRunner<'a, R> {
    pub fn new(config: &'a SweepConfig, runner: R) -> Self {
        ParameterGridRunner { config, runner }
    }

    /// Runs every cell and returns how many completed. Stops at the first failing cell.
    pub fn run(&mut self) -> Result<usize> {
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| SweepError::io(&self.config.output_dir, e))?;

        let cells = self.config.execution_order();
        for (i, cell) in cells.iter().enumerate() {
            log::info!(
                "({}/{}) bulkload_percent={} method={} ({})",
                i + 1,
                cells.len(),
                format_decimal(cell.bulkload_ratio),
                cell.insert_method,
                cell.insert_method.name()
            );
            self.run_cell(cell)?;
        }

        Ok(cells.len())
    }

    pub fn run_cell(&mut self, cell: &GridCell) -> Result<()> {
        let paths = self.config.paths_for(cell);

        let benchmark = benchmark_command(self.config, cell, &paths);
        self.runner.run(&benchmark)?;

        if self.config.records_counters() {
            let report = report_command(self.config, &paths);
            self.runner.run(&report)?;
        }

        Ok(())
    }

    pub fn into_runner(self) -> R {
        self.runner
    }
}
