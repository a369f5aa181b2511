use crate::benchmark_utils::format_decimal;
use crate::error::{Result, SweepError};
use crate::formatted_report::{self, QueryPerformance};
use crate::profiler_report::{CounterMetrics, ProfilerReportAnalyzer};
use crate::sweep_config::{InsertMethod, SweepConfig};
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const DELIMITER: &str = ";";

pub const QUERY_TITLE: &str = "query performance";
pub const QUERY_HEADER: [&str; 4] = ["bulkload_percent", "method", "runtime_ms", "read_nodes"];

pub const COUNTER_TITLE: &str = "cache misses";
pub const COUNTER_HEADER: [&str; 13] = [
    "bulkload_percent",
    "method",
    "task_clock",
    "instructions",
    "cycles",
    "cache_references",
    "cache_misses",
    "branch_instructions",
    "branch_misses",
    "instructions_per_cycle",
    "cache_miss_ratio",
    "cache_miss_percent",
    "branch_miss_ratio",
];

#[derive(Debug, Clone, Serialize)]
pub struct QueryRow {
    pub bulkload_ratio: f64,
    pub insert_method: InsertMethod,
    pub performance: QueryPerformance,
}

impl QueryRow {
    pub fn fields(&self) -> Vec<String> {
        vec![
            format_decimal(self.bulkload_ratio),
            self.insert_method.to_string(),
            self.performance.runtime_text.clone(),
            self.performance.read_nodes.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterRow {
    pub bulkload_ratio: f64,
    pub insert_method: InsertMethod,
    pub metrics: CounterMetrics,
}

impl CounterRow {
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            format_decimal(self.bulkload_ratio),
            self.insert_method.to_string(),
        ];
        fields.extend(self.metrics.counters.slots().iter().map(u64::to_string));

        let derived = &self.metrics.derived;
        fields.push(format_decimal(derived.instructions_per_cycle));
        fields.push(format_decimal(derived.cache_miss_ratio));
        fields.push(format_decimal(derived.cache_miss_percent));
        fields.push(format_decimal(derived.branch_miss_ratio));
        fields
    }
}

/// Rows gathered while the summary was written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryReport {
    pub query_rows: Vec<QueryRow>,
    pub counter_rows: Vec<CounterRow>,
}

impl SummaryReport {
    /// Renders both tables with box drawing, for reading in a terminal.
    pub fn print_tables(&self) {
        let mut table = Table::new();
        table.add_row(header_row(&QUERY_HEADER));
        for row in &self.query_rows {
            table.add_row(body_row(row.fields()));
        }
        println!("\n{}", QUERY_TITLE);
        table.printstd();

        if self.counter_rows.is_empty() {
            return;
        }

        let mut table = Table::new();
        table.add_row(header_row(&COUNTER_HEADER));
        for row in &self.counter_rows {
            table.add_row(body_row(row.fields()));
        }
        println!("\n{}", COUNTER_TITLE);
        table.printstd();
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| SweepError::io(path, e))
    }
}

fn header_row(names: &[&str]) -> Row {
    Row::new(names.iter().map(|name| Cell::new(name)).collect())
}

fn body_row(fields: Vec<String>) -> Row {
    Row::new(fields.iter().map(|field| Cell::new(field)).collect())
}

/// Walks the grid method-major and writes the `;`-delimited tables.
pub struct SummaryReporter<'a> {
    config: &'a SweepConfig,
    profiler: ProfilerReportAnalyzer,
}

impl<'a> SummaryReporter<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        SummaryReporter {
            config,
            profiler: ProfilerReportAnalyzer::from_config(config),
        }
    }

    /// Writes the query table, then (for counter sweeps) the counter table.
    ///
    /// Rows are written as soon as they are analyzed, so a fatal counter
    /// report error leaves the query table and earlier counter rows in `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<SummaryReport> {
        let mut report = SummaryReport::default();
        let cells = self.config.reporting_order();

        writeln!(out, "{}", QUERY_TITLE).map_err(stdout_error)?;
        writeln!(out, "{}", QUERY_HEADER.join(DELIMITER)).map_err(stdout_error)?;
        for cell in &cells {
            let paths = self.config.paths_for(cell);
            let Some(performance) = formatted_report::analyze(&paths.raw_output)? else {
                log::warn!("no benchmark output at {}, skipping", paths.raw_output.display());
                continue;
            };
            let row = QueryRow {
                bulkload_ratio: cell.bulkload_ratio,
                insert_method: cell.insert_method,
                performance,
            };
            writeln!(out, "{}", row.fields().join(DELIMITER)).map_err(stdout_error)?;
            report.query_rows.push(row);
        }

        if !self.config.records_counters() {
            return Ok(report);
        }

        writeln!(out, "\n\n{}", COUNTER_TITLE).map_err(stdout_error)?;
        writeln!(out, "{}", COUNTER_HEADER.join(DELIMITER)).map_err(stdout_error)?;
        for cell in &cells {
            let paths = self.config.paths_for(cell);
            let metrics = self.profiler.analyze(&paths.counter_report)?;
            let row = CounterRow {
                bulkload_ratio: cell.bulkload_ratio,
                insert_method: cell.insert_method,
                metrics,
            };
            writeln!(out, "{}", row.fields().join(DELIMITER)).map_err(stdout_error)?;
            report.counter_rows.push(row);
        }

        Ok(report)
    }
}

fn stdout_error(err: std::io::Error) -> SweepError {
    SweepError::io("<summary output>", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler_report::CounterSample;
    use crate::sweep_config::{GridCell, SweepVariant, DEFAULT_SYMBOL_MARKER};
    use std::path::PathBuf;

    fn config(dir: &Path) -> SweepConfig {
        SweepConfig {
            output_dir: dir.to_path_buf(),
            bulkload_ratios: vec![0.6, 1.0],
            insert_methods: vec![InsertMethod::MainStrictSlow, InsertMethod::MainLazyFast],
            ..SweepConfig::default()
        }
    }

    fn counter_report(values: [u64; 7]) -> String {
        let mut report = format!("45.00%,45.00%,bench,bench,{}\n", DEFAULT_SYMBOL_MARKER);
        for value in values {
            report.push_str(&format!("            |\n            ---{}--main\n", value));
        }
        report
    }

    fn write_cell(config: &SweepConfig, cell: &GridCell, runtime: &str, nodes: u64) {
        let paths = config.paths_for(cell);
        fs::write(
            &paths.raw_output,
            format!("-runtime_ms: 1\nruntime_ms: {}\nread_nodes_: {}\n", runtime, nodes),
        )
        .unwrap();
        fs::write(&paths.counter_report, counter_report([1000, 4000, 2000, 500, 50, 800, 8])).unwrap();
    }

    fn write_grid(config: &SweepConfig) {
        for cell in config.execution_order() {
            let nodes = cell.percent() as u64 * 10 + cell.insert_method.code() as u64;
            write_cell(config, &cell, "12.5", nodes);
        }
    }

    #[test]
    fn tables_are_method_major() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_grid(&config);

        let mut out = Vec::new();
        let report = SummaryReporter::new(&config).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
query performance
bulkload_percent;method;runtime_ms;read_nodes
0.6;0;12.5;600
1.0;0;12.5;1000
0.6;1;12.5;601
1.0;1;12.5;1001


cache misses
bulkload_percent;method;task_clock;instructions;cycles;cache_references;cache_misses;branch_instructions;branch_misses;instructions_per_cycle;cache_miss_ratio;cache_miss_percent;branch_miss_ratio
0.6;0;1000;4000;2000;500;50;800;8;2.0;0.1;10.0;0.01
1.0;0;1000;4000;2000;500;50;800;8;2.0;0.1;10.0;0.01
0.6;1;1000;4000;2000;500;50;800;8;2.0;0.1;10.0;0.01
1.0;1;1000;4000;2000;500;50;800;8;2.0;0.1;10.0;0.01
";
        assert_eq!(text, expected);
        assert_eq!(report.query_rows.len(), 4);
        assert_eq!(report.counter_rows.len(), 4);
    }

    #[test]
    fn runtime_is_printed_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.variant = SweepVariant::PlainSweep;
        write_grid(&config);
        write_cell(&config, &GridCell::new(1.0, InsertMethod::MainLazyFast), "1.23457e+06", 7);

        let mut out = Vec::new();
        SummaryReporter::new(&config).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1.0;1;1.23457e+06;7\n"));
    }

    #[test]
    fn missing_benchmark_output_omits_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_grid(&config);
        fs::remove_file(config.paths_for(&GridCell::new(1.0, InsertMethod::MainStrictSlow)).raw_output)
            .unwrap();

        let mut out = Vec::new();
        let report = SummaryReporter::new(&config).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(report.query_rows.len(), 3);
        assert!(!text.contains("1.0;0;12.5"));
        assert!(text.contains("0.6;0;12.5;600"));
        // counter rows do not depend on the benchmark output
        assert_eq!(report.counter_rows.len(), 4);
    }

    #[test]
    fn missing_counter_report_aborts_after_the_query_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_grid(&config);
        let broken = config.paths_for(&GridCell::new(0.6, InsertMethod::MainLazyFast));
        fs::remove_file(&broken.counter_report).unwrap();

        let mut out = Vec::new();
        let err = SummaryReporter::new(&config).write_to(&mut out).unwrap_err();
        assert!(matches!(err, SweepError::Io { ref path, .. } if *path == broken.counter_report));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1.0;1;12.5;1001"));
        assert_eq!(text.lines().filter(|l| l.ends_with(";0.01")).count(), 2);
    }

    #[test]
    fn zero_cycles_error_names_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig {
            output_dir: dir.path().to_path_buf(),
            bulkload_ratios: vec![0.6, 0.7],
            insert_methods: vec![InsertMethod::MainStrictSlow],
            ..SweepConfig::default()
        };
        write_grid(&config);
        let broken = config.paths_for(&GridCell::new(0.7, InsertMethod::MainStrictSlow));
        fs::write(&broken.counter_report, counter_report([1000, 4000, 0, 500, 50, 800, 8])).unwrap();

        let mut out = Vec::new();
        let err = SummaryReporter::new(&config).write_to(&mut out).unwrap_err();
        assert!(matches!(err, SweepError::ZeroDenominator { denominator: "cycles", .. }));
        assert!(err.to_string().contains("perfreport_070_0.txt"));
    }

    #[test]
    fn plain_sweep_prints_only_query_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.variant = SweepVariant::PlainSweep;
        write_grid(&config);

        let mut out = Vec::new();
        let report = SummaryReporter::new(&config).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains(COUNTER_TITLE));
        assert!(report.counter_rows.is_empty());
    }

    #[test]
    fn json_summary_contains_rows() {
        let dir = tempfile::tempdir().unwrap();
        let report = SummaryReport {
            query_rows: vec![QueryRow {
                bulkload_ratio: 0.8,
                insert_method: InsertMethod::MainAuxLazyFast,
                performance: QueryPerformance {
                    runtime_ms: 3.25,
                    runtime_text: "3.25".to_string(),
                    read_nodes: 99,
                },
            }],
            counter_rows: vec![CounterRow {
                bulkload_ratio: 0.8,
                insert_method: InsertMethod::MainAuxLazyFast,
                metrics: CounterMetrics {
                    counters: CounterSample::from_slots([1, 2, 1, 4, 1, 8, 2]),
                    derived: CounterSample::from_slots([1, 2, 1, 4, 1, 8, 2])
                        .derive(Path::new("perfreport_080_2.txt"))
                        .unwrap(),
                },
            }],
        };

        let path: PathBuf = dir.path().join("summary.json");
        report.save_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["query_rows"][0]["insert_method"], 2);
        assert_eq!(value["query_rows"][0]["performance"]["read_nodes"], 99);
        assert_eq!(value["counter_rows"][0]["metrics"]["derived"]["instructions_per_cycle"], 2.0);
    }
}
