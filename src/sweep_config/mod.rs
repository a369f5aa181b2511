use crate::error::{Result, SweepError};
use crate::output_paths::{self, CellPaths};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BENCHMARK_EXECUTABLE: &str = "./release/benchmark_cache_misses";
pub const DEFAULT_REPORT_TOOL: &str = "perf";
pub const DEFAULT_SYMBOL_MARKER: &str = "[.] cas::Query<long>::Execute";
pub const DEFAULT_BULKLOAD_RATIOS: [f64; 5] = [0.6, 0.7, 0.8, 0.9, 1.0];

/// Insertion strategy under test, identified on the benchmark command line by its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InsertMethod {
    MainStrictSlow,
    MainLazyFast,
    MainAuxLazyFast,
    MainAuxStrictSlow,
}

impl InsertMethod {
    pub const ALL: [InsertMethod; 4] = [
        InsertMethod::MainStrictSlow,
        InsertMethod::MainLazyFast,
        InsertMethod::MainAuxLazyFast,
        InsertMethod::MainAuxStrictSlow,
    ];

    pub fn code(self) -> u8 {
        match self {
            InsertMethod::MainStrictSlow => 0,
            InsertMethod::MainLazyFast => 1,
            InsertMethod::MainAuxLazyFast => 2,
            InsertMethod::MainAuxStrictSlow => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or_else(|| {
                SweepError::invalid_config("insert_method", format!("unknown method code {}", code))
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            InsertMethod::MainStrictSlow => "main_ss",
            InsertMethod::MainLazyFast => "main_lf",
            InsertMethod::MainAuxLazyFast => "mainaux_lf",
            InsertMethod::MainAuxStrictSlow => "mainaux_ss",
        }
    }
}

impl TryFrom<u8> for InsertMethod {
    type Error = SweepError;

    fn try_from(code: u8) -> Result<Self> {
        InsertMethod::from_code(code)
    }
}

impl From<InsertMethod> for u8 {
    fn from(method: InsertMethod) -> u8 {
        method.code()
    }
}

impl fmt::Display for InsertMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One cell of the parameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub bulkload_ratio: f64,
    pub insert_method: InsertMethod,
}

impl GridCell {
    pub fn new(bulkload_ratio: f64, insert_method: InsertMethod) -> Self {
        GridCell { bulkload_ratio, insert_method }
    }

    pub fn percent(&self) -> u32 {
        ratio_percent(self.bulkload_ratio)
    }
}

/// Bulk-load ratio as a whole percentage, rounded to the nearest integer.
pub fn ratio_percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

/// Which benchmark binary contract the sweep drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepVariant {
    /// Benchmark records counter samples, report tool renders them.
    #[default]
    CounterSweep,
    /// Benchmark output only, no counter sampling.
    PlainSweep,
}

/// How the seven counters are laid out around the symbol marker in a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterLayout {
    /// One symbol block, counters every second line below the first marker.
    #[default]
    Stacked,
    /// One section per event, counter two lines below each of the first seven markers.
    PerEvent,
}

/// Immutable definition of a sweep. Built once by the driver and passed by
/// reference to the runner, the analyzers and the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub benchmark_executable: PathBuf,
    pub report_tool: String,
    pub bulkload_ratios: Vec<f64>,
    pub insert_methods: Vec<InsertMethod>,
    pub symbol_marker: String,
    pub variant: SweepVariant,
    pub counter_layout: CounterLayout,
    pub core_id: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            input_file: PathBuf::new(),
            output_dir: PathBuf::from("."),
            benchmark_executable: PathBuf::from(DEFAULT_BENCHMARK_EXECUTABLE),
            report_tool: DEFAULT_REPORT_TOOL.to_string(),
            bulkload_ratios: DEFAULT_BULKLOAD_RATIOS.to_vec(),
            insert_methods: InsertMethod::ALL.to_vec(),
            symbol_marker: DEFAULT_SYMBOL_MARKER.to_string(),
            variant: SweepVariant::default(),
            counter_layout: CounterLayout::default(),
            core_id: None,
        }
    }
}

impl SweepConfig {
    /// Loads a sweep definition from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        let config: SweepConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bulkload_ratios.is_empty() {
            return Err(SweepError::invalid_config("bulkload_ratios", "at least one ratio is required"));
        }
        if self.insert_methods.is_empty() {
            return Err(SweepError::invalid_config("insert_methods", "at least one method is required"));
        }

        let mut percents = HashSet::new();
        for &ratio in &self.bulkload_ratios {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(SweepError::invalid_config(
                    "bulkload_ratios",
                    format!("{} is outside (0, 1]", ratio),
                ));
            }
            // Distinct ratios must not collapse onto the same file name.
            if !percents.insert(ratio_percent(ratio)) {
                return Err(SweepError::invalid_config(
                    "bulkload_ratios",
                    format!("{} duplicates another ratio at whole-percent resolution", ratio),
                ));
            }
        }

        let mut methods = HashSet::new();
        for &method in &self.insert_methods {
            if !methods.insert(method) {
                return Err(SweepError::invalid_config(
                    "insert_methods",
                    format!("method {} listed twice", method),
                ));
            }
        }

        if self.symbol_marker.trim().is_empty() {
            return Err(SweepError::invalid_config("symbol_marker", "must not be empty"));
        }

        Ok(())
    }

    /// Cells in execution order: ratio-major, methods inner.
    pub fn execution_order(&self) -> Vec<GridCell> {
        self.bulkload_ratios
            .iter()
            .flat_map(|&ratio| {
                self.insert_methods
                    .iter()
                    .map(move |&method| GridCell::new(ratio, method))
            })
            .collect()
    }

    /// Cells in reporting order: method-major, ratios inner.
    pub fn reporting_order(&self) -> Vec<GridCell> {
        self.insert_methods
            .iter()
            .flat_map(|&method| {
                self.bulkload_ratios
                    .iter()
                    .map(move |&ratio| GridCell::new(ratio, method))
            })
            .collect()
    }

    pub fn paths_for(&self, cell: &GridCell) -> CellPaths {
        output_paths::resolve(&self.output_dir, cell)
    }

    pub fn records_counters(&self) -> bool {
        self.variant == SweepVariant::CounterSweep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_config() -> SweepConfig {
        SweepConfig {
            bulkload_ratios: vec![0.6, 1.0],
            insert_methods: vec![InsertMethod::MainStrictSlow, InsertMethod::MainAuxLazyFast],
            ..SweepConfig::default()
        }
    }

    #[test]
    fn method_codes_round_trip() {
        for method in InsertMethod::ALL {
            assert_eq!(InsertMethod::from_code(method.code()).unwrap(), method);
        }
        assert!(InsertMethod::from_code(4).is_err());
    }

    #[test]
    fn execution_order_is_ratio_major() {
        let cells: Vec<(u32, u8)> = small_config()
            .execution_order()
            .iter()
            .map(|c| (c.percent(), c.insert_method.code()))
            .collect();
        assert_eq!(cells, vec![(60, 0), (60, 2), (100, 0), (100, 2)]);
    }

    #[test]
    fn reporting_order_is_method_major() {
        let cells: Vec<(u32, u8)> = small_config()
            .reporting_order()
            .iter()
            .map(|c| (c.percent(), c.insert_method.code()))
            .collect();
        assert_eq!(cells, vec![(60, 0), (100, 0), (60, 2), (100, 2)]);
    }

    #[test]
    fn default_grid_covers_every_pair_once() {
        let config = SweepConfig::default();
        let cells = config.execution_order();
        assert_eq!(cells.len(), 20);

        let unique: HashSet<(u32, u8)> = cells
            .iter()
            .map(|c| (c.percent(), c.insert_method.code()))
            .collect();
        assert_eq!(unique.len(), 20);

        let reported: HashSet<(u32, u8)> = config
            .reporting_order()
            .iter()
            .map(|c| (c.percent(), c.insert_method.code()))
            .collect();
        assert_eq!(unique, reported);
    }

    #[test]
    fn validate_rejects_bad_grids() {
        let mut config = small_config();
        config.bulkload_ratios = vec![0.0];
        assert!(config.validate().is_err());

        config.bulkload_ratios = vec![1.5];
        assert!(config.validate().is_err());

        config.bulkload_ratios = vec![f64::NAN];
        assert!(config.validate().is_err());

        config.bulkload_ratios = vec![0.6, 0.601];
        assert!(config.validate().is_err());

        config.bulkload_ratios = vec![0.6];
        config.insert_methods = vec![InsertMethod::MainLazyFast, InsertMethod::MainLazyFast];
        assert!(config.validate().is_err());

        config.insert_methods = vec![];
        assert!(config.validate().is_err());

        assert!(small_config().validate().is_ok());
    }

    #[test]
    fn load_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"output_dir": "/tmp/sweep", "bulkload_ratios": [0.5, 1.0], "insert_methods": [1, 3], "variant": "plain_sweep"}}"#
        )
        .unwrap();

        let config = SweepConfig::load(file.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/sweep"));
        assert_eq!(config.bulkload_ratios, vec![0.5, 1.0]);
        assert_eq!(
            config.insert_methods,
            vec![InsertMethod::MainLazyFast, InsertMethod::MainAuxStrictSlow]
        );
        assert_eq!(config.variant, SweepVariant::PlainSweep);
        assert_eq!(config.report_tool, DEFAULT_REPORT_TOOL);
        assert_eq!(config.symbol_marker, DEFAULT_SYMBOL_MARKER);
    }

    #[test]
    fn load_rejects_unknown_method_code() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"insert_methods": [7]}}"#).unwrap();
        assert!(matches!(
            SweepConfig::load(file.path()),
            Err(SweepError::Serialization(_))
        ));
    }
}
