use crate::error::{Result, SweepError};
use crate::sweep_config::{CounterLayout, SweepConfig};
use crate::text_extract::ReportLines;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Counter order inside a symbol block. Never reordered.
pub const COUNTER_NAMES: [&str; 7] = [
    "task_clock",
    "instructions",
    "cycles",
    "cache_references",
    "cache_misses",
    "branch_instructions",
    "branch_misses",
];

/// Distance from a marker (or from the previous counter line) to the next counter line.
pub const COUNTER_LINE_STRIDE: usize = 2;

/// Raw counter values attributed to the query-execution symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    pub task_clock: u64,
    pub instructions: u64,
    pub cycles: u64,
    pub cache_references: u64,
    pub cache_misses: u64,
    pub branch_instructions: u64,
    pub branch_misses: u64,
}

/// Ratios derived from a [`CounterSample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub instructions_per_cycle: f64,
    pub cache_miss_ratio: f64,
    pub cache_miss_percent: f64,
    pub branch_miss_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterMetrics {
    pub counters: CounterSample,
    pub derived: DerivedMetrics,
}

impl CounterSample {
    /// Builds a sample from values in [`COUNTER_NAMES`] order.
    pub fn from_slots(slots: [u64; 7]) -> Self {
        let [task_clock, instructions, cycles, cache_references, cache_misses, branch_instructions, branch_misses] =
            slots;
        CounterSample {
            task_clock,
            instructions,
            cycles,
            cache_references,
            cache_misses,
            branch_instructions,
            branch_misses,
        }
    }

    pub fn slots(&self) -> [u64; 7] {
        [
            self.task_clock,
            self.instructions,
            self.cycles,
            self.cache_references,
            self.cache_misses,
            self.branch_instructions,
            self.branch_misses,
        ]
    }

    /// Derives the ratios. `source` is the report the sample came from and
    /// only serves to name it in a zero-denominator error.
    pub fn derive(&self, source: &Path) -> Result<DerivedMetrics> {
        let instructions_per_cycle =
            ratio(source, "instructions_per_cycle", self.instructions, self.cycles, "cycles")?;
        let cache_miss_ratio = ratio(
            source,
            "cache_miss_ratio",
            self.cache_misses,
            self.cache_references,
            "cache_references",
        )?;
        let branch_miss_ratio = ratio(
            source,
            "branch_miss_ratio",
            self.branch_misses,
            self.branch_instructions,
            "branch_instructions",
        )?;

        Ok(DerivedMetrics {
            instructions_per_cycle,
            cache_miss_ratio,
            cache_miss_percent: cache_miss_ratio * 100.0,
            branch_miss_ratio,
        })
    }
}

fn ratio(
    source: &Path,
    metric: &'static str,
    numerator: u64,
    denominator: u64,
    denominator_name: &'static str,
) -> Result<f64> {
    if denominator == 0 {
        return Err(SweepError::ZeroDenominator {
            path: source.to_path_buf(),
            metric,
            denominator: denominator_name,
        });
    }
    Ok(numerator as f64 / denominator as f64)
}

/// Extracts counters for one executed symbol from rendered counter reports.
#[derive(Debug, Clone)]
pub struct ProfilerReportAnalyzer {
    symbol_marker: String,
    layout: CounterLayout,
}

impl ProfilerReportAnalyzer {
    pub fn new<S: Into<String>>(symbol_marker: S, layout: CounterLayout) -> Self {
        ProfilerReportAnalyzer {
            symbol_marker: symbol_marker.into(),
            layout,
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.symbol_marker.clone(), config.counter_layout)
    }

    /// Reads the report at `path`. Unlike the benchmark output, a missing
    /// report is an error.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<CounterMetrics> {
        let lines = ReportLines::read(path)?;
        let counters = self.parse(&lines)?;
        let derived = counters.derive(lines.path())?;
        Ok(CounterMetrics { counters, derived })
    }

    pub fn parse(&self, lines: &ReportLines) -> Result<CounterSample> {
        let mut slots = [0u64; 7];

        match self.layout {
            CounterLayout::Stacked => {
                let anchor = lines.require_first(&self.symbol_marker)?;
                for (i, slot) in slots.iter_mut().enumerate() {
                    *slot = lines.dash_delimited_at(anchor, (i + 1) * COUNTER_LINE_STRIDE)?;
                }
            }
            CounterLayout::PerEvent => {
                let anchors: Vec<usize> = lines
                    .all_containing(&self.symbol_marker)
                    .take(slots.len())
                    .collect();
                if anchors.is_empty() {
                    lines.require_first(&self.symbol_marker)?;
                }
                if anchors.len() < slots.len() {
                    return Err(SweepError::IncompleteCounters {
                        path: lines.path().to_path_buf(),
                        marker: self.symbol_marker.clone(),
                        found: anchors.len(),
                        expected: slots.len(),
                    });
                }
                for (slot, &anchor) in slots.iter_mut().zip(&anchors) {
                    *slot = lines.dash_delimited_at(anchor, COUNTER_LINE_STRIDE)?;
                }
            }
        }

        Ok(CounterSample::from_slots(slots))
    }
}
