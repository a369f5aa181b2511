use crate::sweep_config::GridCell;
use std::path::{Path, PathBuf};

/// Files belonging to one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellPaths {
    /// Combined stdout/stderr of the benchmark.
    pub raw_output: PathBuf,
    /// Raw counter samples written by the benchmark.
    pub counter_data: PathBuf,
    /// Counter report rendered from `counter_data`.
    pub counter_report: PathBuf,
}

/// Three-digit, zero-padded whole percentage of the bulk-load ratio (`0.6` -> `060`).
pub fn percent_label(cell: &GridCell) -> String {
    format!("{:03}", cell.percent())
}

/// Maps a cell to its files under `output_dir`. Pure; touches no file.
pub fn resolve<P: AsRef<Path>>(output_dir: P, cell: &GridCell) -> CellPaths {
    let dir = output_dir.as_ref();
    let percent = percent_label(cell);
    let method = cell.insert_method.code();

    CellPaths {
        raw_output: dir.join(format!("bulk{}_{}.out.txt", percent, method)),
        counter_data: dir.join(format!("perf_{}_{}.data", percent, method)),
        counter_report: dir.join(format!("perfreport_{}_{}.txt", percent, method)),
    }
}
