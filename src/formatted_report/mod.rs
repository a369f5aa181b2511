use crate::error::Result;
use crate::text_extract::ReportLines;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const RUNTIME_MARKER: &str = "runtime_ms:";
pub const READ_NODES_MARKER: &str = "read_nodes_:";

/// Query metrics from the final summary lines of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPerformance {
    pub runtime_ms: f64,
    /// Runtime token exactly as the benchmark printed it.
    pub runtime_text: String,
    pub read_nodes: u64,
}

/// Reads the benchmark output at `path`.
///
/// A missing file yields `Ok(None)`: that cell was never run. An existing
/// file without both markers is an error.
pub fn analyze<P: AsRef<Path>>(path: P) -> Result<Option<QueryPerformance>> {
    match ReportLines::read_if_exists(path)? {
        Some(lines) => parse(&lines).map(Some),
        None => Ok(None),
    }
}

/// The benchmark logs progress lines before its summary, so the last
/// occurrence of each marker wins.
pub fn parse(lines: &ReportLines) -> Result<QueryPerformance> {
    let runtime_text = lines.last_token_after(RUNTIME_MARKER)?;
    let runtime_ms = lines.parse_token::<f64>(RUNTIME_MARKER, runtime_text)?;
    let read_nodes = lines.last_value_after::<u64>(READ_NODES_MARKER)?;

    Ok(QueryPerformance {
        runtime_ms,
        runtime_text: runtime_text.to_string(),
        read_nodes,
    })
}
