//! Line-oriented extraction over the text reports the benchmark and the
//! report tool produce.
//!
//! Both analyzers work the same way: find an anchor line by marker (first or
//! last occurrence), then read a value either from the anchor line itself or
//! from a line at a fixed offset below it. Every failed expectation comes back
//! as an error carrying the file path.

use crate::error::{Result, SweepError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// An integer enclosed by a pair of `--` separators, e.g. `---4000--cas::...`.
pub const DASH_DELIMITED_PATTERN: &str = r"--(\d+)--";

static DASH_DELIMITED: Lazy<Regex> =
    Lazy::new(|| Regex::new(DASH_DELIMITED_PATTERN).expect("dash-delimited pattern is valid"));

/// The lines of one report file.
#[derive(Debug, Clone)]
pub struct ReportLines {
    path: PathBuf,
    lines: Vec<String>,
}

impl ReportLines {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        Ok(Self::from_text(path, &content))
    }

    /// Like [`ReportLines::read`], but a missing file is `Ok(None)`.
    pub fn read_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(Self::from_text(path, &content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SweepError::io(path, e)),
        }
    }

    pub fn from_text<P: Into<PathBuf>>(path: P, text: &str) -> Self {
        ReportLines {
            path: path.into(),
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Index of the first line containing `marker`.
    pub fn first_containing(&self, marker: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(marker))
    }

    /// Index of the last line containing `marker` (scans from the end).
    pub fn last_containing(&self, marker: &str) -> Option<usize> {
        self.lines.iter().rposition(|line| line.contains(marker))
    }

    /// Indices of every line containing `marker`, in file order.
    pub fn all_containing<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.lines
            .iter()
            .enumerate()
            .filter(move |(_, line)| line.contains(marker))
            .map(|(i, _)| i)
    }

    pub fn require_first(&self, marker: &str) -> Result<usize> {
        self.first_containing(marker)
            .ok_or_else(|| self.marker_not_found(marker))
    }

    pub fn require_last(&self, marker: &str) -> Result<usize> {
        self.last_containing(marker)
            .ok_or_else(|| self.marker_not_found(marker))
    }

    /// Last whitespace-separated token after `marker` on the last line
    /// containing it, as written. Empty if nothing follows the marker.
    pub fn last_token_after(&self, marker: &str) -> Result<&str> {
        let index = self.require_last(marker)?;
        Ok(trailing_token(&self.lines[index], marker).unwrap_or(""))
    }

    /// [`ReportLines::last_token_after`], parsed as `T`.
    pub fn last_value_after<T: FromStr>(&self, marker: &str) -> Result<T> {
        let token = self.last_token_after(marker)?;
        self.parse_token(marker, token)
    }

    pub fn parse_token<T: FromStr>(&self, marker: &str, token: &str) -> Result<T> {
        token.parse::<T>().map_err(|_| SweepError::UnparsableToken {
            path: self.path.clone(),
            marker: marker.to_string(),
            token: token.to_string(),
        })
    }

    /// Reads the dash-delimited integer on the line `offset` lines below `anchor`.
    pub fn dash_delimited_at(&self, anchor: usize, offset: usize) -> Result<u64> {
        let index = anchor + offset;
        self.line(index)
            .and_then(dash_delimited_number)
            .ok_or_else(|| SweepError::OffsetPatternMissing {
                path: self.path.clone(),
                line: index + 1,
                pattern: DASH_DELIMITED_PATTERN.to_string(),
            })
    }

    fn marker_not_found(&self, marker: &str) -> SweepError {
        SweepError::MarkerNotFound {
            path: self.path.clone(),
            marker: marker.to_string(),
        }
    }
}

/// Last whitespace-separated token following the first occurrence of `marker` in `line`.
pub fn trailing_token<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    line[start..].split_whitespace().last()
}

/// First `--<digits>--` group on the line.
pub fn dash_delimited_number(line: &str) -> Option<u64> {
    DASH_DELIMITED
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
