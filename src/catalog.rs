//! Two-line element catalog parsing.
//!
//! A catalog is plain text made of repeating three-line groups:
//!
//! ```text
//! ISS (ZARYA)
//! 1 25544U 98067A   20148.21301450  .00001715  00000-0  38778-4 0  9992
//! 2 25544  51.6435  92.2789 0002570 358.0648 144.9972 15.49396855228767
//! ```

use crate::error::{Error, Result};

/// Number of lines in one catalog record.
const LINES_PER_RECORD: usize = 3;

/// Column range (0-based, exclusive end) of the international designator on
/// line 1.
const DESIGNATOR_COLUMNS: std::ops::Range<usize> = 9..17;

/// Metadata of one catalog record.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SatelliteMetadata {
    name: String,
    international_designator: String,
    norad_id: String,
    raw_lines: [String; LINES_PER_RECORD],
}

impl SatelliteMetadata {
    /// Returns the trimmed object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the international designator (`YYNNNPPP`).
    pub fn international_designator(&self) -> &str {
        &self.international_designator
    }

    /// Returns the NORAD catalog number.
    pub fn norad_id(&self) -> &str {
        &self.norad_id
    }

    /// Returns the raw name line.
    pub fn line0(&self) -> &str {
        &self.raw_lines[0]
    }

    /// Returns the raw first element line.
    pub fn line1(&self) -> &str {
        &self.raw_lines[1]
    }

    /// Returns the raw second element line.
    pub fn line2(&self) -> &str {
        &self.raw_lines[2]
    }
}

/// Parses one record from its lines (name, line 1, line 2).
pub fn parse_group(lines: &[&str]) -> Result<SatelliteMetadata> {
    let [line0, line1, line2] = lines else {
        return Err(Error::MalformedCatalog(format!(
            "expected {LINES_PER_RECORD} lines per record, got {}",
            lines.len()
        )));
    };

    let international_designator = line1
        .chars()
        .skip(DESIGNATOR_COLUMNS.start)
        .take(DESIGNATOR_COLUMNS.len())
        .collect();
    let norad_id = line2
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::MalformedCatalog(format!("no catalog number in `{line2}`")))?
        .to_owned();

    Ok(SatelliteMetadata {
        name: line0.trim().to_owned(),
        international_designator,
        norad_id,
        raw_lines: [line0.to_string(), line1.to_string(), line2.to_string()],
    })
}

/// Parses a whole catalog, preserving record order.
///
/// Blank lines are skipped. A partial trailing record is dropped with a
/// warning instead of failing the whole catalog.
pub fn parse_catalog(text: &str) -> Vec<SatelliteMetadata> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut records = Vec::with_capacity(lines.len() / LINES_PER_RECORD);
    for group in lines.chunks(LINES_PER_RECORD) {
        match parse_group(group) {
            Ok(metadata) => records.push(metadata),
            Err(e) => log::warn!("dropping catalog record: {e}"),
        }
    }
    records
}
