//! External mission and archive links derived from catalog metadata.

use crate::catalog::SatelliteMetadata;

const MISSION_URL: &str = "https://science.nasa.gov/missions/";
const ARCHIVE_URL: &str = "https://nssdc.gsfc.nasa.gov/nmc/spacecraftDisplay.do?id=";

/// Two-digit launch years below this belong to the 2000s.
const CENTURY_PIVOT: u32 = 57;

/// Converts an object name into a mission page slug.
///
/// * `TOPEX/POSEIDON` → `topex-poseidon`
/// * `HINODE (SOLAR-B)` → `hinode`
pub fn mission_slug(name: &str) -> String {
    let name = name.trim().to_lowercase();
    let name = name.split('(').next().unwrap_or_default().trim();

    let mut slug = String::with_capacity(name.len());
    for c in name.chars().map(|c| if c == '/' { '-' } else { c }) {
        let c = match c {
            c if c.is_whitespace() || c == '-' => '-',
            c if c.is_alphanumeric() || c == '_' => c,
            _ => continue,
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Returns the mission information page of the object.
pub fn mission_url(metadata: &SatelliteMetadata) -> String {
    format!("{MISSION_URL}{}/", mission_slug(metadata.name()))
}

/// Converts an international designator (`98067A`) into its archive record
/// identifier (`1998-067A`).
pub fn archive_id(international_designator: &str) -> Option<String> {
    let designator = international_designator.trim();
    let year: u32 = designator.get(..2)?.parse().ok()?;
    let rest = designator.get(2..)?;
    let century = if year < CENTURY_PIVOT { 20 } else { 19 };
    Some(format!("{century}{year:02}-{rest}"))
}

/// Returns the archive record page of the object.
pub fn archive_url(metadata: &SatelliteMetadata) -> Option<String> {
    archive_id(metadata.international_designator()).map(|id| format!("{ARCHIVE_URL}{id}"))
}
