//! Fixtures shared by unit tests.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    propagator::{Propagation, Propagator, PropagatorState},
};

pub const ISS_LINE1: &str =
    "1 25544U 98067A   20148.21301450  .00001715  00000-0  38778-4 0  9992";
pub const ISS_LINE2: &str =
    "2 25544  51.6435  92.2789 0002570 358.0648 144.9972 15.49396855228767";

/// Julian day of the epoch written into generated element lines (2024-01-01).
pub const EPOCH_JD: f64 = 2460310.5;

/// Earth gravitational parameter (km³/s²).
const MU: f64 = 398600.4418;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Returns the ISS record as catalog text.
pub fn iss_catalog() -> String {
    format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n")
}

/// Builds a pair of fixed-column element lines.
pub fn element_lines(norad_id: u32, inclination_deg: f64, revs_per_day: f64) -> (String, String) {
    let line1 = format!(
        "1 {norad_id:05}U 24{:03}A   24001.00000000  .00000000  00000-0  00000-0 0  999",
        norad_id % 1000
    );
    let line2 = format!(
        "2 {norad_id:05} {inclination_deg:8.4} {:8.4} {:07} {:8.4} {:8.4} {revs_per_day:11.8}{:05}",
        0.0, 1, 0.0, 0.0, 1
    );
    (with_checksum(&line1), with_checksum(&line2))
}

fn with_checksum(line: &str) -> String {
    let sum: u32 = line
        .chars()
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum();
    format!("{line}{}", sum % 10)
}

/// Builds catalog text with `count` objects named `SAT-<i>`.
pub fn catalog_text(count: u32) -> String {
    let mut text = String::new();
    for i in 0..count {
        let (line1, line2) = element_lines(10000 + i, 10.0 + i as f64, 14.0 + 0.1 * i as f64);
        text.push_str(&format!("SAT-{i}\n{line1}\n{line2}\n"));
    }
    text
}

/// Propagator producing exact circular orbits, failing on demand.
#[derive(Clone, Debug, Default)]
pub struct CircularPropagator {
    failing: HashSet<String>,
}

impl CircularPropagator {
    /// Makes every propagation of the given NORAD ID fail.
    pub fn failing_on(norad_ids: &[&str]) -> Self {
        Self {
            failing: norad_ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircularState {
    pub norad_id: String,
    pub mean_motion: f64,
    pub radius_km: f64,
    pub inclination: f64,
    pub minutes: f64,
}

impl PropagatorState for CircularState {
    fn epoch_jd(&self) -> f64 {
        EPOCH_JD
    }

    fn mean_motion(&self) -> f64 {
        self.mean_motion
    }
}

impl Propagator for CircularPropagator {
    type State = CircularState;

    fn initialize(&self, _line1: &str, line2: &str) -> Result<CircularState> {
        let invalid = || Error::InvalidElementSet(line2.to_owned());
        let mut tokens = line2.split_whitespace().skip(1);
        let norad_id = tokens.next().ok_or_else(invalid)?.to_owned();
        let inclination: f64 = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
        let revs_per_day: f64 = line2
            .get(52..63)
            .and_then(|t| t.trim().parse().ok())
            .ok_or_else(invalid)?;

        let mean_motion = revs_per_day * std::f64::consts::TAU / 1440.0;
        let n = mean_motion / 60.0;
        Ok(CircularState {
            norad_id,
            mean_motion,
            radius_km: (MU / (n * n)).cbrt(),
            inclination: inclination.to_radians(),
            minutes: 0.0,
        })
    }

    fn propagate(&self, state: &CircularState, minutes: f64) -> Result<Propagation<CircularState>> {
        if self.failing.contains(&state.norad_id) {
            return Err(Error::PropagationDivergence(state.norad_id.clone()));
        }

        let u = state.mean_motion * minutes;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_i, cos_i) = state.inclination.sin_cos();
        let r = state.radius_km;
        let v = r * state.mean_motion / 60.0;
        Ok(Propagation {
            state: CircularState {
                minutes,
                ..state.clone()
            },
            position_km: Vector3::new(r * cos_u, r * sin_u * cos_i, r * sin_u * sin_i),
            velocity_km_s: Vector3::new(-v * sin_u, v * cos_u * cos_i, v * cos_u * sin_i),
        })
    }
}

#[test]
fn generated_lines_have_fixed_width() {
    let (line1, line2) = element_lines(25544, 51.6, 15.5);
    assert_eq!(line1.len(), 69);
    assert_eq!(line2.len(), 69);
    assert_eq!(&line1[9..17], "24544A  ");
    assert_eq!(line2[52..63].trim(), "15.50000000");
}
