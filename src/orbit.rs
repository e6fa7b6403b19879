//! One-orbit path sampling.

use std::{
    f64::consts::TAU,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    geodetic::to_geodetic,
    propagator::{Propagator, PropagatorState},
    time::minutes_since,
};

/// Default number of samples per orbit.
pub const DEFAULT_POINTS_PER_ORBIT: usize = 144;

/// Shared generation counter used to abandon stale work.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Invalidates every token issued so far.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns a token bound to the current generation.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            generation: self.0.clone(),
            issued: self.0.load(Ordering::SeqCst),
        }
    }
}

/// Token that reports cancellation once its generation has been bumped.
#[derive(Clone, Debug)]
pub struct CancelToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.issued
    }
}

/// Positions sampled over one orbital period.
#[derive(Clone, PartialEq, Debug)]
pub struct OrbitPath {
    /// Time of the first sample.
    pub start: DateTime<Utc>,
    /// Minutes between consecutive samples.
    pub minutes_per_point: f64,
    /// Inertial positions in km.
    pub points: Vec<Vector3<f64>>,
}

impl OrbitPath {
    /// Returns the time of the sample at `index`.
    pub fn time_of(&self, index: usize) -> DateTime<Utc> {
        let micros = (index as f64 * self.minutes_per_point * 60e6).round() as i64;
        self.start + Duration::microseconds(micros)
    }

    /// Returns the ground track as `(longitude, latitude)` pairs in degrees.
    ///
    /// Samples whose geodetic conversion fails are skipped.
    pub fn ground_track(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| to_geodetic(point, &self.time_of(index)).ok())
            .map(|fix| (fix.longitude_deg, fix.latitude_deg))
            .collect()
    }
}

/// Samples one orbital period of `state`, starting at `now`.
///
/// Every sample propagates from the state returned by the previous one. The
/// path holds `points_per_orbit + 1` points, the last one a full period after
/// the first.
pub fn sample_orbit<P: Propagator>(
    propagator: &P,
    state: &P::State,
    now: DateTime<Utc>,
    points_per_orbit: usize,
    cancel: &CancelToken,
) -> Result<OrbitPath> {
    let points_per_orbit = points_per_orbit.max(1);
    let minutes_per_orbit = TAU / state.mean_motion();
    let minutes_per_point = minutes_per_orbit / points_per_orbit as f64;
    let start_minutes = minutes_since(state.epoch_jd(), &now);

    let mut points = Vec::with_capacity(points_per_orbit + 1);
    let mut state = state.clone();
    for step in 0..=points_per_orbit {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let minutes = start_minutes + step as f64 * minutes_per_point;
        let propagation = propagator.propagate(&state, minutes)?;
        state = propagation.state;
        points.push(propagation.position_km);
    }

    Ok(OrbitPath {
        start: now,
        minutes_per_point,
        points,
    })
}
