//! Propagator contract and its SGP4 implementation.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    time::{MINUTES_PER_DAY, julian_date},
};

/// State produced by a [`Propagator`].
///
/// States are values: propagation returns a new state and never mutates the
/// one it was given.
pub trait PropagatorState: Clone + Send + Sync + 'static {
    /// Returns the element set epoch as a fractional Julian day.
    fn epoch_jd(&self) -> f64;

    /// Returns the mean motion in radians per minute.
    fn mean_motion(&self) -> f64;
}

/// Result of one propagation step.
#[derive(Clone, Debug)]
pub struct Propagation<S> {
    pub state: S,
    /// Inertial position in km.
    pub position_km: Vector3<f64>,
    /// Inertial velocity in km/s.
    pub velocity_km_s: Vector3<f64>,
}

/// An orbit propagator.
pub trait Propagator: Send + Sync + 'static {
    type State: PropagatorState;

    /// Initializes a state from the two element lines.
    fn initialize(&self, line1: &str, line2: &str) -> Result<Self::State>;

    /// Propagates `state` to `minutes_since_epoch`.
    fn propagate(
        &self,
        state: &Self::State,
        minutes_since_epoch: f64,
    ) -> Result<Propagation<Self::State>>;
}

/// SGP4 propagator backed by the `sgp4` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sgp4;

/// SGP4 state of one object.
#[derive(Clone, Debug)]
pub struct Sgp4State {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    epoch_jd: f64,
    mean_motion: f64,
    minutes_since_epoch: f64,
}

impl Sgp4State {
    /// Returns the SGP4 elements of the object.
    pub fn elements(&self) -> &sgp4::Elements {
        &self.elements
    }

    /// Returns the UTC timestamp of the elements.
    pub fn epoch(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.elements.datetime, Utc)
    }

    /// Returns the time this state was last propagated to.
    pub fn minutes_since_epoch(&self) -> f64 {
        self.minutes_since_epoch
    }
}

impl PropagatorState for Sgp4State {
    fn epoch_jd(&self) -> f64 {
        self.epoch_jd
    }

    fn mean_motion(&self) -> f64 {
        self.mean_motion
    }
}

impl Propagator for Sgp4 {
    type State = Sgp4State;

    fn initialize(&self, line1: &str, line2: &str) -> Result<Sgp4State> {
        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| Error::InvalidElementSet(e.to_string()))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| Error::InvalidElementSet(e.to_string()))?;
        if elements.mean_motion <= 0.0 {
            return Err(Error::InvalidElementSet(format!(
                "non-positive mean motion {}",
                elements.mean_motion
            )));
        }

        let epoch = DateTime::from_naive_utc_and_offset(elements.datetime, Utc);
        Ok(Sgp4State {
            epoch_jd: julian_date(&epoch),
            // Revolutions per day to radians per minute
            mean_motion: elements.mean_motion * TAU / MINUTES_PER_DAY,
            minutes_since_epoch: 0.0,
            constants,
            elements,
        })
    }

    fn propagate(&self, state: &Sgp4State, minutes_since_epoch: f64) -> Result<Propagation<Sgp4State>> {
        let prediction = state
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))
            .map_err(|e| Error::PropagationDivergence(e.to_string()))?;

        let position_km = Vector3::from(prediction.position);
        let velocity_km_s = Vector3::from(prediction.velocity);
        if !position_km.iter().chain(velocity_km_s.iter()).all(|v| v.is_finite()) {
            return Err(Error::PropagationDivergence(format!(
                "non-finite state at {minutes_since_epoch} min"
            )));
        }

        Ok(Propagation {
            state: Sgp4State {
                minutes_since_epoch,
                ..state.clone()
            },
            position_km,
            velocity_km_s,
        })
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::test_support::{ISS_LINE1, ISS_LINE2};

    #[test]
    fn initializes_from_tle() {
        let state = Sgp4.initialize(ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(state.elements().norad_id, 25544);
        // 15.49396855 rev/day
        assert_approx_eq!(f64, state.mean_motion(), 0.0676052, epsilon = 1e-6);
        assert_approx_eq!(f64, state.epoch_jd(), 2458996.71301450, epsilon = 1e-6);
    }

    #[test]
    fn rejects_malformed_lines() {
        let result = Sgp4.initialize("1 25544U", "2 25544");
        assert!(matches!(result, Err(Error::InvalidElementSet(_))));
    }

    #[test]
    fn propagation_returns_new_state() {
        let state = Sgp4.initialize(ISS_LINE1, ISS_LINE2).unwrap();
        let first = Sgp4.propagate(&state, 0.0).unwrap();
        let second = Sgp4.propagate(&first.state, 60.0).unwrap();

        assert_eq!(state.minutes_since_epoch(), 0.0);
        assert_eq!(second.state.minutes_since_epoch(), 60.0);
        assert_ne!(first.position_km, second.position_km);

        // Low Earth orbit radius and speed
        let radius = first.position_km.norm();
        assert!((6600.0..6900.0).contains(&radius), "radius {radius}");
        let speed = first.velocity_km_s.norm();
        assert!((7.4..7.9).contains(&speed), "speed {speed}");
    }
}
