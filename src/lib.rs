//! Orbital state engine for tracking catalogs of Earth-orbiting objects.
//!
//! A catalog of two-line element sets is parsed into a [`store::RecordStore`],
//! propagated to the simulation time on every compute tick, and turned into
//! geodetic fixes and an orbit path for the selected object. The result of
//! each tick is published as an immutable [`sink::Frame`].

pub mod catalog;
pub mod error;
pub mod geodetic;
pub mod links;
pub mod orbit;
pub mod orchestrator;
pub mod propagator;
pub mod scheduler;
pub mod selection;
pub mod sink;
pub mod store;
pub mod time;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
