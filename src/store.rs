//! Satellite record store.
//!
//! All per-object data lives in one [`Catalog`] whose vectors share a single
//! index. A catalog switch builds a new catalog and swaps it in one
//! assignment, so no reader can observe metadata of one catalog next to
//! snapshots of another.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::{
    catalog::SatelliteMetadata,
    error::{Error, Result},
    propagator::PropagatorState,
};

/// Position and velocity of an object at a point in time.
#[derive(Clone, PartialEq, Debug)]
pub struct PositionSnapshot {
    /// Inertial position in km.
    pub position_km: Vector3<f64>,
    /// Inertial velocity in km/s.
    pub velocity_km_s: Vector3<f64>,
    pub as_of: DateTime<Utc>,
}

impl PositionSnapshot {
    /// Returns the speed in km/s.
    pub fn speed(&self) -> f64 {
        self.velocity_km_s.norm()
    }
}

/// Propagation status of an object.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, strum::Display)]
pub enum Status {
    /// Not propagated since the catalog was loaded.
    #[default]
    Pending,
    /// The snapshot was computed by the latest pass.
    Fresh,
    /// The latest pass failed; the snapshot is the last good one, if any.
    Stale,
}

/// Index-aligned per-object data of one catalog.
#[derive(Clone, Debug)]
pub struct Catalog<S> {
    metadata: Vec<SatelliteMetadata>,
    states: Vec<S>,
    snapshots: Vec<Option<PositionSnapshot>>,
    status: Vec<Status>,
}

impl<S> Default for Catalog<S> {
    fn default() -> Self {
        Self {
            metadata: Vec::new(),
            states: Vec::new(),
            snapshots: Vec::new(),
            status: Vec::new(),
        }
    }
}

/// Borrowed view of one record.
#[derive(Debug)]
pub struct Record<'a, S> {
    pub metadata: &'a SatelliteMetadata,
    pub state: &'a S,
    pub snapshot: Option<&'a PositionSnapshot>,
    pub status: Status,
}

/// Store of the records of the current catalog.
#[derive(Debug)]
pub struct RecordStore<S> {
    catalog: Catalog<S>,
    generation: u64,
}

impl<S> Default for RecordStore<S> {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            generation: 0,
        }
    }
}

impl<S: PropagatorState> RecordStore<S> {
    /// Replaces the whole catalog.
    ///
    /// Snapshots start empty. Any selection referring to the previous
    /// catalog must be cleared by the caller.
    pub fn replace_catalog(&mut self, metadata: Vec<SatelliteMetadata>, states: Vec<S>) -> Result<()> {
        if metadata.len() != states.len() {
            return Err(Error::CatalogLengthMismatch {
                metadata: metadata.len(),
                states: states.len(),
            });
        }

        let len = metadata.len();
        self.catalog = Catalog {
            metadata,
            states,
            snapshots: vec![None; len],
            status: vec![Status::Pending; len],
        };
        self.generation += 1;
        Ok(())
    }

    /// Returns the record at `index`.
    pub fn get(&self, index: usize) -> Result<Record<'_, S>> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(Record {
            metadata: &self.catalog.metadata[index],
            state: &self.catalog.states[index],
            snapshot: self.catalog.snapshots[index].as_ref(),
            status: self.catalog.status[index],
        })
    }

    /// Returns the number of objects in the catalog.
    pub fn len(&self) -> usize {
        self.catalog.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many times the catalog has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn metadata(&self) -> &[SatelliteMetadata] {
        &self.catalog.metadata
    }

    pub fn states(&self) -> &[S] {
        &self.catalog.states
    }

    pub fn snapshots(&self) -> &[Option<PositionSnapshot>] {
        &self.catalog.snapshots
    }

    pub fn status(&self) -> &[Status] {
        &self.catalog.status
    }

    /// Returns the index of the object with the given NORAD ID.
    ///
    /// When several objects share the ID the last one wins, as in
    /// [`sorted_by_name`](Self::sorted_by_name).
    pub fn find_by_norad_id(&self, norad_id: &str) -> Option<usize> {
        self.catalog
            .metadata
            .iter()
            .rposition(|metadata| metadata.norad_id() == norad_id)
    }

    /// Returns `(name, index)` pairs sorted by name.
    ///
    /// When several objects share a name only the last one is listed.
    pub fn sorted_by_name(&self) -> Vec<(String, usize)> {
        let by_name: std::collections::BTreeMap<&str, usize> = self
            .catalog
            .metadata
            .iter()
            .enumerate()
            .map(|(index, metadata)| (metadata.name(), index))
            .collect();
        by_name
            .into_iter()
            .map(|(name, index)| (name.to_owned(), index))
            .collect()
    }

    /// Stores the result of a successful propagation.
    pub(crate) fn update(&mut self, index: usize, state: S, snapshot: PositionSnapshot) {
        self.catalog.states[index] = state;
        self.catalog.snapshots[index] = Some(snapshot);
        self.catalog.status[index] = Status::Fresh;
    }

    /// Marks an object stale, keeping its last good snapshot.
    pub(crate) fn mark_stale(&mut self, index: usize) {
        self.catalog.status[index] = Status::Stale;
    }
}
