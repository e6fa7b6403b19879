use chrono::{DateTime, Utc};

use crate::{
    propagator::{Propagator, PropagatorState},
    store::{PositionSnapshot, RecordStore},
    time::minutes_since,
};

/// Outcome of one propagation pass.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TickReport {
    /// Number of objects propagated successfully.
    pub propagated: usize,
    /// Indices of the objects whose propagation failed.
    pub stale: Vec<usize>,
}

/// Propagates every object of the store to `now`.
///
/// A failing object keeps its last good snapshot and is marked stale; the
/// pass always continues with the remaining objects.
pub fn propagate_all<P: Propagator>(
    propagator: &P,
    store: &mut RecordStore<P::State>,
    now: DateTime<Utc>,
) -> TickReport {
    let mut report = TickReport::default();

    for index in 0..store.len() {
        let state = &store.states()[index];
        let minutes = minutes_since(state.epoch_jd(), &now);
        match propagator.propagate(state, minutes) {
            Ok(propagation) => {
                let snapshot = PositionSnapshot {
                    position_km: propagation.position_km,
                    velocity_km_s: propagation.velocity_km_s,
                    as_of: now,
                };
                store.update(index, propagation.state, snapshot);
                report.propagated += 1;
            }
            Err(e) => {
                log::warn!(
                    "{} ({}) is stale: {e}",
                    store.metadata()[index].name(),
                    store.metadata()[index].norad_id()
                );
                store.mark_stale(index);
                report.stale.push(index);
            }
        }
    }

    log::trace!(
        "propagated {} objects, {} stale",
        report.propagated,
        report.stale.len()
    );
    report
}
