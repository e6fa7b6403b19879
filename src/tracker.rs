use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    catalog::parse_catalog,
    error::{Error, Result},
    geodetic::{GeodeticFix, to_geodetic},
    orbit::{DEFAULT_POINTS_PER_ORBIT, Generation, OrbitPath, sample_orbit},
    orchestrator::{TickReport, propagate_all},
    propagator::Propagator,
    selection::{QueryParams, SelectionState, Transition},
    sink::{Frame, FrameObject, SatelliteDetails},
    store::RecordStore,
    time::SimulationClock,
};

/// Configuration of the tracking engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Interval between two propagation passes.
    pub compute_interval_ms: u64,
    /// Number of samples along the orbit path of the selected object.
    pub points_per_orbit: usize,
    /// Catalog groups whose objects get mission and archive links.
    pub mission_groups: Vec<String>,
}

impl TrackerConfig {
    pub fn compute_interval(&self) -> Duration {
        Duration::from_millis(self.compute_interval_ms.max(1))
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            compute_interval_ms: 1000,
            points_per_orbit: DEFAULT_POINTS_PER_ORBIT,
            mission_groups: vec!["SMD".to_owned()],
        }
    }
}

/// Orbital state engine.
///
/// Owns the record store and everything derived from the selection. All
/// methods take the current wall-clock time so the engine itself never reads
/// the system clock.
pub struct Tracker<P: Propagator> {
    propagator: P,
    config: TrackerConfig,
    store: RecordStore<P::State>,
    selection: SelectionState,
    clock: SimulationClock,
    /// Simulation time of the last propagation pass.
    last_tick: Option<DateTime<Utc>>,
    /// Fix of the selected object.
    fix: Option<GeodeticFix>,
    /// Orbit path of the selected object.
    orbit: Option<OrbitPath>,
    generation: Generation,
}

impl<P: Propagator> Tracker<P> {
    pub fn new(propagator: P, config: TrackerConfig, group: impl Into<String>) -> Self {
        Self {
            propagator,
            config,
            store: RecordStore::default(),
            selection: SelectionState::new(group),
            clock: SimulationClock::default(),
            last_tick: None,
            fix: None,
            orbit: None,
            generation: Generation::default(),
        }
    }

    pub fn store(&self) -> &RecordStore<P::State> {
        &self.store
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }


    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the generation counter cancelling orbit sampling.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Replaces the catalog with the objects parsed from `text`.
    ///
    /// Objects whose elements the propagator rejects are left out, so every
    /// remaining index refers to an object with a valid state. The selection
    /// is cleared.
    pub fn load_catalog(&mut self, group: impl Into<String>, text: &str) -> Result<Transition> {
        let group = group.into();
        let mut metadata = Vec::new();
        let mut states = Vec::new();
        for record in parse_catalog(text) {
            match self.propagator.initialize(record.line1(), record.line2()) {
                Ok(state) => {
                    metadata.push(record);
                    states.push(state);
                }
                Err(e) => log::warn!("skipping {} ({}): {e}", record.name(), record.norad_id()),
            }
        }

        self.generation.bump();
        self.store.replace_catalog(metadata, states)?;
        self.fix = None;
        self.orbit = None;
        log::info!("loaded {} objects into group {group}", self.store.len());
        Ok(self.selection.switch_group(group))
    }

    /// Restores the selection from permalink parameters.
    pub fn restore(&mut self, params: &QueryParams, wall: DateTime<Utc>) -> Transition {
        let transition = self.selection.restore(params, &self.store);
        self.apply(transition, wall);
        transition
    }

    /// Selects the object at `index`.
    pub fn pick(&mut self, index: usize, wall: DateTime<Utc>) -> Result<Transition> {
        let norad_id = self.store.get(index)?.metadata.norad_id().to_owned();
        let transition = self.selection.pick(index, norad_id);
        self.apply(transition, wall);
        Ok(transition)
    }

    /// Dismisses the selection and resumes play.
    pub fn close(&mut self, wall: DateTime<Utc>) -> Transition {
        let transition = self.selection.close();
        self.apply(transition, wall);
        self.clock.resume(wall);
        transition
    }

    pub fn play(&mut self, wall: DateTime<Utc>) {
        self.clock.resume(wall);
    }

    /// Stops compute ticks.
    ///
    /// The clock freezes at the time of the last pass, so the frozen frame
    /// and the clock agree.
    pub fn pause(&mut self, wall: DateTime<Utc>) {
        match self.last_tick {
            Some(last_tick) => self.clock.freeze_at(last_tick),
            None => self.clock.pause(wall),
        }
    }

    /// Shifts simulation time by `delta`.
    pub fn advance_time(&mut self, delta: chrono::Duration) {
        self.clock.advance_time(delta);
        if let Some(last_tick) = &mut self.last_tick {
            *last_tick += delta;
        }
    }

    /// Moves simulation time back to the wall clock.
    pub fn reset_clock(&mut self, wall: DateTime<Utc>) {
        self.clock.reset(wall);
        self.last_tick = None;
    }

    pub fn toggle_playing(&mut self, wall: DateTime<Utc>) {
        if self.is_playing() {
            self.pause(wall);
        } else {
            self.play(wall);
        }
    }

    /// Runs one compute tick.
    ///
    /// Returns `None` without touching any state while paused.
    pub fn compute_tick(&mut self, wall: DateTime<Utc>) -> Option<TickReport> {
        if !self.is_playing() {
            return None;
        }
        let now = self.clock.time(wall);
        let report = propagate_all(&self.propagator, &mut self.store, now);
        self.last_tick = Some(now);
        self.derive(now);
        Some(report)
    }

    fn apply(&mut self, transition: Transition, wall: DateTime<Utc>) {
        match transition {
            Transition::Selected(_) => self.derive(self.clock.time(wall)),
            Transition::Cleared => {
                self.fix = None;
                self.orbit = None;
            }
            Transition::Unchanged => {}
        }
    }

    /// Recomputes the fix and orbit path of the selected object.
    fn derive(&mut self, now: DateTime<Utc>) {
        let Some(index) = self.selection.selected_index() else {
            return;
        };
        let Ok(record) = self.store.get(index) else {
            return;
        };

        self.fix = record.snapshot.and_then(|snapshot| {
            to_geodetic(&snapshot.position_km, &snapshot.as_of)
                .inspect_err(|e| log::warn!("no fix for {}: {e}", record.metadata.name()))
                .ok()
        });

        let cancel = self.generation.token();
        self.orbit = match sample_orbit(
            &self.propagator,
            record.state,
            now,
            self.config.points_per_orbit,
            &cancel,
        ) {
            Ok(orbit) => Some(orbit),
            Err(Error::Cancelled) => {
                log::debug!("orbit sampling of {} cancelled", record.metadata.name());
                None
            }
            Err(e) => {
                log::warn!("no orbit path for {}: {e}", record.metadata.name());
                None
            }
        };
    }

    /// Builds an immutable view of the current state.
    pub fn frame(&self, wall: DateTime<Utc>) -> Frame {
        let objects = (0..self.store.len())
            .filter_map(|index| self.store.get(index).ok())
            .map(|record| FrameObject {
                name: record.metadata.name().to_owned(),
                norad_id: record.metadata.norad_id().to_owned(),
                status: record.status,
                position_km: record.snapshot.map(|snapshot| snapshot.position_km),
                as_of: record.snapshot.map(|snapshot| snapshot.as_of),
                fix: record
                    .snapshot
                    .and_then(|snapshot| to_geodetic(&snapshot.position_km, &snapshot.as_of).ok()),
            })
            .collect();

        let selected = self.selection.selected_index();
        let mission_group = self
            .config
            .mission_groups
            .iter()
            .any(|group| group == self.selection.group());
        let details = selected
            .and_then(|index| self.store.get(index).ok())
            .map(|record| {
                SatelliteDetails::new(record.metadata, self.fix.as_ref(), record.snapshot, mission_group)
            });

        Frame {
            group: self.selection.group().to_owned(),
            catalog_generation: self.store.generation(),
            time: self.clock.time(wall),
            playing: self.is_playing(),
            objects,
            listing: self.store.sorted_by_name(),
            selected,
            details,
            orbit: self.orbit.clone(),
            permalink: self.selection.permalink(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        propagator::Sgp4,
        store::Status,
        test_support::{CircularPropagator, catalog_text, epoch},
    };

    fn tracker(count: u32) -> Tracker<CircularPropagator> {
        let mut tracker = Tracker::new(CircularPropagator::default(), TrackerConfig::default(), "SMD");
        tracker.load_catalog("SMD", &catalog_text(count)).unwrap();
        tracker
    }

    #[test]
    fn skips_rejected_element_sets() {
        let mut text = catalog_text(3);
        text.push_str("BROKEN\n1 99999U\n2 99999\n");
        let mut tracker = Tracker::new(CircularPropagator::default(), TrackerConfig::default(), "SMD");
        tracker.load_catalog("SMD", &text).unwrap();
        assert_eq!(tracker.store().len(), 3);
        assert_eq!(tracker.store().find_by_norad_id("99999"), None);
    }

    #[test]
    fn pause_keeps_snapshots_and_resumes_from_last_time() {
        let mut tracker = tracker(4);
        let start = epoch();
        tracker.compute_tick(start).unwrap();
        let before = tracker.store().snapshots().to_vec();

        tracker.pause(start);
        for minutes in 1..=5 {
            assert_eq!(tracker.compute_tick(start + Duration::minutes(minutes)), None);
        }
        assert_eq!(tracker.store().snapshots(), before.as_slice());

        let wall = start + Duration::minutes(10);
        tracker.play(wall);
        tracker.compute_tick(wall + Duration::seconds(1)).unwrap();
        for snapshot in tracker.store().snapshots() {
            assert_eq!(snapshot.as_ref().unwrap().as_of, start + Duration::seconds(1));
        }
    }

    #[test]
    fn pause_freezes_at_last_pass() {
        let mut tracker = tracker(2);
        let start = epoch();
        tracker.compute_tick(start).unwrap();

        let wall = start + Duration::milliseconds(700);
        tracker.pause(wall);
        assert_eq!(tracker.clock().time(wall), start);
        assert_eq!(tracker.frame(wall).time, start);

        tracker.advance_time(Duration::minutes(5));
        assert_eq!(tracker.clock().time(wall), start + Duration::minutes(5));

        tracker.reset_clock(wall);
        assert_eq!(tracker.clock().time(wall), wall);
    }

    #[test]
    fn pick_derives_fix_and_orbit() {
        let mut tracker = tracker(5);
        tracker.compute_tick(epoch()).unwrap();
        assert_eq!(tracker.pick(2, epoch()).unwrap(), Transition::Selected(2));

        let frame = tracker.frame(epoch());
        assert_eq!(frame.selected, Some(2));
        assert_eq!(frame.permalink, "group=SMD&satellite=10002");
        assert_eq!(
            frame.orbit.as_ref().unwrap().points.len(),
            DEFAULT_POINTS_PER_ORBIT + 1
        );
        let details = frame.details.as_ref().unwrap();
        assert_eq!(details.name, "SAT-2");
        assert!(details.mission_url.is_some());
        assert!(frame.selected_fix().is_some());

        assert!(matches!(
            tracker.pick(5, epoch()),
            Err(Error::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn close_resumes_play() {
        let mut tracker = tracker(2);
        tracker.pick(1, epoch()).unwrap();
        tracker.pause(epoch());
        assert_eq!(tracker.close(epoch()), Transition::Cleared);
        assert!(tracker.is_playing());

        let frame = tracker.frame(epoch());
        assert_eq!(frame.selected, None);
        assert_eq!(frame.details, None);
        assert_eq!(frame.orbit, None);
        assert_eq!(frame.permalink, "group=SMD");
    }

    #[test]
    fn group_switch_clears_selection() {
        let mut tracker = tracker(3);
        tracker.pick(0, epoch()).unwrap();
        let generation = tracker.store().generation();

        let transition = tracker.load_catalog("weather", &catalog_text(2)).unwrap();
        assert_eq!(transition, Transition::Cleared);
        assert_eq!(tracker.store().generation(), generation + 1);

        let frame = tracker.frame(epoch());
        assert_eq!(frame.group, "weather");
        assert_eq!(frame.permalink, "group=weather");
        assert_eq!(frame.objects.len(), 2);
        assert!(frame.objects.iter().all(|o| o.status == Status::Pending));
    }

    #[test]
    fn restores_permalink_after_load() {
        let mut tracker = tracker(4);
        let params = QueryParams::decode("?group=SMD&satellite=10003");
        assert_eq!(tracker.restore(&params, epoch()), Transition::Selected(3));
        assert!(tracker.frame(epoch()).orbit.is_some());

        let params = QueryParams::decode("group=SMD&satellite=12345");
        tracker.restore(&params, epoch());
        assert_eq!(tracker.selection().selected_index(), None);
    }

    #[test]
    fn non_mission_group_has_no_links() {
        let mut tracker = Tracker::new(CircularPropagator::default(), TrackerConfig::default(), "weather");
        tracker.load_catalog("weather", &catalog_text(1)).unwrap();
        tracker.compute_tick(epoch());
        tracker.pick(0, epoch()).unwrap();
        let details = tracker.frame(epoch()).details.unwrap();
        assert_eq!(details.mission_url, None);
    }

    #[test]
    fn shipped_catalogs_propagate() {
        let catalogs = [
            include_str!("../catalogs/SMD.txt"),
            include_str!("../catalogs/stations.txt"),
            include_str!("../catalogs/weather.txt"),
        ];
        let wall = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 10, 16, 13, 0, 0).unwrap();
        for text in catalogs {
            let mut tracker = Tracker::new(Sgp4, TrackerConfig::default(), "SMD");
            tracker.load_catalog("SMD", text).unwrap();
            assert_eq!(tracker.store().len(), text.lines().count() / 3);

            let report = tracker.compute_tick(wall).unwrap();
            assert!(report.stale.is_empty(), "{report:?}");
            let frame = tracker.frame(wall);
            assert!(frame.objects.iter().all(|object| object.fix.is_some()));
        }
    }

    #[test]
    fn failing_selection_keeps_running() {
        let mut tracker = Tracker::new(
            CircularPropagator::failing_on(&["10001"]),
            TrackerConfig::default(),
            "SMD",
        );
        tracker.load_catalog("SMD", &catalog_text(3)).unwrap();
        tracker.pick(1, epoch()).unwrap();
        let report = tracker.compute_tick(epoch()).unwrap();
        assert_eq!(report.stale, vec![1]);

        let frame = tracker.frame(epoch());
        assert_eq!(frame.orbit, None);
        assert_eq!(frame.objects[1].status, Status::Stale);
        assert_eq!(frame.details.unwrap().latitude, "N/A");
    }
}
