//! Render and UI sinks, and the frame published to them.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::{
    catalog::SatelliteMetadata,
    geodetic::GeodeticFix,
    links::{archive_url, mission_url},
    orbit::OrbitPath,
    store::{PositionSnapshot, Status},
};

/// Kilometers to miles.
pub const KM_TO_MILES: f64 = 0.621371;

const UNAVAILABLE: &str = "N/A";

/// Position of one catalog object, in meters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct IndexedPosition {
    pub index: usize,
    pub position_m: Vector3<f64>,
    pub as_of: DateTime<Utc>,
    pub stale: bool,
}

/// Sample of the orbit path, in meters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PathPoint {
    pub position_m: Vector3<f64>,
    pub time: DateTime<Utc>,
}

/// Receives object positions and the orbit path.
pub trait Renderer {
    fn update_positions(&mut self, positions: &[IndexedPosition]);

    /// Replaces the drawn orbit path. An empty slice removes the path.
    fn set_orbit_path(&mut self, path: &[PathPoint]);

    fn highlight_selected(&mut self, index: Option<usize>);
}

/// Receives the formatted state of the selection.
pub trait UiSink {
    fn show_details(&mut self, details: &SatelliteDetails);
    fn hide_details(&mut self);
    fn set_permalink(&mut self, permalink: &str);
    fn set_playing(&mut self, playing: bool);
}

/// Display strings describing the selected object.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SatelliteDetails {
    pub name: String,
    pub norad_id: String,
    pub international_designator: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude_km: String,
    pub altitude_mi: String,
    pub speed_km_s: String,
    pub speed_mi_s: String,
    pub mission_url: Option<String>,
    pub archive_url: Option<String>,
}

impl SatelliteDetails {
    /// Formats the details of an object.
    ///
    /// A missing fix or snapshot is shown as unavailable. Links are only
    /// derived for objects of mission groups.
    pub fn new(
        metadata: &SatelliteMetadata,
        fix: Option<&GeodeticFix>,
        snapshot: Option<&PositionSnapshot>,
        mission_group: bool,
    ) -> Self {
        let format = |value: Option<f64>, unit: &str| match value {
            Some(value) => format!("{value:.3} {unit}"),
            None => UNAVAILABLE.to_owned(),
        };
        let altitude = fix.map(|fix| fix.altitude_km);
        let speed = snapshot.map(PositionSnapshot::speed);

        Self {
            name: metadata.name().to_owned(),
            norad_id: metadata.norad_id().to_owned(),
            international_designator: metadata.international_designator().trim().to_owned(),
            latitude: format(fix.map(|fix| fix.latitude_deg), "°"),
            longitude: format(fix.map(|fix| fix.longitude_deg), "°"),
            altitude_km: format(altitude, "km"),
            altitude_mi: format(altitude.map(|km| km * KM_TO_MILES), "mi"),
            speed_km_s: format(speed, "km/s"),
            speed_mi_s: format(speed.map(|km| km * KM_TO_MILES), "mi/s"),
            mission_url: mission_group.then(|| mission_url(metadata)),
            archive_url: mission_group.then(|| archive_url(metadata)).flatten(),
        }
    }
}

/// Per-object entry of a [`Frame`].
#[derive(Clone, PartialEq, Debug)]
pub struct FrameObject {
    pub name: String,
    pub norad_id: String,
    pub status: Status,
    /// Inertial position in km.
    pub position_km: Option<Vector3<f64>>,
    /// Time of the position.
    pub as_of: Option<DateTime<Utc>>,
    /// `None` when no snapshot exists or the conversion did not converge.
    pub fix: Option<GeodeticFix>,
}

/// Immutable snapshot of the engine, published after every tick or command.
#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    pub group: String,
    /// Catalog replacement count, changes whenever the objects list does.
    pub catalog_generation: u64,
    pub time: DateTime<Utc>,
    pub playing: bool,
    pub objects: Vec<FrameObject>,
    /// `(name, index)` pairs sorted by name.
    pub listing: Vec<(String, usize)>,
    pub selected: Option<usize>,
    pub details: Option<SatelliteDetails>,
    pub orbit: Option<OrbitPath>,
    pub permalink: String,
}

impl Frame {
    /// Returns the selected object's fix.
    pub fn selected_fix(&self) -> Option<&GeodeticFix> {
        self.selected
            .and_then(|index| self.objects.get(index))
            .and_then(|object| object.fix.as_ref())
    }

    /// Hands the frame to a renderer and a UI sink.
    pub fn present(&self, renderer: &mut impl Renderer, ui: &mut impl UiSink) {
        let positions: Vec<_> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(index, object)| {
                let (position_km, as_of) = object.position_km.zip(object.as_of)?;
                Some(IndexedPosition {
                    index,
                    position_m: position_km * 1000.0,
                    as_of,
                    stale: object.status == Status::Stale,
                })
            })
            .collect();
        renderer.update_positions(&positions);

        let path: Vec<_> = self
            .orbit
            .iter()
            .flat_map(|orbit| {
                orbit.points.iter().enumerate().map(|(index, point)| PathPoint {
                    position_m: point * 1000.0,
                    time: orbit.time_of(index),
                })
            })
            .collect();
        renderer.set_orbit_path(&path);
        renderer.highlight_selected(self.selected);

        match &self.details {
            Some(details) => ui.show_details(details),
            None => ui.hide_details(),
        }
        ui.set_permalink(&self.permalink);
        ui.set_playing(self.playing);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{catalog::parse_catalog, test_support::{epoch, iss_catalog}};

    #[derive(Default)]
    struct Recorder {
        positions: Vec<IndexedPosition>,
        path: Vec<PathPoint>,
        highlighted: Option<usize>,
        details: Option<SatelliteDetails>,
        permalink: String,
        playing: bool,
    }

    impl Renderer for Recorder {
        fn update_positions(&mut self, positions: &[IndexedPosition]) {
            self.positions = positions.to_vec();
        }

        fn set_orbit_path(&mut self, path: &[PathPoint]) {
            self.path = path.to_vec();
        }

        fn highlight_selected(&mut self, index: Option<usize>) {
            self.highlighted = index;
        }
    }

    impl UiSink for Recorder {
        fn show_details(&mut self, details: &SatelliteDetails) {
            self.details = Some(details.clone());
        }

        fn hide_details(&mut self) {
            self.details = None;
        }

        fn set_permalink(&mut self, permalink: &str) {
            self.permalink = permalink.to_owned();
        }

        fn set_playing(&mut self, playing: bool) {
            self.playing = playing;
        }
    }

    fn iss() -> SatelliteMetadata {
        parse_catalog(&iss_catalog()).remove(0)
    }

    fn snapshot() -> PositionSnapshot {
        PositionSnapshot {
            position_km: Vector3::new(6778.0, 0.0, 0.0),
            velocity_km_s: Vector3::new(0.0, 3.0, 4.0),
            as_of: epoch(),
        }
    }

    #[test]
    fn formats_details() {
        let fix = GeodeticFix {
            latitude_deg: 51.6,
            longitude_deg: -0.12345,
            altitude_km: 420.0,
        };
        let details = SatelliteDetails::new(&iss(), Some(&fix), Some(&snapshot()), true);
        assert_eq!(details.name, "ISS (ZARYA)");
        assert_eq!(details.norad_id, "25544");
        assert_eq!(details.international_designator, "98067A");
        assert_eq!(details.latitude, "51.600 °");
        assert_eq!(details.longitude, "-0.123 °");
        assert_eq!(details.altitude_km, "420.000 km");
        assert_eq!(details.altitude_mi, "260.976 mi");
        assert_eq!(details.speed_km_s, "5.000 km/s");
        assert_eq!(details.speed_mi_s, "3.107 mi/s");
        assert_eq!(
            details.mission_url.as_deref(),
            Some("https://science.nasa.gov/missions/iss/")
        );
        assert!(details.archive_url.unwrap().ends_with("id=1998-067A"));
    }

    #[test]
    fn unavailable_fix_and_non_mission_group() {
        let details = SatelliteDetails::new(&iss(), None, None, false);
        assert_eq!(details.latitude, UNAVAILABLE);
        assert_eq!(details.altitude_mi, UNAVAILABLE);
        assert_eq!(details.speed_km_s, UNAVAILABLE);
        assert_eq!(details.mission_url, None);
        assert_eq!(details.archive_url, None);
    }

    #[test]
    fn presents_in_meters() {
        let metadata = iss();
        let object = |status, position_km: Option<Vector3<f64>>| FrameObject {
            name: metadata.name().to_owned(),
            norad_id: metadata.norad_id().to_owned(),
            status,
            position_km,
            as_of: position_km.map(|_| epoch()),
            fix: None,
        };
        let frame = Frame {
            group: "SMD".to_owned(),
            catalog_generation: 1,
            time: epoch(),
            playing: false,
            objects: vec![
                object(Status::Fresh, Some(Vector3::new(7000.0, 1.0, -2.0))),
                object(Status::Pending, None),
                object(Status::Stale, Some(Vector3::new(0.5, 0.0, 0.0))),
            ],
            listing: Vec::new(),
            selected: Some(0),
            details: Some(SatelliteDetails::new(&metadata, None, None, false)),
            orbit: Some(OrbitPath {
                start: epoch(),
                minutes_per_point: 1.0,
                points: vec![Vector3::new(1.0, 2.0, 3.0); 2],
            }),
            permalink: "group=SMD&satellite=25544".to_owned(),
        };

        let mut recorder = Recorder::default();
        frame.present(&mut recorder, &mut Recorder::default());
        assert_eq!(
            recorder.positions,
            vec![
                IndexedPosition {
                    index: 0,
                    position_m: Vector3::new(7_000_000.0, 1000.0, -2000.0),
                    as_of: epoch(),
                    stale: false,
                },
                IndexedPosition {
                    index: 2,
                    position_m: Vector3::new(500.0, 0.0, 0.0),
                    as_of: epoch(),
                    stale: true,
                },
            ]
        );
        assert_eq!(
            recorder.path,
            vec![
                PathPoint {
                    position_m: Vector3::new(1000.0, 2000.0, 3000.0),
                    time: epoch(),
                },
                PathPoint {
                    position_m: Vector3::new(1000.0, 2000.0, 3000.0),
                    time: epoch() + Duration::minutes(1),
                },
            ]
        );
        assert_eq!(recorder.highlighted, Some(0));
        assert_eq!(frame.selected_fix(), None);

        let mut ui = Recorder::default();
        frame.present(&mut Recorder::default(), &mut ui);
        assert_eq!(ui.details, frame.details);
        assert_eq!(ui.permalink, "group=SMD&satellite=25544");
        assert!(!ui.playing);

        let cleared = Frame {
            selected: None,
            details: None,
            orbit: None,
            playing: true,
            time: epoch() + Duration::seconds(1),
            ..frame
        };
        cleared.present(&mut recorder, &mut ui);
        assert!(recorder.path.is_empty());
        assert_eq!(recorder.highlighted, None);
        assert_eq!(ui.details, None);
        assert!(ui.playing);
    }
}
