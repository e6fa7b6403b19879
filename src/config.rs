use std::path::PathBuf;

use anyhow::{Result, ensure};
use orbit_tracker::{selection::is_valid_group, tracker::TrackerConfig};
use ratatui::style::Color;
use serde::Deserialize;

/// Configuration for the application.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub catalogs: CatalogsConfig,
    pub world_map: WorldMapConfig,
}

/// Configuration for the world map widget.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldMapConfig {
    pub render_interval_ms: u64,
    pub follow_object: bool,

    pub lon_delta_deg: f64,
    pub time_delta_min: i64,

    pub map_color: Color,
    pub object_color: Color,
    pub stale_color: Color,
    pub trajectory_color: Color,
}

impl Default for WorldMapConfig {
    fn default() -> Self {
        Self {
            render_interval_ms: 50,
            follow_object: false,
            lon_delta_deg: 10.0,
            time_delta_min: 1,
            map_color: Color::Gray,
            object_color: Color::LightRed,
            stale_color: Color::DarkGray,
            trajectory_color: Color::LightBlue,
        }
    }
}

/// Configuration for the catalog groups widget.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogsConfig {
    /// Directory holding one `<group>.txt` catalog per group.
    pub directory: PathBuf,
    pub default_group: String,
    pub groups: Vec<GroupConfig>,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub label: String,
    pub group: String,
}

impl GroupConfig {
    fn new(label: &str, group: &str) -> Self {
        Self {
            label: label.into(),
            group: group.into(),
        }
    }
}

impl Config {
    /// Rejects settings that deserialize but cannot be used.
    pub fn validate(&self) -> Result<()> {
        check_group(&self.catalogs.default_group)?;
        for entry in &self.catalogs.groups {
            check_group(&entry.group)?;
        }
        Ok(())
    }
}

/// Fails unless `group` is usable as a catalog group ID.
pub fn check_group(group: &str) -> Result<()> {
    ensure!(
        is_valid_group(group),
        "invalid group `{group}`: use ASCII letters, digits, `-` and `_`"
    );
    Ok(())
}

impl CatalogsConfig {
    /// Returns the path of the catalog file of `group`.
    pub fn path_of(&self, group: &str) -> PathBuf {
        self.directory.join(format!("{group}.txt"))
    }
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            directory: "catalogs".into(),
            default_group: "SMD".into(),
            groups: vec![
                GroupConfig::new("Science missions", "SMD"),
                GroupConfig::new("Space stations", "stations"),
                GroupConfig::new("Weather", "weather"),
            ],
        }
    }
}
