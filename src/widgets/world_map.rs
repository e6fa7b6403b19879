use anyhow::Result;
use chrono::{Duration, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use orbit_tracker::{
    geodetic::to_geodetic,
    scheduler::Command,
    sink::{Frame, IndexedPosition, PathPoint, Renderer},
};
use ratatui::{
    prelude::*,
    style::Styled,
    widgets::{
        Block,
        canvas::{Canvas, Context, Line, Map, MapResolution},
    },
};

use crate::{app::App, config::WorldMapConfig, event::Event};

/// A widget to display a world map with objects.
pub struct WorldMap<'a> {
    pub frame: &'a Frame,
}

/// An object placed on the map.
#[derive(Clone, Copy, Debug)]
struct MapObject {
    index: usize,
    lon: f64,
    lat: f64,
    stale: bool,
}

/// State of a [`WorldMap`] widget.
#[derive(Default)]
pub struct WorldMapState {
    objects: Vec<MapObject>,
    /// Ground track of the selected object as `(lon, lat)` pairs.
    ground_track: Vec<(f64, f64)>,
    selected_object_index: Option<usize>,
    hovered_object_index: Option<usize>,

    lon_offset: f64,

    /// Whether to follow the selected object by adjusting the map longitude.
    follow_object: bool,
    /// The amount of longitude (in degrees) to move the map when scrolling left
    /// or right.
    lon_delta: f64,
    /// The time step to advance or rewind when scrolling time.
    time_delta: Duration,

    map_color: Color,
    object_color: Color,
    stale_color: Color,
    trajectory_color: Color,

    inner_area: Rect,
}

impl WorldMapState {
    pub fn with_config(config: WorldMapConfig) -> Self {
        Self {
            follow_object: config.follow_object,
            lon_delta: config.lon_delta_deg,
            time_delta: Duration::minutes(config.time_delta_min),
            map_color: config.map_color,
            object_color: config.object_color,
            stale_color: config.stale_color,
            trajectory_color: config.trajectory_color,
            ..Self::default()
        }
    }

    fn scroll_map_left(&mut self) {
        self.lon_offset = wrap_longitude_deg(self.lon_offset - self.lon_delta);
    }

    fn scroll_map_right(&mut self) {
        self.lon_offset = wrap_longitude_deg(self.lon_offset + self.lon_delta);
    }

    fn object(&self, index: usize) -> Option<&MapObject> {
        self.objects.iter().find(|object| object.index == index)
    }

    /// Returns the index of the object nearest to the given coordinates.
    fn nearest_object_index(&self, lon: f64, lat: f64) -> Option<usize> {
        self.objects
            .iter()
            .min_by_key(|object| {
                let lon_diff = object.lon - lon;
                let lat_diff = object.lat - lat;
                ((lon_diff.powi(2) + lat_diff.powi(2)) * 1000.0) as i64
            })
            .map(|object| object.index)
    }
}

impl Renderer for WorldMapState {
    fn update_positions(&mut self, positions: &[IndexedPosition]) {
        self.objects = positions
            .iter()
            .filter_map(|position| {
                let fix = to_geodetic(&(position.position_m / 1000.0), &position.as_of).ok()?;
                Some(MapObject {
                    index: position.index,
                    lon: fix.longitude_deg,
                    lat: fix.latitude_deg,
                    stale: position.stale,
                })
            })
            .collect();
    }

    fn set_orbit_path(&mut self, path: &[PathPoint]) {
        self.ground_track = path
            .iter()
            .filter_map(|point| to_geodetic(&(point.position_m / 1000.0), &point.time).ok())
            .map(|fix| (fix.longitude_deg, fix.latitude_deg))
            .collect();
    }

    fn highlight_selected(&mut self, index: Option<usize>) {
        self.selected_object_index = index;
    }
}

impl WorldMap<'_> {
    const OBJECT_SYMBOL: &'static str = "+";

    fn name(&self, index: usize) -> &str {
        self.frame
            .objects
            .get(index)
            .map_or("UNK", |object| object.name.as_str())
    }

    fn render_block(&self, area: Rect, buf: &mut Buffer, state: &mut WorldMapState) {
        let clock = if self.frame.playing {
            "".white()
        } else {
            " (Paused)".yellow()
        };
        let mut block = Block::bordered()
            .title(format!("World map ({})", self.frame.group).blue())
            .title_bottom(
                ratatui::text::Line::from(vec![
                    self.frame
                        .time
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                        .white(),
                    clock,
                ]),
            );

        if state.follow_object {
            let style = if state.selected_object_index.is_none() {
                Style::default().dark_gray()
            } else {
                Style::default().green().slow_blink()
            };
            block = block.title_bottom(
                ratatui::text::Line::from("(Follow)".set_style(style)).right_aligned(),
            );
        }

        state.inner_area = block.inner(area);
        block.render(area, buf);
    }

    /// Renders the world map.
    fn render_map(&self, buf: &mut Buffer, state: &mut WorldMapState) {
        // Follow the longitude of the selected object
        if state.follow_object
            && let Some(selected) = state
                .selected_object_index
                .and_then(|index| state.object(index))
        {
            state.lon_offset = selected.lon;
        }

        let x_min = state.lon_offset - 180.0;
        let x_max = state.lon_offset + 180.0;

        // Adjust the rendering order to prevent the labels on the left map from
        // being covered by the right map
        let mut bounds_vec = Vec::new();
        if x_min < -180.0 {
            bounds_vec.push([x_min, x_max]); // Left side
            bounds_vec.push([x_max, x_max + 360.0]); // Right side
        } else if x_max > 180.0 {
            bounds_vec.push([-360.0 + x_min, x_min]); // Left side
            bounds_vec.push([x_min, x_max]); // Right side
        } else {
            bounds_vec.push([x_min, x_max]);
        }

        for bounds in &bounds_vec {
            self.render_bottom_layer(buf, *bounds, state);
        }
        for bounds in &bounds_vec {
            self.render_top_layer(buf, *bounds, state);
        }
    }

    /// Renders the bottom layer of the world map, including the map and all
    /// objects.
    fn render_bottom_layer(&self, buf: &mut Buffer, x_bounds: [f64; 2], state: &WorldMapState) {
        Canvas::default()
            .x_bounds(x_bounds)
            .y_bounds([-90.0, 90.0])
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: state.map_color,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                self.draw_objects(ctx, state);
            })
            .render(state.inner_area, buf);
    }

    /// Renders the top layer of the world map, including object highlights and
    /// the ground track.
    fn render_top_layer(&self, buf: &mut Buffer, x_bounds: [f64; 2], state: &WorldMapState) {
        Canvas::default()
            .x_bounds(x_bounds)
            .y_bounds([-90.0, 90.0])
            .paint(|ctx| {
                self.draw_object_highlight(ctx, state);
            })
            .render(state.inner_area, buf);
    }

    /// Draws all objects and their labels. Stale objects are dimmed.
    fn draw_objects(&self, ctx: &mut Context, state: &WorldMapState) {
        for object in &state.objects {
            let name = self.name(object.index);
            let text = if object.stale {
                Self::OBJECT_SYMBOL.fg(state.stale_color) + format!(" {name}").dark_gray()
            } else if state.selected_object_index.is_none() {
                Self::OBJECT_SYMBOL.fg(state.object_color) + format!(" {name}").white()
            } else {
                Self::OBJECT_SYMBOL.fg(state.object_color) + format!(" {name}").dark_gray()
            };
            ctx.print(object.lon, object.lat, text);
        }
    }

    /// Draws the highlight and ground track for the selected or hovered object.
    fn draw_object_highlight(&self, ctx: &mut Context, state: &WorldMapState) {
        if let Some(index) = state.selected_object_index {
            self.draw_lines(ctx, &state.ground_track, state.trajectory_color);

            if let Some(object) = state.object(index) {
                let text = Self::OBJECT_SYMBOL.light_green().slow_blink()
                    + format!(" {}", self.name(index)).white();
                ctx.print(object.lon, object.lat, text);
            }
        } else if let Some(object) = state
            .hovered_object_index
            .and_then(|index| state.object(index))
        {
            let text = Self::OBJECT_SYMBOL.fg(state.object_color).reversed()
                + " ".into()
                + self.name(object.index).to_string().white().reversed();
            ctx.print(object.lon, object.lat, text);
        }
    }

    /// Draws lines between points.
    fn draw_lines(&self, ctx: &mut Context, points: &[(f64, f64)], color: Color) {
        for window in points.windows(2) {
            self.draw_line(ctx, window[0], window[1], color);
        }
    }

    /// Draws a line between two points.
    fn draw_line(
        &self,
        ctx: &mut Context,
        (x1, y1): (f64, f64),
        (x2, y2): (f64, f64),
        color: Color,
    ) {
        // Handle a track crossing the antimeridian
        if (x1 - x2).abs() >= 180.0 {
            let x_edge = if x1 > 0.0 { 180.0 } else { -180.0 };
            let y_midpoint = (y1 + y2) / 2.0;
            ctx.draw(&Line::new(x1, y1, x_edge, y_midpoint, color));
            ctx.draw(&Line::new(-x_edge, y_midpoint, x2, y2, color));
            return;
        }
        ctx.draw(&Line::new(x1, y1, x2, y2, color));
    }
}

impl StatefulWidget for WorldMap<'_> {
    type State = WorldMapState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        self.render_block(area, buf, state);
        self.render_map(buf, state);
    }
}

pub async fn handle_event(event: Event, app: &mut App) -> Result<()> {
    match event {
        Event::Key(event) => handle_key_events(event, app),
        Event::Mouse(event) => handle_mouse_events(event, app),
        _ => Ok(()),
    }
}

fn handle_key_events(event: KeyEvent, app: &mut App) -> Result<()> {
    match event.code {
        KeyCode::Char('[') => app.world_map_state.scroll_map_left(),
        KeyCode::Char(']') => app.world_map_state.scroll_map_right(),
        KeyCode::Char('f') => {
            app.world_map_state.follow_object = !app.world_map_state.follow_object;
        }
        _ => {}
    }
    Ok(())
}

fn handle_mouse_events(event: MouseEvent, app: &mut App) -> Result<()> {
    let inner_area = app.world_map_state.inner_area;
    if !inner_area.contains(Position::new(event.column, event.row)) {
        app.world_map_state.hovered_object_index = None;
        return Ok(());
    }

    // Convert window coordinates to area coordinates
    let mouse = Position::new(event.column - inner_area.x, event.row - inner_area.y);

    let (lon, lat) = area_to_lon_lat(mouse.x, mouse.y, inner_area);
    let lon = wrap_longitude_deg(lon + app.world_map_state.lon_offset);

    let nearest_object_index = app.world_map_state.nearest_object_index(lon, lat);
    let time_delta = app.world_map_state.time_delta;
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = nearest_object_index {
                app.scheduler.send(Command::Pick(index));
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            app.scheduler.send(Command::Close);
        }
        MouseEventKind::ScrollUp => {
            if event.modifiers == KeyModifiers::SHIFT {
                app.world_map_state.scroll_map_left();
            } else {
                app.scheduler.send(Command::AdvanceTime(-time_delta));
            }
        }
        MouseEventKind::ScrollDown => {
            if event.modifiers == KeyModifiers::SHIFT {
                app.world_map_state.scroll_map_right();
            } else {
                app.scheduler.send(Command::AdvanceTime(time_delta));
            }
        }
        _ => {}
    }
    app.world_map_state.hovered_object_index = nearest_object_index;

    Ok(())
}

/// Converts area coordinates to lon/lat coordinates.
fn area_to_lon_lat(x: u16, y: u16, area: Rect) -> (f64, f64) {
    debug_assert!(x < area.width && y < area.height);

    let normalized_x = (x + 1) as f64 / area.width as f64;
    let normalized_y = (y + 1) as f64 / area.height as f64;
    let lon = -180.0 + normalized_x * 360.0;
    let lat = 90.0 - normalized_y * 180.0;
    (lon, lat)
}

/// Wraps a longitude into `[-180, 180)` degrees.
fn wrap_longitude_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
