use std::borrow::Cow;

use anyhow::Result;
use arboard::Clipboard;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use orbit_tracker::sink::{Frame, SatelliteDetails, UiSink};
use ratatui::{
    prelude::*,
    style::palette::tailwind,
    widgets::{
        Block, Cell, Paragraph, Row, Scrollbar, ScrollbarState, StatefulWidget, Table, TableState,
        Wrap,
    },
};
use reverse_geocoder::ReverseGeocoder;
use unicode_width::UnicodeWidthStr;

use crate::{app::App, event::Event};

/// A widget to display information about the selected object.
pub struct ObjectInformation<'a> {
    pub frame: &'a Frame,
}

/// State of a [`ObjectInformation`] widget.
pub struct ObjectInformationState {
    /// Details of the selected object, if any.
    details: Option<SatelliteDetails>,
    permalink: String,
    playing: bool,
    /// Key-value pairs representing the object information to display in the
    /// table.
    table_entries: Vec<(String, String)>,
    /// The current state of the table widget.
    table_state: TableState,
    /// Reverse geocoder instance used to convert coordinates to location names.
    geocoder: ReverseGeocoder,
    /// The inner rendering area of the widget.
    inner_area: Rect,
}

impl ObjectInformationState {
    fn scroll_up(&mut self) {
        *self.table_state.offset_mut() = self.table_state.offset().saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        let max_offset = self
            .table_entries
            .len()
            .saturating_sub(self.inner_area.height as usize);
        *self.table_state.offset_mut() = (self.table_state.offset() + 1).min(max_offset);
    }

    /// Returns the city and country closest to the given coordinates.
    fn location(&self, latitude: f64, longitude: f64) -> String {
        let result = self.geocoder.search((latitude, longitude));
        let country = isocountry::CountryCode::for_alpha2(&result.record.cc)
            .map_or(result.record.cc.as_str(), |code| code.name());
        format!("{}, {country}", result.record.name)
    }
}

impl Default for ObjectInformationState {
    fn default() -> Self {
        Self {
            details: None,
            permalink: String::new(),
            playing: true,
            table_entries: Default::default(),
            table_state: Default::default(),
            geocoder: ReverseGeocoder::new(),
            inner_area: Default::default(),
        }
    }
}

impl UiSink for ObjectInformationState {
    fn show_details(&mut self, details: &SatelliteDetails) {
        self.details = Some(details.clone());
    }

    fn hide_details(&mut self) {
        self.details = None;
        self.table_entries.clear();
    }

    fn set_permalink(&mut self, permalink: &str) {
        if self.permalink != permalink {
            self.permalink = permalink.to_owned();
        }
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl ObjectInformation<'_> {
    fn render_block(&self, area: Rect, buf: &mut Buffer, state: &mut ObjectInformationState) {
        let mut block = Block::bordered().title("Object information".blue());
        if !state.playing {
            block = block.title(ratatui::text::Line::from("Paused".yellow()).right_aligned());
        }
        state.inner_area = block.inner(area);
        block.render(area, buf);
    }

    fn render_table(&self, buf: &mut Buffer, state: &mut ObjectInformationState) {
        let max_key_width = state
            .table_entries
            .iter()
            .map(|(key, _)| key.width())
            .max()
            .unwrap_or_default();

        let widths = [Constraint::Max(max_key_width as u16), Constraint::Fill(1)];
        let [_left, right] = Layout::horizontal(widths)
            .areas(state.inner_area)
            .map(|rect| rect.width);
        let right = right.saturating_sub(1) as usize;

        let rows = state
            .table_entries
            .iter()
            .enumerate()
            .map(|(row_index, (key, value))| {
                let value = truncate(value, right);
                let row_color = if row_index % 2 == 0 {
                    tailwind::SLATE.c950
                } else {
                    tailwind::SLATE.c900
                };
                Row::new([
                    Cell::from(Text::from(key.as_str().bold())),
                    Cell::from(Text::from(value)),
                ])
                .style(Style::new().bg(row_color))
                .height(1)
            });

        let table = Table::new(rows, widths)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        StatefulWidget::render(table, state.inner_area, buf, &mut state.table_state);
    }

    fn render_scrollbar(&self, area: Rect, buf: &mut Buffer, state: &mut ObjectInformationState) {
        let inner_area = area.inner(Margin::new(0, 1));
        let mut scrollbar_state = ScrollbarState::new(
            state
                .table_entries
                .len()
                .saturating_sub(inner_area.height as usize),
        )
        .position(state.table_state.offset());
        Scrollbar::default().render(inner_area, buf, &mut scrollbar_state);
    }

    fn render_no_object_selected(&self, buf: &mut Buffer, state: &mut ObjectInformationState) {
        let text = Text::from(vec![
            "No object selected".dark_gray().into(),
            "".into(),
            state.permalink.clone().dark_gray().into(),
        ]);
        Paragraph::new(text)
            .centered()
            .wrap(Wrap { trim: true })
            .render(state.inner_area, buf);
    }

    fn update_table_entries(&self, state: &mut ObjectInformationState, details: &SatelliteDetails) {
        let location = match self.frame.selected_fix() {
            Some(fix) => state.location(fix.latitude_deg, fix.longitude_deg),
            None => "N/A".to_owned(),
        };

        let mut entries = vec![
            ("Name".into(), details.name.clone()),
            ("COSPAR ID".into(), details.international_designator.clone()),
            ("NORAD ID".into(), details.norad_id.clone()),
            ("Latitude".into(), details.latitude.clone()),
            ("Longitude".into(), details.longitude.clone()),
            ("Altitude".into(), details.altitude_km.clone()),
            (String::new(), details.altitude_mi.clone()),
            ("Speed".into(), details.speed_km_s.clone()),
            (String::new(), details.speed_mi_s.clone()),
            ("Location".into(), location),
        ];
        if let Some(url) = &details.mission_url {
            entries.push(("Mission".into(), url.clone()));
        }
        if let Some(url) = &details.archive_url {
            entries.push(("Archive".into(), url.clone()));
        }
        entries.push(("Permalink".into(), state.permalink.clone()));
        state.table_entries = entries;
    }
}

impl StatefulWidget for ObjectInformation<'_> {
    type State = ObjectInformationState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        self.render_block(area, buf, state);
        if let Some(details) = state.details.clone() {
            self.update_table_entries(state, &details);
            self.render_table(buf, state);
            self.render_scrollbar(area, buf, state);
        } else {
            self.render_no_object_selected(buf, state);
        }
    }
}

pub async fn handle_event(event: Event, app: &mut App) -> Result<()> {
    match event {
        Event::Key(event) => handle_key_event(event, app),
        Event::Mouse(event) => handle_mouse_event(event, app),
        _ => Ok(()),
    }
}

fn handle_key_event(event: KeyEvent, app: &mut App) -> Result<()> {
    if event.code == KeyCode::Char('y') {
        copy_to_clipboard(&app.object_information_state.permalink);
    }
    Ok(())
}

fn handle_mouse_event(event: MouseEvent, app: &mut App) -> Result<()> {
    let inner_area = app.object_information_state.inner_area;
    if !inner_area.contains(Position::new(event.column, event.row)) {
        *app.object_information_state.table_state.selected_mut() = None;
        return Ok(());
    }

    // Convert window coordinates to area coordinates
    let mouse = Position::new(event.column - inner_area.x, event.row - inner_area.y);

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            // Copy the clicked value to the clipboard.
            if let Some(index) = app.object_information_state.table_state.selected()
                && let Some((_, value)) = app.object_information_state.table_entries.get(index)
            {
                copy_to_clipboard(value);
            }
        }
        MouseEventKind::ScrollUp => app.object_information_state.scroll_up(),
        MouseEventKind::ScrollDown => app.object_information_state.scroll_down(),
        _ => {}
    }
    // Highlight the hovered row.
    let row = mouse.y as usize + app.object_information_state.table_state.offset();
    let index = if row < app.object_information_state.table_entries.len() {
        Some(row)
    } else {
        None
    };
    app.object_information_state.table_state.select(index);

    Ok(())
}

fn copy_to_clipboard(text: &str) {
    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => log::info!("copied `{text}` to the clipboard"),
        Err(e) => log::warn!("failed to copy to clipboard: {e}"),
    }
}

fn truncate(str: &str, max_width: usize) -> Cow<'_, str> {
    if str.width() > max_width {
        let ellipsis = "…";
        let end = str
            .char_indices()
            .map(|(i, _)| i)
            .nth(max_width.saturating_sub(ellipsis.width()))
            .unwrap_or(str.len());
        Cow::Owned(format!("{}{}", &str[..end], ellipsis))
    } else {
        Cow::Borrowed(str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate("group=SMD", 20), "group=SMD");
        assert_eq!(truncate("group=SMD&satellite=25544", 10), "group=SMD…");
        assert_eq!(truncate("abc", 0), "…");
    }
}
