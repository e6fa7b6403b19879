use anyhow::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use orbit_tracker::sink::Frame;
use ratatui::{
    prelude::*,
    widgets::{Block, List, ListItem, ListState, Scrollbar, ScrollbarState},
};

use crate::{
    app::App,
    config::{CatalogsConfig, GroupConfig},
    event::Event,
};

/// A widget to display the list of catalog groups.
pub struct SatelliteGroups<'a> {
    pub frame: &'a Frame,
}

/// State of a [`SatelliteGroups`] widget.
#[derive(Default)]
pub struct SatelliteGroupsState {
    entries: Vec<GroupConfig>,
    list_state: ListState,
    inner_area: Rect,
}

impl SatelliteGroupsState {
    pub fn with_config(config: &CatalogsConfig) -> Self {
        let mut entries = config.groups.clone();
        // The default group is always listed.
        if !entries.iter().any(|entry| entry.group == config.default_group) {
            entries.insert(
                0,
                GroupConfig {
                    label: config.default_group.clone(),
                    group: config.default_group.clone(),
                },
            );
        }
        Self {
            entries,
            ..Self::default()
        }
    }

    fn scroll_up(&mut self) {
        *self.list_state.offset_mut() = self.list_state.offset().saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        let max_offset = self
            .entries
            .len()
            .saturating_sub(self.inner_area.height as usize);
        *self.list_state.offset_mut() = (self.list_state.offset() + 1).min(max_offset);
    }
}

impl SatelliteGroups<'_> {
    fn render_block(&self, area: Rect, buf: &mut Buffer, state: &mut SatelliteGroupsState) {
        let block = Block::bordered().title("Catalog groups".blue());
        state.inner_area = block.inner(area);
        block.render(area, buf);
    }

    fn render_list(&self, buf: &mut Buffer, state: &mut SatelliteGroupsState) {
        let items = state.entries.iter().map(|entry| {
            let active = entry.group == self.frame.group;
            let style = if active {
                Style::default().fg(Color::White)
            } else {
                Style::default()
            };
            let icon = if active { "✓" } else { "☐" };
            ListItem::new(Text::styled(format!("{icon} {}", entry.label), style))
        });

        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        StatefulWidget::render(list, state.inner_area, buf, &mut state.list_state);
    }

    fn render_scrollbar(&self, area: Rect, buf: &mut Buffer, state: &mut SatelliteGroupsState) {
        let inner_area = area.inner(Margin::new(0, 1));
        let mut scrollbar_state = ScrollbarState::new(
            state
                .entries
                .len()
                .saturating_sub(inner_area.height as usize),
        )
        .position(state.list_state.offset());
        Scrollbar::default().render(inner_area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for SatelliteGroups<'_> {
    type State = SatelliteGroupsState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        self.render_block(area, buf, state);
        self.render_list(buf, state);
        self.render_scrollbar(area, buf, state);
    }
}

pub async fn handle_event(event: Event, app: &mut App) -> Result<()> {
    match event {
        Event::Mouse(event) => handle_mouse_events(event, app).await,
        _ => Ok(()),
    }
}

async fn handle_mouse_events(event: MouseEvent, app: &mut App) -> Result<()> {
    let inner_area = app.satellite_groups_state.inner_area;
    if !inner_area.contains(Position::new(event.column, event.row)) {
        app.satellite_groups_state.list_state.select(None);
        return Ok(());
    }

    // Convert window coordinates to area coordinates
    let mouse = Position::new(event.column - inner_area.x, event.row - inner_area.y);

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            // Switch to the clicked group.
            if let Some(entry) = app
                .satellite_groups_state
                .list_state
                .selected()
                .and_then(|index| app.satellite_groups_state.entries.get(index))
                .filter(|entry| entry.group != app.frame.group)
            {
                let group = entry.group.clone();
                // A missing catalog keeps the current group.
                if let Err(e) = app.load_group(&group, None).await {
                    log::error!("{e:#}");
                }
            }
        }
        MouseEventKind::ScrollUp => app.satellite_groups_state.scroll_up(),
        MouseEventKind::ScrollDown => app.satellite_groups_state.scroll_down(),
        _ => {}
    }

    // Highlight the hovered entry.
    let row = mouse.y as usize + app.satellite_groups_state.list_state.offset();
    let index = if row < app.satellite_groups_state.entries.len() {
        Some(row)
    } else {
        None
    };
    app.satellite_groups_state.list_state.select(index);

    Ok(())
}
