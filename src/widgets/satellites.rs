use anyhow::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use orbit_tracker::{scheduler::Command, sink::Frame, store::Status};
use ratatui::{
    prelude::*,
    widgets::{Block, List, ListItem, ListState, Scrollbar, ScrollbarState},
};

use crate::{app::App, event::Event};

/// A widget listing the objects of the current group by name.
pub struct Satellites<'a> {
    pub frame: &'a Frame,
}

/// State of a [`Satellites`] widget.
#[derive(Default)]
pub struct SatellitesState {
    /// Catalog indices in display order.
    indices: Vec<usize>,
    list_state: ListState,
    inner_area: Rect,
}

impl SatellitesState {
    fn scroll_up(&mut self) {
        *self.list_state.offset_mut() = self.list_state.offset().saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        let max_offset = self
            .indices
            .len()
            .saturating_sub(self.inner_area.height as usize);
        *self.list_state.offset_mut() = (self.list_state.offset() + 1).min(max_offset);
    }
}

impl Satellites<'_> {
    fn render_block(&self, area: Rect, buf: &mut Buffer, state: &mut SatellitesState) {
        let block = Block::bordered()
            .title("Satellites".blue())
            .title(ratatui::text::Line::from(self.frame.listing.len().to_string().dark_gray()).right_aligned());
        state.inner_area = block.inner(area);
        block.render(area, buf);
    }

    fn render_list(&self, buf: &mut Buffer, state: &mut SatellitesState) {
        state.indices = self.frame.listing.iter().map(|(_, index)| *index).collect();

        let items = self.frame.listing.iter().map(|(name, index)| {
            let stale = self
                .frame
                .objects
                .get(*index)
                .is_some_and(|object| object.status == Status::Stale);
            let style = if self.frame.selected == Some(*index) {
                Style::default().fg(Color::LightGreen)
            } else if stale {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Text::styled(name.clone(), style))
        });

        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        StatefulWidget::render(list, state.inner_area, buf, &mut state.list_state);
    }

    fn render_scrollbar(&self, area: Rect, buf: &mut Buffer, state: &mut SatellitesState) {
        let inner_area = area.inner(Margin::new(0, 1));
        let mut scrollbar_state = ScrollbarState::new(
            state
                .indices
                .len()
                .saturating_sub(inner_area.height as usize),
        )
        .position(state.list_state.offset());
        Scrollbar::default().render(inner_area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for Satellites<'_> {
    type State = SatellitesState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        self.render_block(area, buf, state);
        self.render_list(buf, state);
        self.render_scrollbar(area, buf, state);
    }
}

pub async fn handle_event(event: Event, app: &mut App) -> Result<()> {
    match event {
        Event::Mouse(event) => handle_mouse_events(event, app),
        _ => Ok(()),
    }
}

fn handle_mouse_events(event: MouseEvent, app: &mut App) -> Result<()> {
    let state = &mut app.satellites_state;
    let inner_area = state.inner_area;
    if !inner_area.contains(Position::new(event.column, event.row)) {
        state.list_state.select(None);
        return Ok(());
    }

    // Convert window coordinates to area coordinates
    let mouse = Position::new(event.column - inner_area.x, event.row - inner_area.y);

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            // Select the clicked object.
            if let Some(&index) = state
                .list_state
                .selected()
                .and_then(|row| state.indices.get(row))
            {
                app.scheduler.send(Command::Pick(index));
            }
        }
        MouseEventKind::ScrollUp => state.scroll_up(),
        MouseEventKind::ScrollDown => state.scroll_down(),
        _ => {}
    }

    // Highlight the hovered entry.
    let row = mouse.y as usize + state.list_state.offset();
    let index = if row < state.indices.len() {
        Some(row)
    } else {
        None
    };
    state.list_state.select(index);

    Ok(())
}
