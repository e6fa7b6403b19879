use ratatui::{
    prelude::*,
    widgets::{Block, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const GLOBAL_BINDINGS: &[(&str, &str)] = &[
    ("q, <C-c>", "Quit"),
    ("?", "Toggle this help"),
    ("<Esc>", "Close the selection"),
    ("p, <Space>", "Play / pause"),
    ("r", "Reset the clock to now"),
    ("y", "Copy the permalink"),
];

const MAP_BINDINGS: &[(&str, &str)] = &[
    ("<LeftMouse>", "Select the nearest object"),
    ("<RightMouse>", "Close the selection"),
    ("<ScrollWheelUp> / <ScrollWheelDown>", "Rewind / advance time"),
    ("<S-ScrollWheel>, [ / ]", "Move the map"),
    ("f", "Follow the selected object"),
];

const LIST_BINDINGS: &[(&str, &str)] = &[
    ("<LeftMouse>", "Switch group / select object"),
    ("<ScrollWheelUp> / <ScrollWheelDown>", "Scroll"),
];

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    ("Global", GLOBAL_BINDINGS),
    ("World map", MAP_BINDINGS),
    ("Lists", LIST_BINDINGS),
];

/// A popup listing the key bindings.
pub struct Keymap;

impl Widget for Keymap {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (key_width, desc_width) = SECTIONS
            .iter()
            .flat_map(|(_, bindings)| bindings.iter())
            .fold((0usize, 0usize), |(key_width, desc_width), (key, desc)| {
                (key_width.max(key.width()), desc_width.max(desc.width()))
            });

        let mut lines = Vec::new();
        for (i, (section_title, bindings)) in SECTIONS.iter().enumerate() {
            if i > 0 {
                lines.push(Line::raw(""));
            }
            lines.push(
                Line::styled(format!(" {section_title} "), Style::default().bold().reversed())
                    .centered(),
            );
            for (key, desc) in bindings.iter() {
                lines.push(Line::from(vec![
                    Span::styled(format!("{key:>key_width$}"), Style::default().fg(Color::Cyan)),
                    Span::raw(" "),
                    Span::raw(*desc),
                ]));
            }
        }

        const BORDER_WIDTH: u16 = 1;
        let popup_area = centered_rect(
            (key_width + 1 + desc_width) as u16 + BORDER_WIDTH * 2,
            lines.len() as u16 + BORDER_WIDTH * 2,
            area,
        );

        Clear.render(popup_area, buf);
        Paragraph::new(lines)
            .block(Block::bordered().title("Key bindings".blue()))
            .render(popup_area, buf);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
