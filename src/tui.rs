use std::{
    io::{self, Stdout},
    panic,
};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::event::EventHandler;

/// Terminal user interface.
pub struct Tui {
    pub terminal: Terminal<CrosstermBackend<Stdout>>,
    pub events: EventHandler,
}

impl Tui {
    pub fn new(terminal: Terminal<CrosstermBackend<Stdout>>, events: EventHandler) -> Self {
        Self { terminal, events }
    }

    /// Enters raw mode and the alternate screen.
    pub fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;

        // Restore the terminal before printing a panic message.
        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic| {
            let _ = reset();
            panic_hook(panic);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Restores the terminal.
    pub fn deinit(&mut self) -> Result<()> {
        reset()?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn reset() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}
