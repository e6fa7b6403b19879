use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use orbit_tracker::{
    propagator::Sgp4,
    scheduler::{self, Command, SchedulerHandle},
    selection::QueryParams,
    sink::Frame,
    tracker::Tracker,
};
use ratatui::prelude::*;

use crate::{
    config::{CatalogsConfig, Config, check_group},
    event::{Event, EventHandler},
    tui::Tui,
    widgets::{
        keymap::Keymap,
        object_information::{self, ObjectInformation, ObjectInformationState},
        satellite_groups::{self, SatelliteGroups, SatelliteGroupsState},
        satellites::{self, Satellites, SatellitesState},
        world_map::{self, WorldMap, WorldMapState},
    },
};

/// Application.
pub struct App {
    /// Indicates if the application is currently active and running. When set
    /// to false, triggers application shutdown.
    pub running: bool,
    pub show_keymap: bool,

    /// Handle to the compute task.
    pub scheduler: SchedulerHandle,
    /// Latest frame published by the compute task.
    pub frame: Arc<Frame>,
    pub catalogs: CatalogsConfig,

    pub world_map_state: WorldMapState,
    pub object_information_state: ObjectInformationState,
    pub satellite_groups_state: SatelliteGroupsState,
    pub satellites_state: SatellitesState,

    /// Group and permalink to load on start.
    initial: Option<(String, Option<QueryParams>)>,
    tui: Tui,
}

impl App {
    /// Creates a new `App` with the given configuration.
    ///
    /// The group comes from `group`, then from the permalink, then from the
    /// configured default.
    pub fn with_config(config: Config, group: Option<String>, permalink: Option<String>) -> Result<Self> {
        let restore = permalink.as_deref().map(QueryParams::decode);
        let group = group
            .or_else(|| restore.as_ref().and_then(|params| params.group()).map(str::to_owned))
            .unwrap_or_else(|| config.catalogs.default_group.clone());
        check_group(&group)?;

        let scheduler = scheduler::spawn(Tracker::new(Sgp4, config.tracker, &group));
        let frame = scheduler.frame();

        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        let events = EventHandler::new(std::time::Duration::from_millis(
            config.world_map.render_interval_ms.max(1),
        ));
        let tui = Tui::new(terminal, events);
        Ok(Self {
            running: true,
            show_keymap: false,
            scheduler,
            frame,
            satellite_groups_state: SatelliteGroupsState::with_config(&config.catalogs),
            catalogs: config.catalogs,
            world_map_state: WorldMapState::with_config(config.world_map),
            object_information_state: Default::default(),
            satellites_state: Default::default(),
            initial: Some((group, restore)),
            tui,
        })
    }

    /// Runs the main loop of the application.
    pub async fn run(mut self) -> Result<()> {
        if let Some((group, restore)) = self.initial.take() {
            self.load_group(&group, restore).await?;
        }

        self.tui.init()?;

        // The main loop.
        let mut result = Ok(());
        while self.running {
            let event = match self.tui.events.next().await {
                Ok(event) => event,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            if let Err(e) = self.handle_event(event).await {
                result = Err(e);
                break;
            }
        }

        self.tui.deinit()?;
        self.scheduler.shutdown().await;
        result
    }

    /// Reads the catalog of `group` and hands it to the compute task.
    pub async fn load_group(&mut self, group: &str, restore: Option<QueryParams>) -> Result<()> {
        let path = self.catalogs.path_of(group);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        self.scheduler.send(Command::LoadCatalog {
            group: group.to_owned(),
            text,
            restore,
        });
        Ok(())
    }

    /// Set running to false to quit the application.
    fn request_exit(&mut self) {
        self.running = false;
    }

    /// Renders the terminal interface.
    fn render(&mut self) -> Result<()> {
        // Take whatever the compute task published last.
        self.frame = self.scheduler.frame();
        self.frame
            .present(&mut self.world_map_state, &mut self.object_information_state);

        let frame_data = self.frame.clone();
        self.tui.terminal.draw(|frame| {
            let horizontal = Layout::horizontal([Constraint::Percentage(75), Constraint::Min(30)]);
            let [left_area, right_area] = horizontal.areas(frame.area());
            let vertical = Layout::vertical([
                Constraint::Percentage(45),
                Constraint::Fill(1),
                Constraint::Length(8),
            ]);
            let [top_right_area, middle_right_area, bottom_right_area] = vertical.areas(right_area);

            frame.render_stateful_widget(
                WorldMap { frame: &frame_data },
                left_area,
                &mut self.world_map_state,
            );
            frame.render_stateful_widget(
                ObjectInformation { frame: &frame_data },
                top_right_area,
                &mut self.object_information_state,
            );
            frame.render_stateful_widget(
                Satellites { frame: &frame_data },
                middle_right_area,
                &mut self.satellites_state,
            );
            frame.render_stateful_widget(
                SatelliteGroups { frame: &frame_data },
                bottom_right_area,
                &mut self.satellite_groups_state,
            );

            if self.show_keymap {
                frame.render_widget(Keymap, frame.area());
            }
        })?;
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Render | Event::Resize => self.render()?,
            Event::Key(event) => self.handle_key_events(event),
            Event::Mouse(_) => {}
        }

        world_map::handle_event(event, self).await?;
        object_information::handle_event(event, self).await?;
        satellites::handle_event(event, self).await?;
        satellite_groups::handle_event(event, self).await
    }

    fn handle_key_events(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Char('q') => self.request_exit(),
            // Exit application on `Ctrl-C`.
            KeyCode::Char('c') => {
                if event.modifiers == KeyModifiers::CONTROL {
                    self.request_exit();
                }
            }
            KeyCode::Char('?') => self.show_keymap = !self.show_keymap,
            KeyCode::Esc => {
                if self.show_keymap {
                    self.show_keymap = false;
                } else {
                    self.scheduler.send(Command::Close);
                }
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.scheduler.send(Command::TogglePlaying);
            }
            KeyCode::Char('r') => {
                self.scheduler.send(Command::ResetClock);
            }
            _ => {}
        }
    }
}
