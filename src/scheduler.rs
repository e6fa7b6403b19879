//! Compute task driving the tracker at a fixed cadence.
//!
//! The task owns the [`Tracker`] and publishes an immutable [`Frame`] after
//! every tick or command. Readers take the latest frame whenever they need
//! one and never wait for a propagation pass.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    orbit::Generation,
    propagator::Propagator,
    selection::QueryParams,
    sink::Frame,
    tracker::Tracker,
};

/// Requests handled by the compute task between ticks.
#[derive(Clone, Debug)]
pub enum Command {
    /// Replaces the catalog, then restores the selection from `restore` if
    /// given.
    LoadCatalog {
        group: String,
        text: String,
        restore: Option<QueryParams>,
    },
    Pick(usize),
    Close,
    TogglePlaying,
    SetPlaying(bool),
    AdvanceTime(Duration),
    ResetClock,
}

/// Handle to a running compute task.
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    frames: watch::Receiver<Arc<Frame>>,
    generation: Generation,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Sends a command to the compute task.
    ///
    /// Returns `false` once the task has stopped.
    pub fn send(&self, command: Command) -> bool {
        if matches!(command, Command::LoadCatalog { .. }) {
            // Abandon any orbit sampling of the outgoing catalog.
            self.generation.bump();
        }
        self.commands.send(command).is_ok()
    }

    /// Returns the latest published frame.
    pub fn frame(&self) -> Arc<Frame> {
        self.frames.borrow().clone()
    }

    /// Returns a receiver notified of every new frame.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Frame>> {
        self.frames.clone()
    }

    /// Stops the compute task.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(e) = self.task.await {
            log::error!("compute task failed: {e}");
        }
    }
}

/// Spawns the compute task.
pub fn spawn<P: Propagator>(tracker: Tracker<P>) -> SchedulerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (frame_tx, frame_rx) = watch::channel(Arc::new(tracker.frame(Utc::now())));
    let generation = tracker.generation().clone();
    let task = tokio::spawn(run(tracker, command_rx, frame_tx));
    SchedulerHandle {
        commands: command_tx,
        frames: frame_rx,
        generation,
        task,
    }
}

async fn run<P: Propagator>(
    mut tracker: Tracker<P>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    frames: watch::Sender<Arc<Frame>>,
) {
    let mut interval = tokio::time::interval(tracker.config().compute_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(report) = tracker.compute_tick(Utc::now()) {
                    log::debug!("tick: {} propagated, {} stale", report.propagated, report.stale.len());
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                handle_command(&mut tracker, command);
            }
        }
        frames.send_replace(Arc::new(tracker.frame(Utc::now())));
    }
    log::debug!("compute task stopped");
}

fn handle_command<P: Propagator>(tracker: &mut Tracker<P>, command: Command) {
    let wall = Utc::now();
    match command {
        Command::LoadCatalog {
            group,
            text,
            restore,
        } => {
            if let Err(e) = tracker.load_catalog(group, &text) {
                log::error!("failed to load catalog: {e}");
                return;
            }
            // Fill the snapshots before the first frame of the new catalog.
            tracker.compute_tick(wall);
            if let Some(params) = restore {
                tracker.restore(&params, wall);
            }
        }
        Command::Pick(index) => {
            if let Err(e) = tracker.pick(index, wall) {
                log::warn!("cannot select object: {e}");
            }
        }
        Command::Close => {
            tracker.close(wall);
        }
        Command::TogglePlaying => tracker.toggle_playing(wall),
        Command::SetPlaying(true) => tracker.play(wall),
        Command::SetPlaying(false) => tracker.pause(wall),
        Command::AdvanceTime(delta) => tracker.advance_time(delta),
        Command::ResetClock => tracker.reset_clock(wall),
    }
}
