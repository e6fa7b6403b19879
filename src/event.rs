use std::time::Duration;

use anyhow::{Result, anyhow};
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};

/// Terminal events.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    /// Time to draw the next frame.
    Render,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
}

/// Terminal event handler.
///
/// Merges terminal input with a render cadence independent of the compute
/// task.
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    _task: JoinHandle<()>,
}

impl EventHandler {
    pub fn new(render_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut render = tokio::time::interval(render_interval);
            render.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                let render_delay = render.tick();
                let crossterm_event = reader.next().fuse();
                let event = tokio::select! {
                    _ = sender.closed() => break,
                    _ = render_delay => Event::Render,
                    Some(Ok(event)) = crossterm_event => match event {
                        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                        CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
                        CrosstermEvent::Resize(..) => Event::Resize,
                        _ => continue,
                    },
                };
                if sender.send(event).is_err() {
                    break;
                }
            }
        });
        Self {
            receiver,
            _task: task,
        }
    }

    /// Receives the next event.
    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow!("event stream closed"))
    }
}
