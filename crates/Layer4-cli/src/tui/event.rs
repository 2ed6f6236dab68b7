//! Terminal input for the panel
//!
//! Input is read on a dedicated `panel-input` thread because crossterm's
//! `poll`/`read` block. Ticks fire on a fixed cadence, the console poll
//! interval, no matter how much input arrives in between, so task
//! reconciliation and console redraws keep pace with the output channel.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Reconcile tasks and redraw
    Tick,
    Quit,
}

/// Map a terminal event to a panel event
///
/// Key releases and repeats are ignored (Windows reports both), and
/// `Ctrl+C` always quits regardless of focus or edit mode.
pub fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Press => None,
        Event::Key(key)
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(TuiEvent::Quit)
        }
        Event::Key(key) => Some(TuiEvent::Key(key)),
        Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
        _ => None,
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TuiEvent>,
}

impl EventHandler {
    /// Start reading input, ticking every `tick_rate`
    ///
    /// The input thread exits once the handler is dropped.
    pub fn start(tick_rate: Duration) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("panel-input".to_string())
            .spawn(move || input_loop(tx, tick_rate))?;
        Ok(Self { rx })
    }

    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.rx.recv().await
    }
}

fn input_loop(tx: mpsc::UnboundedSender<TuiEvent>, tick_rate: Duration) {
    let mut next_tick = Instant::now() + tick_rate;
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(raw) => {
                    if let Some(ev) = translate(raw) {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => warn!("Failed to read terminal event: {}", e),
            },
            Ok(false) => {}
            Err(e) => {
                warn!("Terminal poll failed: {}", e);
                // avoid spinning on a broken terminal
                thread::sleep(tick_rate);
            }
        }

        if Instant::now() >= next_tick {
            if tx.send(TuiEvent::Tick).is_err() {
                break;
            }
            next_tick += tick_rate;
            // fell behind (e.g. suspended): resume from now instead of bursting
            if next_tick < Instant::now() {
                next_tick = Instant::now() + tick_rate;
            }
        }
    }
    debug!("Input thread finished");
}
