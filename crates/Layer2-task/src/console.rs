//! Output Channel - ordered console text from many producers to one renderer
//!
//! ```text
//! worker ─┐
//! worker ─┼─ push ──► mpsc queue ──► consumer thread ──► RenderSink
//! logger ─┘                         (stamps HH:MM:SS)
//! ```
//!
//! Producers never block on rendering. The single consumer stamps each line
//! with the wall-clock time at which it dequeues it, so lines appear in
//! exactly the order they were pushed.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use twirtee_foundation::{ConsoleConfig, Error, OutputSink, Result};

// ============================================================================
// ConsoleLine
// ============================================================================

/// One rendered console line
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl ConsoleLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            text: text.into(),
        }
    }

    /// `[HH:MM:SS] text`
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

impl std::fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

// ============================================================================
// RenderSink
// ============================================================================

/// Where the consumer delivers stamped lines
///
/// Shared between the consumer thread (`render`) and the presentation
/// (`clear`), hence `&self`.
pub trait RenderSink: Send + Sync {
    fn render(&self, line: ConsoleLine);

    /// Drop everything rendered so far
    fn clear(&self);
}

/// Scrollback of rendered lines, read by the TUI console view
///
/// The channel delivers every line; the buffer only keeps the newest
/// `max_lines` of them for display and evicts the oldest beyond that.
pub struct ConsoleBuffer {
    lines: Mutex<VecDeque<ConsoleLine>>,
    max_lines: usize,
    /// Set once the scrollback first overflows
    evicting: AtomicBool,
    /// Bumped on every change so views know when to redraw
    revision: AtomicU64,
}

impl ConsoleBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::new()),
            max_lines: max_lines.max(1),
            evicting: AtomicBool::new(false),
            revision: AtomicU64::new(0),
        }
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.lock().iter().cloned().collect()
    }

    /// Rendered text of the last `n` lines
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock();
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).map(ConsoleLine::render).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Older lines have been evicted from the scrollback
    pub fn is_evicting(&self) -> bool {
        self.evicting.load(Ordering::Relaxed)
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl RenderSink for ConsoleBuffer {
    fn render(&self, line: ConsoleLine) {
        let mut lines = self.lines.lock();
        if lines.len() >= self.max_lines {
            lines.pop_front();
            if !self.evicting.swap(true, Ordering::Relaxed) {
                info!(
                    "Console scrollback full, keeping the newest {} lines",
                    self.max_lines
                );
            }
        }
        lines.push_back(line);
        self.revision.fetch_add(1, Ordering::Release);
    }

    fn clear(&self) {
        self.lines.lock().clear();
        self.revision.fetch_add(1, Ordering::Release);
    }
}

impl<T: RenderSink + ?Sized> RenderSink for Arc<T> {
    fn render(&self, line: ConsoleLine) {
        (**self).render(line)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

// ============================================================================
// OutputChannel
// ============================================================================

/// Ordered, thread-safe console queue with one consumer thread
pub struct OutputChannel {
    /// `None` once stopped; later pushes are dropped
    tx: Mutex<Option<Sender<String>>>,
    sink: Arc<dyn RenderSink>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl OutputChannel {
    /// Spawn the consumer thread
    pub fn start(sink: Arc<dyn RenderSink>, config: &ConsoleConfig) -> Result<Arc<Self>> {
        let (tx, rx) = mpsc::channel::<String>();
        let poll = config.poll_interval();
        let render_to = Arc::clone(&sink);

        let consumer = thread::Builder::new()
            .name("console".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(poll) {
                    Ok(text) => render_to.render(ConsoleLine::new(text)),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| Error::Spawn(e.to_string()))?;

        debug!("Output channel started (poll {:?})", poll);
        Ok(Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            sink,
            consumer: Mutex::new(Some(consumer)),
        }))
    }

    /// Queue one line; never blocks on rendering
    ///
    /// Whitespace-only text is dropped, the rest is trimmed.
    pub fn push(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(tx) = self.tx.lock().as_ref() {
            // receiver only goes away after stop, when tx is already None
            let _ = tx.send(text.to_string());
        }
    }

    /// Discard already-rendered lines; queued ones still render afterwards
    pub fn clear(&self) {
        self.sink.clear();
    }

    /// Deliver what is queued, then end the consumer and join it
    ///
    /// Safe to call more than once.
    pub fn stop(&self) {
        // dropping the only sender lets the consumer drain and see Disconnected
        drop(self.tx.lock().take());

        let handle = self.consumer.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Console consumer thread panicked");
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tx.lock().is_none()
    }
}

impl Drop for OutputChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `OutputSink` that pushes into an [`OutputChannel`]
#[derive(Clone)]
pub struct ChannelSink {
    channel: Arc<OutputChannel>,
}

impl ChannelSink {
    pub fn new(channel: Arc<OutputChannel>) -> Self {
        Self { channel }
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, text: &str) {
        self.channel.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(max_lines: usize) -> (Arc<OutputChannel>, Arc<ConsoleBuffer>) {
        let buffer = Arc::new(ConsoleBuffer::new(max_lines));
        let config = ConsoleConfig {
            poll_interval_ms: 10,
            ..ConsoleConfig::default()
        };
        let channel = OutputChannel::start(buffer.clone(), &config).unwrap();
        (channel, buffer)
    }

    fn texts(buffer: &ConsoleBuffer) -> Vec<String> {
        buffer.lines().into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn test_push_order_and_trim() {
        let (channel, buffer) = channel(100);
        channel.push("  first  ");
        channel.push("   ");
        channel.push("");
        channel.push("second");
        channel.stop();

        assert_eq!(texts(&buffer), vec!["first", "second"]);
    }

    #[test]
    fn test_render_format() {
        let line = ConsoleLine::new("Hello World!");
        let rendered = line.render();
        assert_eq!(rendered.len(), "[00:00:00] Hello World!".len());
        assert!(rendered.starts_with('['));
        assert_eq!(&rendered[9..], "] Hello World!");
    }

    #[test]
    fn test_stop_is_idempotent_and_drops_later_pushes() {
        let (channel, buffer) = channel(100);
        channel.push("before");
        channel.stop();
        channel.stop();
        assert!(channel.is_stopped());

        channel.push("after");
        assert_eq!(texts(&buffer), vec!["before"]);
    }

    #[test]
    fn test_buffer_is_bounded() {
        let buffer = ConsoleBuffer::new(3);
        for i in 0..5 {
            buffer.render(ConsoleLine::new(format!("line {}", i)));
        }
        assert_eq!(texts(&buffer), vec!["line 2", "line 3", "line 4"]);
        assert_eq!(buffer.tail(1).len(), 1);
        assert!(buffer.tail(1)[0].ends_with("line 4"));
        assert!(buffer.is_evicting());
    }

    #[test]
    fn test_no_eviction_below_capacity() {
        let buffer = ConsoleBuffer::new(3);
        for i in 0..3 {
            buffer.render(ConsoleLine::new(format!("line {}", i)));
        }
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_evicting());
    }

    #[test]
    fn test_clear_then_push() {
        let (channel, buffer) = channel(100);
        let sink = ChannelSink::new(channel.clone());
        sink.emit("old");
        sink.emit("older");
        // wait for delivery so the clear hits rendered content
        while buffer.len() < 2 {
            thread::sleep(Duration::from_millis(5));
        }
        let before = buffer.revision();
        channel.clear();
        assert!(buffer.is_empty());
        assert!(buffer.revision() > before);

        sink.emit("x");
        channel.stop();
        assert_eq!(texts(&buffer), vec!["x"]);
    }
}
