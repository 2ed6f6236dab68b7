//! Output sinks
//!
//! Everything that prints to the console receives an `Arc<dyn OutputSink>`
//! instead of writing to the process stdout. `TeeSink` mirrors every line to a
//! passthrough writer (the real stdout in headless mode) and to the console.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for console text
pub trait OutputSink: Send + Sync {
    /// Emit one piece of text. Must not block on the consumer.
    fn emit(&self, text: &str);
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn emit(&self, text: &str) {
        (**self).emit(text)
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&self, _text: &str) {}
}

/// Mirror to a passthrough writer and forward to a primary sink
pub struct TeeSink {
    primary: Arc<dyn OutputSink>,
    passthrough: Mutex<Box<dyn Write + Send>>,
}

impl TeeSink {
    pub fn new(primary: Arc<dyn OutputSink>, passthrough: Box<dyn Write + Send>) -> Self {
        Self {
            primary,
            passthrough: Mutex::new(passthrough),
        }
    }

    /// Tee to the process stdout
    pub fn stdout(primary: Arc<dyn OutputSink>) -> Self {
        Self::new(primary, Box::new(std::io::stdout()))
    }
}

impl OutputSink for TeeSink {
    fn emit(&self, text: &str) {
        {
            let mut out = self.passthrough.lock();
            // a broken passthrough must not stop console delivery
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
        self.primary.emit(text);
    }
}

/// `io::Write` adapter that emits one sink call per completed line
///
/// Used to route formatted log records into the console.
pub struct SinkWriter {
    sink: Arc<dyn OutputSink>,
    buf: Vec<u8>,
}

impl SinkWriter {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            sink,
            buf: Vec::new(),
        }
    }

    fn emit_complete_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.sink.emit(&text);
        }
    }
}

impl Write for SinkWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.emit_complete_lines();
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            let text = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            self.sink.emit(&text);
        }
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
