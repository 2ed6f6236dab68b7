//! Feature traits - the contract every panel feature implements

use super::form::OptionsForm;
use std::sync::Arc;
use std::time::Duration;
use twirtee_foundation::{CancellationToken, OptionValues, OutputSink, Result};

// ============================================================================
// TaskContext - what a running task body gets
// ============================================================================

/// Context handed to [`Feature::main`] for one task
///
/// Carries the resolved option values, a read-only view of the task's
/// cancellation token and the sink that routes printed text to the console.
/// Only the supervisor can cancel a task.
pub struct TaskContext {
    task_id: u64,
    options: OptionValues,
    cancel: CancellationToken,
    out: Arc<dyn OutputSink>,
}

impl TaskContext {
    pub fn new(
        task_id: u64,
        options: OptionValues,
        cancel: CancellationToken,
        out: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            task_id,
            options,
            cancel,
            out,
        }
    }

    /// Identifier of the task running this body
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    /// Option values captured when the task started
    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    /// Stop has been requested; the body should return soon
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Print one line to the console
    pub fn println(&self, text: impl AsRef<str>) {
        self.out.emit(text.as_ref());
    }

    /// Sleep while watching for cancellation
    ///
    /// Returns `false` if the task was cancelled before the full duration.
    pub fn sleep(&self, duration: Duration) -> bool {
        self.cancel.sleep(duration)
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task_id)
            .field("options", &self.options)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

// ============================================================================
// Feature - the core contract
// ============================================================================

/// A named unit of work the panel can run as a task
///
/// ## Lifecycle
///
/// ```text
/// build ─► init ─► (options / main)* ─► exit
/// ```
///
/// - `init` runs once during discovery. It prepares defaults and must not block.
/// - `main` runs on a worker thread, possibly several times concurrently for
///   different tasks. It must poll `ctx.is_cancelled()` (or use `ctx.sleep`)
///   often enough to stop within about a second.
/// - `exit` runs once at teardown, whether or not tasks are still running.
pub trait Feature: Send + Sync {
    /// Display name, unique within a registry
    fn name(&self) -> &str;

    /// Icon identifier, resolved to a glyph by the presentation layer
    fn icon(&self) -> &str;

    /// One-time preparation
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// The task body
    fn main(&self, ctx: &TaskContext) -> Result<()>;

    /// Release feature-held resources at teardown
    fn exit(&self) {}

    /// Build the option form for this feature
    fn options(&self) -> OptionsForm;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl OutputSink for Collect {
        fn emit(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    #[test]
    fn test_context_println_and_cancel() {
        let out = Arc::new(Collect::default());
        let token = CancellationToken::new();
        let ctx = TaskContext::new(
            3,
            OptionValues::new().with("message", "hi"),
            token.clone(),
            out.clone(),
        );

        ctx.println("hello");
        ctx.println(String::from("world"));
        assert_eq!(*out.0.lock(), vec!["hello", "world"]);
        assert_eq!(ctx.task_id(), 3);
        assert_eq!(ctx.options().text_or("message", ""), "hi");

        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(!ctx.sleep(Duration::from_secs(5)));
    }
}
