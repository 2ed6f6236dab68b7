//! Task Supervisor - owns in-flight tasks and their worker threads
//!
//! Each task body runs on its own named OS thread (`task-N`). Workers never
//! touch the task table: they report through a completion queue that the
//! presentation thread drains with [`TaskSupervisor::reconcile`].
//!
//! ```text
//! start ──► table[N] = Running ──► spawn task-N ──► Feature::main
//!                                                     │
//! reconcile ◄── completion queue ◄── Completion{N} ◄──┘
//! ```

use crate::task::{Completion, TaskEvent, TaskId, TaskInfo, TaskOutcome, TaskStatus};
use chrono::Local;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use twirtee_core::{Feature, OptionsForm, TaskContext};
use twirtee_foundation::{
    CancellationToken, Error, OptionValues, OutputSink, Result, TasksConfig,
};

/// How often `wait` and `shutdown` re-check the table
const RECONCILE_POLL: Duration = Duration::from_millis(20);

/// Supervisor-side record of one task
struct TaskEntry {
    info: TaskInfo,
    token: CancellationToken,
    worker: Option<JoinHandle<()>>,
    stop_requested_at: Option<Instant>,
}

#[derive(Default)]
struct TaskTable {
    entries: BTreeMap<TaskId, TaskEntry>,
    /// Highest id ever handed out
    last_id: u64,
    /// Events not yet collected by `reconcile`
    pending: Vec<TaskEvent>,
}

/// Task supervisor
pub struct TaskSupervisor {
    table: Mutex<TaskTable>,
    out: Arc<dyn OutputSink>,
    completion_tx: Sender<Completion>,
    completion_rx: Mutex<Receiver<Completion>>,
    config: TasksConfig,
}

impl TaskSupervisor {
    pub fn new(out: Arc<dyn OutputSink>, config: TasksConfig) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            table: Mutex::new(TaskTable::default()),
            out,
            completion_tx,
            completion_rx: Mutex::new(completion_rx),
            config,
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Start a task running `feature.main` with `values`
    ///
    /// Returns as soon as the worker thread is spawned.
    pub fn start(&self, feature: Arc<dyn Feature>, values: OptionValues) -> Result<TaskId> {
        let name = feature.name().to_string();
        let token = CancellationToken::new();

        let mut table = self.table.lock();
        let id = TaskId(table.last_id + 1);
        table.last_id = id.0;

        let info = TaskInfo::new(id, name.clone());
        table.entries.insert(
            id,
            TaskEntry {
                info: info.clone(),
                token: token.clone(),
                worker: None,
                stop_requested_at: None,
            },
        );
        self.out.emit(&format!("Started task {}: {}", id, name));

        let ctx = TaskContext::new(id.0, values, token, Arc::clone(&self.out));
        let out = Arc::clone(&self.out);
        let tx = self.completion_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("task-{}", id))
            .spawn(move || run_worker(id, feature, ctx, out, tx));

        match spawned {
            Ok(handle) => {
                if let Some(entry) = table.entries.get_mut(&id) {
                    entry.worker = Some(handle);
                }
                table.pending.push(TaskEvent::Started(info));
                info!("Started task {}: {}", id, name);
                Ok(id)
            }
            Err(e) => {
                table.entries.remove(&id);
                drop(table);
                error!("Failed to spawn worker for task {} ({}): {}", id, name, e);
                self.out
                    .emit(&format!("Failed to start task {}: {}", id, name));
                Err(Error::Spawn(e.to_string()))
            }
        }
    }

    /// Resolve the form's values, then start
    ///
    /// The getter runs exactly once. A bad value creates no task and uses no id.
    pub fn start_form(&self, feature: Arc<dyn Feature>, form: &OptionsForm) -> Result<TaskId> {
        let values = match form.values() {
            Ok(values) => values,
            Err(e) => {
                warn!("Not starting {}: {}", feature.name(), e);
                self.out
                    .emit(&format!("Cannot start {}: {}", feature.name(), e));
                return Err(e);
            }
        };
        self.start(feature, values)
    }

    /// Request cooperative cancellation
    ///
    /// Unknown, finished or already-stopping tasks are left alone. Returns
    /// whether this call moved the task to `Stopping`. Never waits.
    pub fn stop(&self, id: TaskId) -> bool {
        let mut table = self.table.lock();
        // a worker may have finished since the last reconcile
        self.drain_completions(&mut table);
        let Some(entry) = table.entries.get_mut(&id) else {
            debug!("Stop ignored for unknown task {}", id);
            return false;
        };
        if entry.info.status != TaskStatus::Running {
            debug!("Stop ignored for task {} ({})", id, entry.info.status);
            return false;
        }

        entry.token.cancel();
        entry.info.status = TaskStatus::Stopping;
        entry.stop_requested_at = Some(Instant::now());
        let name = entry.info.feature.clone();
        table.pending.push(TaskEvent::Stopping(id));
        drop(table);

        info!("Stopping task {} ({})", id, name);
        self.out.emit(&format!("Stopping task {}...", id));
        true
    }

    /// Remove a finished task from the table
    pub fn dismiss(&self, id: TaskId) -> Result<()> {
        let mut table = self.table.lock();
        match table.entries.get(&id).map(|e| e.info.status) {
            None => Err(Error::TaskNotFound(id.0)),
            Some(status) if status.is_active() => Err(Error::TaskActive(id.0)),
            Some(_) => {
                table.entries.remove(&id);
                table.pending.push(TaskEvent::Dismissed(id));
                debug!("Dismissed task {}", id);
                Ok(())
            }
        }
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Apply worker completions and return board events since the last call
    ///
    /// Call from the presentation thread.
    pub fn reconcile(&self) -> Vec<TaskEvent> {
        self.apply_completions();
        std::mem::take(&mut self.table.lock().pending)
    }

    fn apply_completions(&self) {
        let mut table = self.table.lock();
        self.drain_completions(&mut table);
        self.flag_overdue(&mut table);
    }

    /// Apply every queued completion to `table`
    ///
    /// A worker that returns while its task is `Stopping` always ends the
    /// task as `Stopped`, whatever it reported.
    fn drain_completions(&self, table: &mut TaskTable) {
        let completions: Vec<Completion> = self.completion_rx.lock().try_iter().collect();

        for completion in completions {
            let id = completion.id;
            let Some(entry) = table.entries.get_mut(&id) else {
                warn!("Completion for unknown task {}", id);
                continue;
            };

            let reported = completion.outcome.status();
            let next = match entry.info.status {
                TaskStatus::Stopping => TaskStatus::Stopped,
                _ => reported,
            };
            if next != reported {
                debug!("Task {} reported {} after stop was requested", id, reported);
            }
            if !entry.info.status.can_become(next) {
                warn!(
                    "Ignoring {} for task {} in state {}",
                    next, id, entry.info.status
                );
                continue;
            }

            entry.info.status = next;
            entry.info.finished_at = Some(Local::now());
            entry.info.overdue = false;
            if let TaskOutcome::Error(detail) = &completion.outcome {
                entry.info.error = Some(detail.clone());
            }
            if let Some(worker) = entry.worker.take() {
                if worker.join().is_err() {
                    warn!("Worker for task {} panicked after reporting", id);
                }
            }

            let event = TaskEvent::Finished {
                id,
                status: next,
                error: entry.info.error.clone(),
            };
            table.pending.push(event);
        }
    }

    /// Flag tasks that have ignored a stop request for longer than the grace
    fn flag_overdue(&self, table: &mut TaskTable) {
        let grace = self.config.stop_grace();
        let mut overdue = Vec::new();
        for (id, entry) in table.entries.iter_mut() {
            let late = entry.info.status == TaskStatus::Stopping
                && !entry.info.overdue
                && entry
                    .stop_requested_at
                    .is_some_and(|at| at.elapsed() >= grace);
            if late {
                entry.info.overdue = true;
                warn!(
                    "Task {} ({}) still running {:?} after stop was requested",
                    id, entry.info.feature, grace
                );
                overdue.push(*id);
            }
        }
        table
            .pending
            .extend(overdue.into_iter().map(TaskEvent::Overdue));
    }

    /// Reconcile until `id` is terminal or `timeout` passes
    ///
    /// Returns the last known status, `None` for unknown ids. Board events
    /// stay queued for the next `reconcile`.
    pub fn wait(&self, id: TaskId, timeout: Duration) -> Option<TaskStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            self.apply_completions();
            let status = self.status(id)?;
            if status.is_terminal() || Instant::now() >= deadline {
                return Some(status);
            }
            thread::sleep(RECONCILE_POLL);
        }
    }

    /// Stop every live task and wait up to `grace` for the workers
    ///
    /// Workers that do not return in time are left detached.
    pub fn shutdown(&self, grace: Duration) {
        let live: Vec<TaskId> = {
            let mut table = self.table.lock();
            self.drain_completions(&mut table);
            table
                .entries
                .iter()
                .filter(|(_, e)| e.info.status == TaskStatus::Running)
                .map(|(id, _)| *id)
                .collect()
        };
        for id in live {
            self.stop(id);
        }

        let deadline = Instant::now() + grace;
        loop {
            self.apply_completions();
            if self.active_count() == 0 || Instant::now() >= deadline {
                break;
            }
            thread::sleep(RECONCILE_POLL);
        }

        let mut table = self.table.lock();
        for (id, entry) in table.entries.iter_mut() {
            if entry.info.status.is_active() {
                warn!(
                    "Task {} ({}) did not stop within {:?}; leaving it detached",
                    id, entry.info.feature, grace
                );
                entry.worker.take();
            }
        }
        info!("Task supervisor shut down");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.table.lock().entries.get(&id).map(|e| e.info.status)
    }

    pub fn get(&self, id: TaskId) -> Option<TaskInfo> {
        self.table.lock().entries.get(&id).map(|e| e.info.clone())
    }

    /// All known tasks, ordered by id
    pub fn tasks(&self) -> Vec<TaskInfo> {
        self.table
            .lock()
            .entries
            .values()
            .map(|e| e.info.clone())
            .collect()
    }

    /// Tasks whose worker has not returned yet
    pub fn active_count(&self) -> usize {
        self.table
            .lock()
            .entries
            .values()
            .filter(|e| e.info.status.is_active())
            .count()
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }
}

/// Worker thread body: run the feature and report how it ended
fn run_worker(
    id: TaskId,
    feature: Arc<dyn Feature>,
    ctx: TaskContext,
    out: Arc<dyn OutputSink>,
    tx: Sender<Completion>,
) {
    let name = feature.name().to_string();
    out.emit(&format!("[Task {}] Starting {}", id, name));

    let result = catch_unwind(AssertUnwindSafe(|| feature.main(&ctx)))
        .unwrap_or_else(|payload| Err(Error::from_panic(payload.as_ref())));

    let outcome = if ctx.is_cancelled() {
        out.emit(&format!("[Task {}] Stopped {}", id, name));
        info!("Task {} ({}) stopped", id, name);
        TaskOutcome::Stopped
    } else {
        match result {
            Ok(()) => {
                out.emit(&format!("[Task {}] Completed {}", id, name));
                info!("Task {} ({}) completed", id, name);
                TaskOutcome::Completed
            }
            Err(e) => {
                out.emit(&format!("[Task {}] Error in {}: {}", id, name, e));
                error!("Task {} ({}) failed: {}", id, name, e);
                TaskOutcome::Error(e.to_string())
            }
        }
    };

    // receiver lives as long as the supervisor; a dropped supervisor means nobody is listening
    let _ = tx.send(Completion { id, outcome });
}

#[cfg(test)]
mod tests {
    use super::*;
    use twirtee_core::FormWidget;
    use twirtee_foundation::NullSink;

    struct Noop;

    impl Feature for Noop {
        fn name(&self) -> &str {
            "Noop"
        }

        fn icon(&self) -> &str {
            "dot"
        }

        fn main(&self, _ctx: &TaskContext) -> Result<()> {
            Ok(())
        }

        fn options(&self) -> OptionsForm {
            OptionsForm::empty()
        }
    }

    fn supervisor() -> TaskSupervisor {
        TaskSupervisor::new(Arc::new(NullSink), TasksConfig::default())
    }

    #[test]
    fn test_unknown_task_controls() {
        let sup = supervisor();
        assert!(!sup.stop(TaskId(42)));
        assert!(matches!(sup.dismiss(TaskId(42)), Err(Error::TaskNotFound(42))));
        assert_eq!(sup.status(TaskId(42)), None);
        assert_eq!(sup.wait(TaskId(42), Duration::from_millis(10)), None);
    }

    #[test]
    fn test_reconcile_emits_started_then_finished() {
        let sup = supervisor();
        let id = sup.start(Arc::new(Noop), OptionValues::new()).unwrap();
        assert_eq!(
            sup.wait(id, Duration::from_secs(5)),
            Some(TaskStatus::Completed)
        );

        let events = sup.reconcile();
        assert!(matches!(events[0], TaskEvent::Started(ref info) if info.id == id));
        assert!(matches!(
            events[1],
            TaskEvent::Finished { status: TaskStatus::Completed, .. }
        ));
        assert!(sup.reconcile().is_empty());

        sup.dismiss(id).unwrap();
        assert!(matches!(sup.reconcile()[0], TaskEvent::Dismissed(d) if d == id));
        assert!(sup.tasks().is_empty());
    }

    #[test]
    fn test_late_completion_while_stopping_ends_stopped() {
        let sup = supervisor();
        let id = TaskId(7);
        {
            let mut table = sup.table.lock();
            let mut info = TaskInfo::new(id, "Noop");
            info.status = TaskStatus::Stopping;
            table.entries.insert(
                id,
                TaskEntry {
                    info,
                    token: CancellationToken::new(),
                    worker: None,
                    stop_requested_at: Some(Instant::now()),
                },
            );
        }

        // worker finished before it saw the stop request
        sup.completion_tx
            .send(Completion {
                id,
                outcome: TaskOutcome::Completed,
            })
            .unwrap();

        let events = sup.reconcile();
        assert_eq!(sup.status(id), Some(TaskStatus::Stopped));
        assert!(matches!(
            events[0],
            TaskEvent::Finished { status: TaskStatus::Stopped, .. }
        ));
        sup.dismiss(id).unwrap();
    }

    #[test]
    fn test_bad_form_consumes_no_id() {
        let sup = supervisor();
        let widget = FormWidget::new(vec![twirtee_core::OptionField::integer("n", 1)]);
        widget.set_input(0, "one");
        let form = OptionsForm::new(widget);

        assert!(matches!(
            sup.start_form(Arc::new(Noop), &form),
            Err(Error::InvalidOption { .. })
        ));
        assert!(sup.tasks().is_empty());

        let id = sup.start(Arc::new(Noop), OptionValues::new()).unwrap();
        assert_eq!(id, TaskId(1));
    }
}
