//! Supervisor integration tests - real worker threads, real output channel
//!
//! `cargo test -p twirtee-task --test supervisor_test`

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use twirtee_core::{Feature, FormWidget, OptionField, OptionsForm, TaskContext};
use twirtee_foundation::{
    ConsoleConfig, Error, OptionValues, OutputSink, Result, TasksConfig,
};
use twirtee_task::{
    ChannelSink, ConsoleBuffer, OutputChannel, TaskEvent, TaskId, TaskStatus, TaskSupervisor,
};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test features
// ============================================================================

/// Prints `Step i/n`, sleeping `delay_ms` in 100 ms slices between steps
struct Steps;

impl Feature for Steps {
    fn name(&self) -> &str {
        "Steps"
    }

    fn icon(&self) -> &str {
        "time"
    }

    fn main(&self, ctx: &TaskContext) -> Result<()> {
        let n = ctx.options().int_or("n", 5)?;
        let delay = Duration::from_millis(ctx.options().int_or("delay_ms", 0)? as u64);
        for i in 1..=n {
            if ctx.is_cancelled() {
                return Ok(());
            }
            ctx.println(format!("Step {}/{}", i, n));
            if !ctx.sleep(delay) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::new(FormWidget::new(vec![
            OptionField::integer("n", 5),
            OptionField::integer("delay_ms", 0),
        ]))
    }
}

/// Ignores its token until released
struct Stubborn {
    release: Arc<AtomicBool>,
}

impl Feature for Stubborn {
    fn name(&self) -> &str {
        "Stubborn"
    }

    fn icon(&self) -> &str {
        "rock"
    }

    fn main(&self, _ctx: &TaskContext) -> Result<()> {
        while !self.release.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::empty()
    }
}

struct Panics;

impl Feature for Panics {
    fn name(&self) -> &str {
        "Panics"
    }

    fn icon(&self) -> &str {
        "bomb"
    }

    fn main(&self, _ctx: &TaskContext) -> Result<()> {
        panic!("feature exploded")
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::empty()
    }
}

struct Fails;

impl Feature for Fails {
    fn name(&self) -> &str {
        "Fails"
    }

    fn icon(&self) -> &str {
        "x"
    }

    fn main(&self, _ctx: &TaskContext) -> Result<()> {
        Err(Error::feature("window not found"))
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::empty()
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    supervisor: TaskSupervisor,
    channel: Arc<OutputChannel>,
    buffer: Arc<ConsoleBuffer>,
}

impl Harness {
    fn new() -> Self {
        Self::with_tasks(TasksConfig::default())
    }

    fn with_tasks(tasks: TasksConfig) -> Self {
        let buffer = Arc::new(ConsoleBuffer::new(1000));
        let config = ConsoleConfig {
            poll_interval_ms: 10,
            ..ConsoleConfig::default()
        };
        let channel = OutputChannel::start(buffer.clone(), &config).unwrap();
        let sink: Arc<dyn OutputSink> = Arc::new(ChannelSink::new(channel.clone()));
        Self {
            supervisor: TaskSupervisor::new(sink, tasks),
            channel,
            buffer,
        }
    }

    /// Console text after everything queued has been rendered
    fn console(&self) -> Vec<String> {
        self.channel.stop();
        self.buffer.lines().into_iter().map(|l| l.text).collect()
    }
}

fn steps(n: i64, delay_ms: i64) -> OptionValues {
    OptionValues::new().with("n", n).with("delay_ms", delay_ms)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_ids_strictly_increase() {
    let h = Harness::new();
    let ids: Vec<TaskId> = (0..5)
        .map(|_| h.supervisor.start(Arc::new(Steps), steps(1, 0)).unwrap())
        .collect();
    assert_eq!(ids, (1..=5).map(TaskId).collect::<Vec<_>>());

    for id in &ids {
        assert_eq!(h.supervisor.wait(*id, WAIT), Some(TaskStatus::Completed));
        h.supervisor.dismiss(*id).unwrap();
    }
    // dismissed ids are never handed out again
    let next = h.supervisor.start(Arc::new(Steps), steps(1, 0)).unwrap();
    assert_eq!(next, TaskId(6));
}

#[test]
fn test_steps_complete_in_order() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Steps), steps(5, 0)).unwrap();
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Completed));

    assert_eq!(
        h.console(),
        vec![
            "Started task 1: Steps",
            "[Task 1] Starting Steps",
            "Step 1/5",
            "Step 2/5",
            "Step 3/5",
            "Step 4/5",
            "Step 5/5",
            "[Task 1] Completed Steps",
        ]
    );
}

#[test]
fn test_stop_during_sleep() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Steps), steps(50, 100)).unwrap();

    thread::sleep(Duration::from_millis(150));
    assert!(h.supervisor.stop(id));
    assert_eq!(h.supervisor.status(id), Some(TaskStatus::Stopping));
    let stopped_at = Instant::now();

    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Stopped));
    assert!(stopped_at.elapsed() < Duration::from_secs(1));

    let console = h.console();
    let stop_line = console
        .iter()
        .position(|l| l == "Stopping task 1...")
        .unwrap();
    let steps_after_stop = console[stop_line..]
        .iter()
        .filter(|l| l.starts_with("Step "))
        .count();
    assert!(steps_after_stop <= 1);
    assert_eq!(console.last().unwrap(), "[Task 1] Stopped Steps");
}

#[test]
fn test_stop_twice_is_stop_once() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Steps), steps(50, 100)).unwrap();

    assert!(h.supervisor.stop(id));
    assert!(!h.supervisor.stop(id));
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Stopped));
    assert!(!h.supervisor.stop(id));

    let events = h.supervisor.reconcile();
    let stopping = events
        .iter()
        .filter(|e| matches!(e, TaskEvent::Stopping(_)))
        .count();
    assert_eq!(stopping, 1);

    let console = h.console();
    let lines = console
        .iter()
        .filter(|l| l.as_str() == "Stopping task 1...")
        .count();
    assert_eq!(lines, 1);
}

#[test]
fn test_uncooperative_task_stays_stopping() {
    let h = Harness::new();
    let release = Arc::new(AtomicBool::new(false));
    let id = h
        .supervisor
        .start(
            Arc::new(Stubborn {
                release: release.clone(),
            }),
            OptionValues::new(),
        )
        .unwrap();

    h.supervisor.stop(id);
    assert_eq!(
        h.supervisor.wait(id, Duration::from_millis(300)),
        Some(TaskStatus::Stopping)
    );
    assert_eq!(h.supervisor.active_count(), 1);

    release.store(true, Ordering::SeqCst);
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Stopped));
    assert_eq!(h.supervisor.active_count(), 0);
}

#[test]
fn test_overdue_flagged_once() {
    let h = Harness::with_tasks(TasksConfig {
        stop_grace_secs: 0,
        shutdown_grace_secs: 0,
    });
    let release = Arc::new(AtomicBool::new(false));
    let id = h
        .supervisor
        .start(
            Arc::new(Stubborn {
                release: release.clone(),
            }),
            OptionValues::new(),
        )
        .unwrap();
    h.supervisor.stop(id);

    let first = h.supervisor.reconcile();
    let second = h.supervisor.reconcile();
    let overdue = |events: &[TaskEvent]| {
        events
            .iter()
            .filter(|e| matches!(e, TaskEvent::Overdue(_)))
            .count()
    };
    assert_eq!(overdue(&first), 1);
    assert_eq!(overdue(&second), 0);
    assert!(h.supervisor.get(id).unwrap().overdue);

    release.store(true, Ordering::SeqCst);
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Stopped));
    assert!(!h.supervisor.get(id).unwrap().overdue);
}

#[test]
fn test_panic_is_contained() {
    let h = Harness::new();
    let healthy = h.supervisor.start(Arc::new(Steps), steps(3, 100)).unwrap();
    let broken = h.supervisor.start(Arc::new(Panics), OptionValues::new()).unwrap();

    assert_eq!(h.supervisor.wait(broken, WAIT), Some(TaskStatus::Error));
    assert_eq!(h.supervisor.wait(healthy, WAIT), Some(TaskStatus::Completed));

    let info = h.supervisor.get(broken).unwrap();
    assert!(info.error.unwrap().contains("feature exploded"));

    let console = h.console();
    assert!(console
        .iter()
        .any(|l| l.starts_with("[Task 2] Error in Panics: ") && l.contains("feature exploded")));
    assert!(console.iter().any(|l| l == "[Task 1] Completed Steps"));
}

#[test]
fn test_feature_error() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Fails), OptionValues::new()).unwrap();
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Error));

    let events = h.supervisor.reconcile();
    assert!(events.iter().any(|e| matches!(
        e,
        TaskEvent::Finished { status: TaskStatus::Error, error: Some(detail), .. }
            if detail == "window not found"
    )));
    assert!(h
        .console()
        .contains(&"[Task 1] Error in Fails: window not found".to_string()));
}

#[test]
fn test_invalid_form_creates_no_task() {
    let h = Harness::new();
    let feature: Arc<dyn Feature> = Arc::new(Steps);
    let form = feature.options();
    form.widget().set("n", "five").unwrap();

    let err = h.supervisor.start_form(feature.clone(), &form).unwrap_err();
    assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "n"));
    assert!(h.supervisor.tasks().is_empty());

    form.widget().set("n", "2").unwrap();
    let id = h.supervisor.start_form(feature, &form).unwrap();
    assert_eq!(id, TaskId(1));
    assert_eq!(h.supervisor.wait(id, WAIT), Some(TaskStatus::Completed));

    let console = h.console();
    assert!(console[0].starts_with("Cannot start Steps: "));
    assert!(console.contains(&"Step 2/2".to_string()));
}

#[test]
fn test_form_getter_called_once() {
    let h = Harness::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let form = OptionsForm::with_getter(FormWidget::new(Vec::new()), move |_| {
        *counter.lock() += 1;
        Ok(OptionValues::new().with("n", 1i64))
    });

    let id = h.supervisor.start_form(Arc::new(Steps), &form).unwrap();
    h.supervisor.wait(id, WAIT);
    assert_eq!(*calls.lock(), 1);
}

#[test]
fn test_dismiss_rules() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Steps), steps(50, 100)).unwrap();

    assert!(matches!(h.supervisor.dismiss(id), Err(Error::TaskActive(1))));
    h.supervisor.stop(id);
    assert!(matches!(h.supervisor.dismiss(id), Err(Error::TaskActive(1))));

    h.supervisor.wait(id, WAIT);
    h.supervisor.dismiss(id).unwrap();
    assert!(matches!(h.supervisor.dismiss(id), Err(Error::TaskNotFound(1))));
}

#[test]
fn test_shutdown_stops_everything() {
    let h = Harness::new();
    let a = h.supervisor.start(Arc::new(Steps), steps(50, 100)).unwrap();
    let b = h.supervisor.start(Arc::new(Steps), steps(50, 100)).unwrap();

    h.supervisor.shutdown(Duration::from_secs(2));
    assert_eq!(h.supervisor.status(a), Some(TaskStatus::Stopped));
    assert_eq!(h.supervisor.status(b), Some(TaskStatus::Stopped));
    assert_eq!(h.supervisor.active_count(), 0);
}

#[test]
fn test_shutdown_leaves_stuck_worker() {
    let h = Harness::new();
    let release = Arc::new(AtomicBool::new(false));
    let id = h
        .supervisor
        .start(
            Arc::new(Stubborn {
                release: release.clone(),
            }),
            OptionValues::new(),
        )
        .unwrap();

    let started = Instant::now();
    h.supervisor.shutdown(Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(h.supervisor.status(id), Some(TaskStatus::Stopping));

    release.store(true, Ordering::SeqCst);
}

#[test]
fn test_tasks_sorted_by_id() {
    let h = Harness::new();
    for _ in 0..3 {
        h.supervisor.start(Arc::new(Steps), steps(1, 0)).unwrap();
    }
    let ids: Vec<u64> = h.supervisor.tasks().iter().map(|t| t.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

/// Let the worker report without reconciling
fn wait_for_console_line(h: &Harness, line: &str) {
    let deadline = Instant::now() + WAIT;
    while !h.buffer.lines().iter().any(|l| l.text == line) {
        assert!(Instant::now() < deadline, "no console line {:?}", line);
        thread::sleep(Duration::from_millis(10));
    }
    // the completion is sent right after the last line
    thread::sleep(Duration::from_millis(50));
}

#[test]
fn test_stop_after_worker_finished() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Steps), steps(1, 0)).unwrap();
    wait_for_console_line(&h, "[Task 1] Completed Steps");
    // nothing has reconciled yet
    assert_eq!(h.supervisor.tasks()[0].status, TaskStatus::Running);

    assert!(!h.supervisor.stop(id));
    assert_eq!(h.supervisor.status(id), Some(TaskStatus::Completed));
    assert_eq!(
        h.supervisor.wait(id, Duration::from_millis(100)),
        Some(TaskStatus::Completed)
    );
    h.supervisor.dismiss(id).unwrap();

    let events = h.supervisor.reconcile();
    assert!(!events.iter().any(|e| matches!(e, TaskEvent::Stopping(_))));
    assert!(!events.iter().any(|e| matches!(e, TaskEvent::Overdue(_))));
    assert!(!h.console().iter().any(|l| l == "Stopping task 1..."));
}

#[test]
fn test_shutdown_after_worker_finished() {
    let h = Harness::new();
    let id = h.supervisor.start(Arc::new(Fails), OptionValues::new()).unwrap();
    wait_for_console_line(&h, "[Task 1] Error in Fails: window not found");

    let started = Instant::now();
    h.supervisor.shutdown(Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(h.supervisor.status(id), Some(TaskStatus::Error));
    assert_eq!(h.supervisor.active_count(), 0);
}
