//! Status Snapshot - periodic timestamped status records written to disk

use crate::feature::{Feature, FormWidget, OptionField, OptionsForm, TaskContext};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use twirtee_foundation::{Error, Result};

pub struct StatusSnapshot {
    output_dir: PathBuf,
    target: String,
    interval_secs: i64,
    occurrences: i64,
    /// Set by `exit`; pending captures are abandoned
    stop: AtomicBool,
}

impl StatusSnapshot {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            target: String::new(),
            interval_secs: 0,
            occurrences: 0,
            stop: AtomicBool::new(false),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn stopped(&self, ctx: &TaskContext) -> bool {
        ctx.is_cancelled() || self.stop.load(Ordering::SeqCst)
    }

    /// Write one record and return its path
    fn capture(&self, ctx: &TaskContext, target: &str, nth: i64, total: i64) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let now = Local::now();
        let stem = format!("snapshot_{}", now.format("%Y%m%d_%H%M%S"));
        let mut path = self.output_dir.join(format!("{}.txt", stem));
        let mut suffix = 1;
        while path.exists() {
            path = self.output_dir.join(format!("{}_{}.txt", stem, suffix));
            suffix += 1;
        }

        let record = format!(
            "target: {}\ncaptured_at: {}\ntask: {}\noccurrence: {}/{}\n",
            target,
            now.to_rfc3339(),
            ctx.task_id(),
            nth,
            total
        );
        fs::write(&path, record)?;
        debug!("Wrote snapshot {}", path.display());
        Ok(path)
    }
}

impl Feature for StatusSnapshot {
    fn name(&self) -> &str {
        "Status Snapshot"
    }

    fn icon(&self) -> &str {
        "fas.camera"
    }

    fn init(&mut self) -> Result<()> {
        self.interval_secs = 60;
        self.occurrences = 1;
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir)?;
            info!("Created snapshot directory {}", self.output_dir.display());
        }
        Ok(())
    }

    fn main(&self, ctx: &TaskContext) -> Result<()> {
        let target = ctx.options().text_or("target", &self.target);
        let target = target.trim();
        let interval = ctx.options().int_or("interval", self.interval_secs)?;
        let occurrences = ctx.options().int_or("occurrences", self.occurrences)?;
        if interval < 0 {
            return Err(Error::invalid_option(
                "interval",
                format!("must not be negative, got {}", interval),
            ));
        }

        if target.is_empty() {
            ctx.println("No target selected.");
            return Ok(());
        }
        ctx.println(format!("Capturing status of: {}", target));

        for nth in 1..=occurrences {
            if self.stopped(ctx) {
                break;
            }
            let path = self.capture(ctx, target, nth, occurrences)?;
            ctx.println(format!("Snapshot saved: {}", path.display()));

            if nth < occurrences && !ctx.sleep(Duration::from_secs(interval as u64)) {
                break;
            }
        }
        Ok(())
    }

    fn exit(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn options(&self) -> OptionsForm {
        let widget = FormWidget::new(vec![
            OptionField::text("target", self.target.clone()).label("Target"),
            OptionField::integer("interval", self.interval_secs).label("Interval (seconds)"),
            OptionField::integer("occurrences", self.occurrences).label("Number of occurrences"),
        ])
        .with_notes(vec![format!(
            "Snapshots will be saved in: {}",
            self.output_dir.display()
        )]);
        OptionsForm::new(widget)
    }
}
