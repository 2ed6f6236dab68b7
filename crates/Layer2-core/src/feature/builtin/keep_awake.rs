//! Keep Awake - periodic heartbeat until stopped

use crate::feature::{Feature, FormWidget, OptionField, OptionsForm, TaskContext};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use twirtee_foundation::{Error, Result};

const DEFAULT_INTERVAL_SECS: i64 = 30;

#[derive(Default)]
pub struct KeepAwake {
    message: String,
    interval_secs: i64,
    /// Set by `exit`; running heartbeats end at their next beat
    retired: AtomicBool,
}

impl Feature for KeepAwake {
    fn name(&self) -> &str {
        "Keep Awake"
    }

    fn icon(&self) -> &str {
        "coffee"
    }

    fn init(&mut self) -> Result<()> {
        self.message = "Keep awake!".to_string();
        self.interval_secs = DEFAULT_INTERVAL_SECS;
        Ok(())
    }

    fn main(&self, ctx: &TaskContext) -> Result<()> {
        let message = ctx.options().text_or("message", &self.message);
        let interval = ctx.options().int_or("interval", self.interval_secs)?;
        if interval <= 0 {
            return Err(Error::invalid_option(
                "interval",
                format!("must be at least 1 second, got {}", interval),
            ));
        }

        ctx.println(message);
        ctx.println(format!(
            "Started at : {} / {}s",
            Local::now().format("%a %b %e %H:%M:%S %Y"),
            interval
        ));

        let mut beats: i64 = 0;
        loop {
            ctx.println(format!("ONGOING \t\t: {}", format_elapsed(interval * beats)));
            if self.retired.load(Ordering::SeqCst) {
                break;
            }
            if !ctx.sleep(Duration::from_secs(interval as u64)) {
                break;
            }
            beats += 1;
            debug!("Task {} heartbeat {}", ctx.task_id(), beats);
        }
        Ok(())
    }

    fn exit(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::new(FormWidget::new(vec![
            OptionField::text("message", self.message.clone()).label("Message"),
            OptionField::integer("interval", self.interval_secs).label("Interval (seconds)"),
        ]))
    }
}

/// `h:mm` for a number of seconds
fn format_elapsed(secs: i64) -> String {
    let minutes = secs / 60;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}
