//! Slow Task - numbered steps with a cancellable delay between them

use crate::feature::{Feature, FormWidget, OptionField, OptionsForm, TaskContext};
use std::time::Duration;
use twirtee_foundation::{Error, Result};

#[derive(Default)]
pub struct SlowTask {
    iterations: i64,
    delay: f64,
}

impl Feature for SlowTask {
    fn name(&self) -> &str {
        "Slow Task"
    }

    fn icon(&self) -> &str {
        "time"
    }

    fn init(&mut self) -> Result<()> {
        self.iterations = 60;
        self.delay = 60.0;
        Ok(())
    }

    fn main(&self, ctx: &TaskContext) -> Result<()> {
        let iterations = ctx.options().int_or("iterations", self.iterations)?;
        let delay = ctx.options().float_or("delay", self.delay)?;
        if !delay.is_finite() || delay < 0.0 {
            return Err(Error::invalid_option(
                "delay",
                format!("must be a non-negative number, got {}", delay),
            ));
        }
        let delay = Duration::try_from_secs_f64(delay).map_err(|e| {
            Error::invalid_option("delay", format!("{} is out of range: {}", delay, e))
        })?;

        for i in 0..iterations.max(0) {
            if ctx.is_cancelled() {
                return Ok(());
            }
            ctx.println(format!("Step {}/{}", i + 1, iterations));
            if !ctx.sleep(delay) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::new(FormWidget::new(vec![
            OptionField::integer("iterations", self.iterations).label("Iterations"),
            OptionField::float("delay", self.delay).label("Delay (seconds)"),
        ]))
    }
}
