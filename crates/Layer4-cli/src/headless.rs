//! Non-interactive commands: `list` and `run`

use anyhow::{bail, Context};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};
use twirtee_core::{builtin, FeatureEnv, FeatureRegistry};
use twirtee_foundation::{OutputSink, PanelConfig, TeeSink};
use twirtee_task::{ChannelSink, ConsoleBuffer, OutputChannel, TaskStatus, TaskSupervisor};

/// How often the run loop reconciles
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
struct FeatureListing {
    name: String,
    icon: String,
    options: BTreeMap<String, OptionListing>,
}

#[derive(Debug, Serialize)]
struct OptionListing {
    kind: &'static str,
    default: String,
}

fn discover(config: &PanelConfig) -> FeatureRegistry {
    FeatureRegistry::discover(&builtin::units(), &FeatureEnv::from(&config.features))
}

/// Print the discovered features
pub fn list(config: &PanelConfig, json: bool) -> anyhow::Result<()> {
    let registry = discover(config);
    let listings: Vec<FeatureListing> = registry
        .iter()
        .map(|feature| {
            let form = feature.options();
            let options = form
                .widget()
                .fields()
                .iter()
                .map(|f| {
                    (
                        f.key.clone(),
                        OptionListing {
                            kind: f.kind.as_str(),
                            default: f.default.clone(),
                        },
                    )
                })
                .collect();
            FeatureListing {
                name: feature.name().to_string(),
                icon: feature.icon().to_string(),
                options,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
    } else {
        println!("\n{}\n", config.title());
        println!("{:<20} {:<14} {}", "Feature", "Icon", "Options");
        println!("{}", "-".repeat(72));
        for listing in &listings {
            let options = listing
                .options
                .iter()
                .map(|(key, opt)| format!("{}={}", key, opt.default))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{:<20} {:<14} {}", listing.name, listing.icon, options);
        }
        for failed in &registry.report().errors {
            println!("\n(unit '{}' failed to load: {})", failed.unit, failed.message);
        }
        println!();
    }

    registry.exit_all();
    Ok(())
}

/// Split `key=value`
pub fn parse_assignment(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty option name in '{}'", raw);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run one feature to completion
///
/// Ctrl-C (or the timeout) requests a cooperative stop; a second Ctrl-C
/// gives up waiting.
pub async fn run(
    config: &PanelConfig,
    feature_name: &str,
    assignments: &[String],
    timeout: Option<Duration>,
) -> anyhow::Result<u8> {
    let registry = discover(config);
    let feature = registry.require(feature_name)?;

    let form = feature.options();
    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        form.widget()
            .set(&key, value)
            .with_context(|| format!("{} has no option '{}'", feature_name, key))?;
    }

    let buffer = Arc::new(ConsoleBuffer::new(config.console.max_lines));
    let channel = OutputChannel::start(buffer, &config.console)?;
    let mut sink: Arc<dyn OutputSink> = Arc::new(ChannelSink::new(channel.clone()));
    if config.console.mirror_stdout {
        sink = Arc::new(TeeSink::stdout(sink));
    }
    let supervisor = TaskSupervisor::new(sink, config.tasks.clone());

    let id = match supervisor.start_form(feature, &form) {
        Ok(id) => id,
        Err(e) => {
            channel.stop();
            registry.exit_all();
            return Err(e.into());
        }
    };

    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    let interrupts = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_tx.send(()).is_err() {
                break;
            }
        }
    });

    let started = Instant::now();
    let mut stop_requested = false;
    let status = loop {
        tokio::select! {
            Some(()) = interrupt_rx.recv() => {
                if stop_requested {
                    warn!("Second interrupt, no longer waiting for task {}", id);
                    break supervisor.status(id).unwrap_or(TaskStatus::Error);
                }
                info!("Interrupted, stopping task {}", id);
                supervisor.stop(id);
                stop_requested = true;
            }
            _ = tokio::time::sleep(TICK) => {}
        }

        supervisor.reconcile();
        match supervisor.status(id) {
            Some(status) if status.is_terminal() => break status,
            Some(_) => {}
            None => break TaskStatus::Error,
        }

        if let Some(limit) = timeout {
            if !stop_requested && started.elapsed() >= limit {
                warn!("Task {} timed out after {:?}, stopping", id, limit);
                supervisor.stop(id);
                stop_requested = true;
            }
        }
    };
    interrupts.abort();

    supervisor.shutdown(config.tasks.shutdown_grace());
    registry.exit_all();
    channel.stop();

    Ok(exit_code(status))
}

/// 0 for Completed or Stopped, 1 otherwise
fn exit_code(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Completed | TaskStatus::Stopped => 0,
        _ => 1,
    }
}
