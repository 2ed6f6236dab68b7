//! # twirtee-task
//!
//! Running features as tasks:
//! - `console`: the Output Channel (ordered multi-producer console queue)
//! - `task`: task ids, the status machine and board events
//! - `supervisor`: thread-per-task execution with cooperative cancellation
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use twirtee_task::{ChannelSink, ConsoleBuffer, OutputChannel, TaskSupervisor};
//!
//! let buffer = Arc::new(ConsoleBuffer::new(config.console.max_lines));
//! let channel = OutputChannel::start(buffer.clone(), &config.console)?;
//! let supervisor = TaskSupervisor::new(Arc::new(ChannelSink::new(channel.clone())), config.tasks.clone());
//!
//! let feature = registry.require("Slow Task")?;
//! let id = supervisor.start_form(feature.clone(), &feature.options())?;
//! // ...on every tick of the presentation loop
//! for event in supervisor.reconcile() {
//!     board.apply(event);
//! }
//! ```

pub mod console;
pub mod supervisor;
pub mod task;

pub use console::{ChannelSink, ConsoleBuffer, ConsoleLine, OutputChannel, RenderSink};
pub use supervisor::TaskSupervisor;
pub use task::{Completion, TaskEvent, TaskId, TaskInfo, TaskOutcome, TaskStatus};
