//! # Feature System
//!
//! A feature is a named unit of work the panel can run as a task.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                FeatureRegistry                │
//! │  FeatureUnit ─build─► init ─► index by name   │
//! │  ┌──────────┬───────────┬──────────────────┐  │
//! │  │ Hello    │ Slow Task │ Status Snapshot  │  │
//! │  └──────────┴───────────┴──────────────────┘  │
//! └───────────────────────┬───────────────────────┘
//!                         │ Arc<dyn Feature>
//!                         ▼
//!             TaskSupervisor::start(feature, values)
//! ```
//!
//! Adding a feature means implementing [`Feature`] and listing a
//! [`FeatureUnit`] in [`builtin::units`].

pub mod builtin;
mod form;
mod registry;
mod traits;

pub use form::{FormWidget, OptionField, OptionsForm, ValuesGetter};
pub use registry::{DiscoveryError, DiscoveryReport, FeatureEnv, FeatureRegistry, FeatureUnit};
pub use traits::{Feature, TaskContext};
