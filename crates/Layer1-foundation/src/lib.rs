//! # twirtee-foundation
//!
//! Foundation layer for TwirTee:
//! - Error: the shared error taxonomy (discovery, option resolution, task control)
//! - Config: `PanelConfig` loaded from TOML with environment overrides
//! - Options: typed option values handed from option forms to features
//! - Cancel: the cooperative `CancellationToken` every task body polls
//! - Output: the `OutputSink` seam and the stdout-mirroring `TeeSink`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Presentation (TUI / headless)                          │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  FeatureRegistry ──► TaskSupervisor ──► worker threads  │
//! │                     │                     │             │
//! │                     ▼                     ▼             │
//! │           CancellationToken         OutputSink ──► Tee  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod options;
pub mod output;

// ============================================================================
// Error
// ============================================================================
pub use error::{panic_message, Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{ConsoleConfig, FeaturesConfig, PanelConfig, Phase, TasksConfig, ThemeName};

// ============================================================================
// Task primitives
// ============================================================================
pub use cancel::CancellationToken;
pub use options::{OptionKind, OptionValue, OptionValues};
pub use output::{NullSink, OutputSink, SinkWriter, TeeSink};
