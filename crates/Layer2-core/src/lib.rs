//! twirtee-core: feature plugins
//!
//! Layer2 - the feature contract and everything that produces features
//!
//! # Modules
//!
//! - `feature::traits`: the `Feature` contract and the `TaskContext` a task body receives
//! - `feature::form`: `OptionsForm` (display handle + late-bound values getter)
//! - `feature::registry`: explicit-unit discovery and name index
//! - `feature::builtin`: the features shipped with the panel
//!
//! # Example
//!
//! ```ignore
//! use twirtee_core::{builtin, FeatureEnv, FeatureRegistry};
//!
//! let registry = FeatureRegistry::discover(&builtin::units(), &FeatureEnv::default());
//! for feature in registry.iter() {
//!     println!("{} ({})", feature.name(), feature.icon());
//! }
//! ```

pub mod feature;

pub use feature::builtin;
pub use feature::{
    DiscoveryError, DiscoveryReport, Feature, FeatureEnv, FeatureRegistry, FeatureUnit,
    FormWidget, OptionField, OptionsForm, TaskContext,
};
