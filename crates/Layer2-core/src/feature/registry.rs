//! Feature Registry - discovery and lookup by name

use super::traits::Feature;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use twirtee_foundation::{panic_message, Error, FeaturesConfig, Result};

/// Settings every feature unit may read while being built
#[derive(Debug, Clone)]
pub struct FeatureEnv {
    /// Where features write the files they produce
    pub output_dir: PathBuf,
}

impl Default for FeatureEnv {
    fn default() -> Self {
        Self::from(&FeaturesConfig::default())
    }
}

impl From<&FeaturesConfig> for FeatureEnv {
    fn from(config: &FeaturesConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
        }
    }
}

/// One discoverable feature unit
#[derive(Clone, Copy)]
pub struct FeatureUnit {
    /// Unit name used in diagnostics
    pub unit: &'static str,
    /// Constructor; the registry calls `init` on the result
    pub build: fn(&FeatureEnv) -> Result<Box<dyn Feature>>,
}

impl std::fmt::Debug for FeatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureUnit").field("unit", &self.unit).finish()
    }
}

/// A unit that failed to produce a feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryError {
    pub unit: String,
    pub message: String,
}

/// Outcome of a discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Units that produced a registered feature, in discovery order
    pub loaded: Vec<String>,
    /// Units skipped because construction or init failed
    pub errors: Vec<DiscoveryError>,
    /// Feature names registered more than once; the last unit won
    pub replaced: Vec<String>,
}

/// Feature registry
///
/// Built once at startup and read-only afterwards, so lookups need no lock.
pub struct FeatureRegistry {
    features: HashMap<String, Arc<dyn Feature>>,
    /// Names in discovery order
    order: Vec<String>,
    report: DiscoveryReport,
    exited: AtomicBool,
}

impl FeatureRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            features: HashMap::new(),
            order: Vec::new(),
            report: DiscoveryReport::default(),
            exited: AtomicBool::new(false),
        }
    }

    /// Build and init every unit, skipping the ones that fail
    ///
    /// A failing unit is logged and recorded in the report; it never aborts
    /// the pass. When two units produce the same name the later one replaces
    /// the earlier.
    pub fn discover(units: &[FeatureUnit], env: &FeatureEnv) -> Self {
        let mut registry = Self::new();

        for unit in units {
            match load_unit(unit, env) {
                Ok(feature) => {
                    registry.report.loaded.push(unit.unit.to_string());
                    registry.insert(Arc::from(feature));
                }
                Err(e) => {
                    error!("Skipping feature unit {}: {}", unit.unit, e);
                    let message = match e {
                        Error::Discovery { message, .. } => message,
                        other => other.to_string(),
                    };
                    registry.report.errors.push(DiscoveryError {
                        unit: unit.unit.to_string(),
                        message,
                    });
                }
            }
        }

        info!(
            "Discovered {} feature(s), {} unit(s) failed",
            registry.len(),
            registry.report.errors.len()
        );
        registry
    }

    /// Register an already-initialized feature
    pub fn insert(&mut self, feature: Arc<dyn Feature>) {
        let name = feature.name().to_string();
        if self.features.contains_key(&name) {
            warn!("Feature '{}' registered twice; the later one wins", name);
            self.order.retain(|n| n != &name);
            self.report.replaced.push(name.clone());
        }
        debug!("Registered feature: {}", name);
        self.order.push(name.clone());
        self.features.insert(name, feature);
    }

    /// Feature by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Feature>> {
        self.features.get(name).cloned()
    }

    /// Feature by name, or `FeatureNotFound`
    pub fn require(&self, name: &str) -> Result<Arc<dyn Feature>> {
        self.get(name)
            .ok_or_else(|| Error::FeatureNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Names in discovery order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Features in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Feature>> {
        self.order.iter().filter_map(|name| self.features.get(name))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn report(&self) -> &DiscoveryReport {
        &self.report
    }

    /// Call `exit` on every feature, once
    ///
    /// Later calls do nothing. A panicking `exit` is logged and does not stop
    /// the others.
    pub fn exit_all(&self) {
        if self.exited.swap(true, Ordering::SeqCst) {
            return;
        }
        for feature in self.iter() {
            let name = feature.name().to_string();
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| feature.exit())) {
                error!("Feature '{}' exit failed: {}", name, panic_message(payload.as_ref()));
            } else {
                debug!("Feature '{}' exited", name);
            }
        }
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build one unit and run its `init`
fn load_unit(unit: &FeatureUnit, env: &FeatureEnv) -> Result<Box<dyn Feature>> {
    let mut feature = catch_unwind(AssertUnwindSafe(|| (unit.build)(env)))
        .map_err(|payload| Error::discovery(unit.unit, panic_message(payload.as_ref())))??;

    catch_unwind(AssertUnwindSafe(|| feature.init()))
        .map_err(|payload| Error::discovery(unit.unit, panic_message(payload.as_ref())))??;

    if feature.name().trim().is_empty() {
        return Err(Error::discovery(unit.unit, "feature has an empty name"));
    }
    Ok(feature)
}
