//! Built-in features
//!
//! | Feature         | Icon          | What it does                                   |
//! |-----------------|---------------|------------------------------------------------|
//! | Hello World     | `chat-bubble` | prints a message                               |
//! | Slow Task       | `time`        | prints `Step i/n` with a cancellable delay     |
//! | Keep Awake      | `coffee`      | heartbeat every interval until stopped         |
//! | Status Snapshot | `fas.camera`  | writes timestamped status files to `output_dir`|

mod hello_world;
mod keep_awake;
mod slow_task;
mod status_snapshot;

pub use hello_world::HelloWorld;
pub use keep_awake::KeepAwake;
pub use slow_task::SlowTask;
pub use status_snapshot::StatusSnapshot;

use super::registry::FeatureUnit;

/// Every feature unit shipped with the panel, in display order
pub fn units() -> Vec<FeatureUnit> {
    vec![
        FeatureUnit {
            unit: "hello_world",
            build: |_| Ok(Box::new(HelloWorld::default())),
        },
        FeatureUnit {
            unit: "slow_task",
            build: |_| Ok(Box::new(SlowTask::default())),
        },
        FeatureUnit {
            unit: "keep_awake",
            build: |_| Ok(Box::new(KeepAwake::default())),
        },
        FeatureUnit {
            unit: "status_snapshot",
            build: |env| Ok(Box::new(StatusSnapshot::new(env.output_dir.clone()))),
        },
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::feature::TaskContext;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use twirtee_foundation::{CancellationToken, OptionValues, OutputSink};

    #[derive(Default)]
    pub struct Collect(pub Mutex<Vec<String>>);

    impl OutputSink for Collect {
        fn emit(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    impl Collect {
        pub fn lines(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    pub fn context(options: OptionValues) -> (TaskContext, Arc<Collect>, CancellationToken) {
        let out = Arc::new(Collect::default());
        let token = CancellationToken::new();
        let ctx = TaskContext::new(1, options, token.clone(), out.clone());
        (ctx, out, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureEnv, FeatureRegistry};

    #[test]
    fn test_builtin_units_all_load() {
        let dir = tempfile::tempdir().unwrap();
        let env = FeatureEnv {
            output_dir: dir.path().join("snapshots"),
        };
        let registry = FeatureRegistry::discover(&units(), &env);

        assert!(registry.report().errors.is_empty());
        assert_eq!(
            registry.names(),
            vec!["Hello World", "Slow Task", "Keep Awake", "Status Snapshot"]
        );
        assert!(env.output_dir.is_dir());
    }
}
