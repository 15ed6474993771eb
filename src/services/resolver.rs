//! The three resolution phases.
//!
//! ```text
//! ConfigState --lazy_init--> Initialized --read_config--> Configured --finalize_config--> ResolvedLayout
//! ```
//!
//! Each phase consumes the previous one, so phases cannot run out of order or twice.

use crate::config::{ConfigFile, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use crate::error::LayoutError;
use crate::models::{AppConfig, ResolvedLayout, ResolvedLogic};
use crate::services::discovery::{DirectoryLister, FsLister, discover_splits};
use crate::services::mapping::{build_file_map, materialize_output_dirs, output_splits};
use crate::state::StateManager;
use camino::{Utf8Path, Utf8PathBuf};

/// Entry point of the resolver for one app.
pub struct ConfigState<L = FsLister> {
    app_name: String,
    input_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    config_file: ConfigFile,
    lister: L,
}

impl ConfigState<FsLister> {
    /// Resolver over the container's default roots, `/mnt/input` and `/mnt/output`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self::with_roots(app_name, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR)
    }

    pub fn with_roots<I, O>(app_name: impl Into<String>, input_dir: I, output_dir: O) -> Self
    where
        I: AsRef<Utf8Path>,
        O: AsRef<Utf8Path>,
    {
        let input_dir = input_dir.as_ref().to_path_buf();
        Self {
            app_name: app_name.into(),
            config_file: ConfigFile::in_dir(&input_dir),
            input_dir,
            output_dir: output_dir.as_ref().to_path_buf(),
            lister: FsLister,
        }
    }
}

impl<L: DirectoryLister> ConfigState<L> {
    /// Swap the split lister, e.g. for a fake filesystem.
    pub fn with_lister<M: DirectoryLister>(self, lister: M) -> ConfigState<M> {
        ConfigState {
            app_name: self.app_name,
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            config_file: self.config_file,
            lister,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn config_file(&self) -> &Utf8Path {
        self.config_file.path()
    }

    /// Reset the shared lookup slots to their empty defaults.
    ///
    /// Performs no I/O and cannot fail.
    pub fn lazy_init(self, state: &StateManager) -> Initialized<L> {
        state.reset();
        tracing::debug!("Layout state initialized for app '{}'", self.app_name);
        Initialized { inner: self }
    }

    /// Run all three phases.
    pub fn resolve(self, state: &StateManager) -> Result<ResolvedLayout, LayoutError> {
        self.lazy_init(state).read_config(state)?.finalize_config(state)
    }
}

/// Shared state has been reset; the configuration has not been read yet.
pub struct Initialized<L = FsLister> {
    inner: ConfigState<L>,
}

impl<L: DirectoryLister> Initialized<L> {
    /// Read this app's section of `config.yml`.
    ///
    /// `debug: true` sets the shared debug flag, `debug: false` clears it and
    /// a missing key leaves it alone. Without a `logic` block the mode is
    /// `file` and the directory is `.`.
    ///
    /// On error the shared state is left exactly as [`ConfigState::lazy_init`] left it.
    pub fn read_config(self, state: &StateManager) -> Result<Configured<L>, LayoutError> {
        self.read_config_with(state, |_| {})
    }

    /// [`read_config`](Self::read_config) that calls `on_debug` as soon as the
    /// `debug` key is known, before the phase logs its diagnostics.
    ///
    /// Used to raise the log level so those diagnostics are not filtered out.
    pub fn read_config_with<F>(
        self,
        state: &StateManager,
        mut on_debug: F,
    ) -> Result<Configured<L>, LayoutError>
    where
        F: FnMut(bool),
    {
        let config = self.inner.config_file.load_app(&self.inner.app_name)?;

        if let Some(debug) = config.debug {
            state.set_debug(debug);
            on_debug(debug);
            if debug {
                tracing::debug!("Debug mode is ON");
            }
        }

        if config.logic.is_none() {
            tracing::debug!(
                "There are no 'logic' options in '{}', using defaults: mode: 'file', dir: '.'",
                self.inner.config_file.path()
            );
        }
        let logic = config.resolved_logic();
        tracing::info!(
            "App '{}' uses mode '{}' with dir '{}'",
            self.inner.app_name,
            logic.mode,
            logic.dir
        );

        Ok(Configured {
            inner: self.inner,
            config,
            logic,
        })
    }
}

/// Configuration has been read; splits are not resolved yet.
pub struct Configured<L = FsLister> {
    inner: ConfigState<L>,
    config: AppConfig,
    logic: ResolvedLogic,
}

impl<L: DirectoryLister> Configured<L> {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn logic(&self) -> &ResolvedLogic {
        &self.logic
    }

    /// Discover splits, build the file mappings, create the output tree and
    /// echo `config.yml` into the output root.
    ///
    /// Nothing is written to disk unless discovery and path mapping succeed,
    /// and nothing is published to `state` unless every step succeeds.
    pub fn finalize_config(self, state: &StateManager) -> Result<ResolvedLayout, LayoutError> {
        let Configured {
            inner,
            config,
            logic,
        } = self;

        let splits = discover_splits(&inner.lister, &inner.input_dir, &logic)?;
        let output_splits = output_splits(&splits, &inner.input_dir, &inner.output_dir)?;

        let input_files = build_file_map(&splits, &config.local_dataset);
        let output_files = build_file_map(&output_splits, &config.result);

        materialize_output_dirs(&output_splits)?;
        inner.config_file.echo_to(&inner.output_dir)?;

        let layout = ResolvedLayout {
            app_name: inner.app_name,
            input_dir: inner.input_dir,
            output_dir: inner.output_dir,
            logic,
            config,
            splits,
            output_splits,
            input_files,
            output_files,
            debug: state.read(|s| s.debug),
        };

        state.publish_layout(&layout);
        tracing::info!(
            "Layout finalized: {} split(s), {} input dataset(s), {} result(s)",
            layout.split_count(),
            layout.input_files.len(),
            layout.output_files.len()
        );

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::discovery::MockDirectoryLister;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, reload};

    /// Formatted log output shared with a test subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capturing_subscriber() -> (
        impl tracing::Subscriber + Send + Sync,
        reload::Handle<EnvFilter, Registry>,
        CapturedLogs,
    ) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        (subscriber, handle, logs)
    }

    struct Roots {
        _temp_dir: TempDir,
        input: Utf8PathBuf,
        output: Utf8PathBuf,
    }

    fn roots_with_config(contents: &str) -> Roots {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let input = base.join("input");
        let output = base.join("output");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("config.yml"), contents).unwrap();
        Roots {
            _temp_dir: temp_dir,
            input,
            output,
        }
    }

    #[test]
    fn test_read_config_sets_and_clears_debug() {
        let roots = roots_with_config("app:\n  debug: false\n  local_dataset: {}\n  result: {}\n");
        let state = StateManager::new();
        state.set_debug(true);

        ConfigState::with_roots("app", &roots.input, &roots.output)
            .lazy_init(&state)
            .read_config(&state)
            .unwrap();

        assert!(!state.read(|s| s.debug));
    }

    #[test]
    fn test_read_config_without_logic_defaults() {
        let roots = roots_with_config("app:\n  debug: true\n  local_dataset: {}\n  result: {}\n");
        let state = StateManager::new();

        let configured = ConfigState::with_roots("app", &roots.input, &roots.output)
            .lazy_init(&state)
            .read_config(&state)
            .unwrap();

        assert_eq!(configured.logic(), &ResolvedLogic::default());
        assert!(state.read(|s| s.debug));
    }

    #[test]
    fn test_missing_app_leaves_defaults() {
        let roots = roots_with_config("other:\n  debug: true\n");
        let state = StateManager::new();

        let result = ConfigState::with_roots("app", &roots.input, &roots.output)
            .lazy_init(&state)
            .read_config(&state);

        assert!(matches!(result, Err(LayoutError::ConfigMissing { .. })));
        assert_eq!(state.snapshot(), crate::models::LayoutState::default());
    }

    #[test]
    fn test_duplicate_listing_gives_unique_splits() {
        let roots = roots_with_config(
            "app:\n  logic:\n    mode: directory\n    dir: sites\n  local_dataset:\n    x: a.csv\n  result: {}\n",
        );
        let sites = roots.input.join("sites");
        let listed = vec![sites.join("s2"), sites.join("s1"), sites.join("s2")];

        let mut lister = MockDirectoryLister::new();
        lister
            .expect_list_dirs()
            .times(1)
            .returning(move |_| Ok(listed.clone()));

        let state = StateManager::new();
        let layout = ConfigState::with_roots("app", &roots.input, &roots.output)
            .with_lister(lister)
            .resolve(&state)
            .unwrap();

        assert_eq!(layout.splits, vec![sites.join("s1"), sites.join("s2")]);
        assert_eq!(
            layout.input_files("x").unwrap(),
            &[sites.join("s1/a.csv"), sites.join("s2/a.csv")]
        );
        assert!(roots.output.join("sites/s1").is_dir());
        assert!(roots.output.join("sites/s2").is_dir());
    }

    #[test]
    fn test_discovery_failure_creates_nothing() {
        let roots = roots_with_config(
            "app:\n  logic:\n    mode: directory\n    dir: missing\n  local_dataset: {}\n  result: {}\n",
        );
        let state = StateManager::new();

        let result = ConfigState::with_roots("app", &roots.input, &roots.output).resolve(&state);

        assert!(matches!(result, Err(LayoutError::SplitDiscovery { .. })));
        assert!(!roots.output.exists());
        assert!(!state.read(|s| s.is_finalized()));
    }

    #[test]
    fn test_debug_hook_runs_before_reader_diagnostics() {
        let roots = roots_with_config("app:\n  debug: true\n  local_dataset: {}\n  result: {}\n");
        let (subscriber, handle, logs) = capturing_subscriber();
        let state = StateManager::new();
        let mut hook_calls = Vec::new();

        tracing::subscriber::with_default(subscriber, || {
            ConfigState::with_roots("app", &roots.input, &roots.output)
                .lazy_init(&state)
                .read_config_with(&state, |debug| {
                    hook_calls.push(debug);
                    let level = if debug { "debug" } else { "info" };
                    handle.modify(|filter| *filter = EnvFilter::new(level)).unwrap();
                })
                .unwrap();
        });

        let output = logs.contents();
        assert_eq!(hook_calls, vec![true]);
        assert!(output.contains("Debug mode is ON"), "missing debug notice:\n{}", output);
        assert!(
            output.contains("There are no 'logic' options"),
            "missing defaulting notice:\n{}",
            output
        );
        // Logged at debug level before the hook raised the level
        assert!(!output.contains("Layout state initialized"));
    }

    #[test]
    fn test_debug_hook_not_called_without_debug_key() {
        let roots = roots_with_config("app:\n  local_dataset: {}\n  result: {}\n");
        let state = StateManager::new();
        let mut called = false;

        ConfigState::with_roots("app", &roots.input, &roots.output)
            .lazy_init(&state)
            .read_config_with(&state, |_| called = true)
            .unwrap();

        assert!(!called);
    }

    #[test]
    fn test_logged_split_order_matches_file_lists() {
        let roots = roots_with_config(
            "app:\n  logic:\n    mode: directory\n    dir: sites\n  local_dataset:\n    x: a.csv\n  result:\n    y: b.csv\n",
        );
        let sites = roots.input.join("sites");
        let listed = vec![sites.join("s3"), sites.join("s1"), sites.join("s2")];

        let mut lister = MockDirectoryLister::new();
        lister
            .expect_list_dirs()
            .returning(move |_| Ok(listed.clone()));

        let (subscriber, _handle, logs) = capturing_subscriber();
        let state = StateManager::new();

        let layout = tracing::subscriber::with_default(subscriber, || {
            ConfigState::with_roots("app", &roots.input, &roots.output)
                .with_lister(lister)
                .resolve(&state)
                .unwrap()
        });

        let logged: Vec<Utf8PathBuf> = logs
            .contents()
            .lines()
            .filter_map(|line| line.split_once("Split ").map(|(_, rest)| rest))
            .filter_map(|rest| rest.split_once(": ").map(|(_, path)| Utf8PathBuf::from(path.trim())))
            .collect();

        assert_eq!(logged, layout.splits);
        for (i, split) in logged.iter().enumerate() {
            let relative = split.strip_prefix(&roots.input).unwrap();
            assert_eq!(layout.input_files["x"][i], split.join("a.csv"));
            assert_eq!(
                layout.output_files["y"][i],
                roots.output.join(relative).join("b.csv")
            );
        }
    }
}
