//! splitlayout - resolve an app's data splits and prepare its output tree.
//!
//! Runs the three resolution phases once for the app named on the command line:
//!
//! 1. Initialize logging (console and/or daily rotating file)
//! 2. Reset the shared layout state
//! 3. Read the app's section of `{input_dir}/config.yml`
//! 4. Discover splits, map input/output files, create output directories
//!    and copy `config.yml` to `{output_dir}/config.yml`
//!
//! Settings come from defaults, `SPLITLAYOUT_*` environment variables and
//! the flags below, later sources winning.

use anyhow::Result;
use clap::Parser;
use splitlayout::config::settings::SettingsOverrides;
use splitlayout::logging::{LoggingOptions, setup_logging};
use splitlayout::{APP_NAME, ConfigState, Settings, StateManager, VERSION};

#[derive(Parser, Debug)]
#[command(name = "splitlayout", version, about = "Resolve data splits for a sandboxed app")]
struct Cli {
    /// Name of the app section in config.yml
    app_name: Option<String>,

    /// Input root holding config.yml and the data splits
    #[arg(long)]
    input_dir: Option<String>,

    /// Output root mirroring the split structure
    #[arg(long)]
    output_dir: Option<String>,

    /// Directory for rotating log files
    #[arg(long)]
    log_dir: Option<String>,

    /// Log to stderr
    #[arg(long)]
    console: bool,

    /// Log to stderr as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(self) -> SettingsOverrides {
        SettingsOverrides {
            app_name: self.app_name,
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            log_dir: self.log_dir,
            // Flags only override when given
            console: (self.console || self.json).then_some(true),
            json: self.json.then_some(true),
        }
    }
}

fn main() -> Result<()> {
    let settings = Settings::load(Cli::parse().overrides())?;

    let logging = setup_logging(&LoggingOptions {
        log_dir: settings.log_dir.clone(),
        log_prefix: APP_NAME.to_string(),
        debug_mode: false,
        console_output: settings.console,
        json_console: settings.json,
    })?;

    tracing::info!("Starting {} v{} for app '{}'", APP_NAME, VERSION, settings.app_name);

    let state = StateManager::new();
    let resolver = ConfigState::with_roots(
        settings.app_name.as_str(),
        &settings.input_dir,
        &settings.output_dir,
    );

    let configured = resolver
        .lazy_init(&state)
        .read_config_with(&state, |debug| {
            if let Err(e) = logging.set_debug(debug) {
                tracing::warn!("{:#}", e);
            }
        })?;

    let layout = configured.finalize_config(&state)?;

    for (name, files) in &layout.input_files {
        tracing::info!("Input '{}': {} file(s)", name, files.len());
    }
    for (name, files) in &layout.output_files {
        tracing::info!("Result '{}': {} file(s)", name, files.len());
    }
    tracing::info!("Config echoed to {}", layout.config_echo_path());

    Ok(())
}
