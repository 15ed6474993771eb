// splitlayout - configuration and data-split layout resolver
//
// This is the library crate holding the three resolution phases and the
// shared layout state. The binary crate (main.rs) runs them once for one app.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{CONFIG_FILE_NAME, ConfigFile, Settings};
pub use error::LayoutError;
pub use models::{AppConfig, LayoutState, LogicConfig, ResolvedLayout, ResolvedLogic, SplitMode};
pub use services::{ConfigState, DirectoryLister, FsLister};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
