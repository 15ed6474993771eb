//! Data models for the layout resolver.
//!
//! - [`AppConfig`]: One app's section of `config.yml`, with [`LogicConfig`] and [`SplitMode`]
//! - [`ResolvedLogic`]: Split mode and directory after defaulting
//! - [`LayoutState`]: The shared slots held by [`StateManager`](crate::state::StateManager)
//! - [`ResolvedLayout`]: The finalized layout returned to the caller

pub mod config;
pub mod layout;

pub use config::{AppConfig, LogicConfig, ResolvedLogic, SplitMode};
pub use layout::{LayoutState, ResolvedLayout};
