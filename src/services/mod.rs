//! Services module - split discovery, path mapping and the resolution phases.
//!
//! # Components
//!
//! - [`discovery`]: Finds split directories behind the [`DirectoryLister`] seam and fixes their order
//! - [`mapping`]: Turns splits into input/output file lists and creates the output tree
//! - [`resolver`]: [`ConfigState`] and its typestate phases, Initializer → Reader → Finalizer
//!
//! # Usage Example
//!
//! ```ignore
//! use splitlayout::{ConfigState, StateManager};
//!
//! let state = StateManager::new();
//! let layout = ConfigState::new("fc_app").resolve(&state)?;
//!
//! for (i, input) in layout.input_files("data").unwrap().iter().enumerate() {
//!     println!("split {i}: {input}");
//! }
//! ```

pub mod discovery;
pub mod mapping;
pub mod resolver;

pub use discovery::{DirectoryLister, FsLister, discover_splits};
pub use resolver::{ConfigState, Configured, Initialized};
