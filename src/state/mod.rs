// State management module
//
// This module provides the StateManager which holds the shared layout slots
// behind Arc<RwLock<T>> and emits change events for the host and later stages.

use crate::models::{LayoutState, ResolvedLayout};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the shared layout state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Lookup slots went back to their empty defaults
    StateReset,

    /// The debug flag was set or cleared
    DebugChanged { enabled: bool },

    /// The split list was published
    SplitsResolved { count: usize },

    /// Input and output file mappings were published
    FilesResolved {
        input_datasets: usize,
        output_datasets: usize,
    },

    /// Downstream logic declared that SMPC was used
    SmpcUsed,
}

/// Shared layout state with event emission.
///
/// The host creates one `StateManager` per process and hands it to the
/// resolver phases. After [`publish_layout`](Self::publish_layout) the
/// layout slots are only read.
///
/// - [`read()`](Self::read) / [`snapshot()`](Self::snapshot) for reading
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to changes
pub struct StateManager {
    state: Arc<RwLock<LayoutState>>,

    /// Multiple subscribers can listen for state changes
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(LayoutState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> LayoutState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let splits = state_manager.read(|state| state.splits.len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&LayoutState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Applies `update_fn`, diffs the result against the previous state and
    /// broadcasts one event per changed concern. Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut LayoutState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &LayoutState, new: &LayoutState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.debug != new.debug {
            changes.push(StateChange::DebugChanged { enabled: new.debug });
        }

        if old.splits != new.splits {
            changes.push(StateChange::SplitsResolved {
                count: new.splits.len(),
            });
        }

        if old.input_files != new.input_files || old.output_files != new.output_files {
            changes.push(StateChange::FilesResolved {
                input_datasets: new.input_files.len(),
                output_datasets: new.output_files.len(),
            });
        }

        if !old.smpc_used && new.smpc_used {
            changes.push(StateChange::SmpcUsed);
        }

        changes
    }

    /// Put the lookup slots back to their empty defaults. `debug` is kept.
    ///
    /// Always broadcasts [`StateChange::StateReset`], even when the state
    /// already was empty, so listeners see the Initializer run.
    pub fn reset(&self) -> Vec<StateChange> {
        let mut state = self.state.write().unwrap();
        *state = LayoutState {
            debug: state.debug,
            ..LayoutState::default()
        };

        let _ = self.state_tx.send(StateChange::StateReset);
        vec![StateChange::StateReset]
    }

    pub fn set_debug(&self, enabled: bool) -> Vec<StateChange> {
        self.update(|state| state.debug = enabled)
    }

    /// Publish the Finalizer's splits and file mappings.
    pub fn publish_layout(&self, layout: &ResolvedLayout) -> Vec<StateChange> {
        self.update(|state| {
            state.splits = layout.splits.clone();
            state.input_files = layout.input_files.clone();
            state.output_files = layout.output_files.clone();
        })
    }

    pub fn mark_smpc_used(&self) -> Vec<StateChange> {
        self.update(|state| state.smpc_used = true)
    }

    pub fn state_arc(&self) -> Arc<RwLock<LayoutState>> {
        Arc::clone(&self.state)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
