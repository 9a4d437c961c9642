//! High-level operations.
//!
//! This module contains the implementation of ern commands.

pub mod cauldron_sync;
pub mod list_dependencies;
pub mod mini_app;

pub use cauldron_sync::{get_app, sync_container, SyncOptions, SyncResult};
pub use list_dependencies::{list_dependencies, ListTarget};
pub use mini_app::{add_to_mini_app, upgrade_mini_app, AddOptions};
