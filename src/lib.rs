//! Inspection and mutation engine for removable block-device mounts.
//!
//! The engine lists eligible mounts together with the processes holding
//! files open on them, reports the automount and Samba daemons, and runs
//! the privileged unmount / kill / restart operations behind validation.
//! Every external command goes through a [`host::Host`], so the same code
//! runs against the real system or against canned fixture output.

pub mod collectors;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod inventory;
pub mod models;
pub mod mutation;
pub mod status;
pub mod util;

pub use engine::Engine;
pub use error::{CommandError, InventoryError, MutationError, StatError};
pub use inventory::Inventory;
pub use models::{Mount, ServiceStatus, SystemSnapshot, Usage};
pub use mutation::MutationController;
