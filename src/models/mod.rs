pub mod mount;
pub mod service;
pub mod snapshot;

pub use mount::{Mount, Usage};
pub use service::ServiceStatus;
pub use snapshot::SystemSnapshot;
