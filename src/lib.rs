mod binding;
mod entry;
mod error;
mod frame;
mod info;
mod lock;
mod registry;
mod report;
mod store;
mod trail;
pub mod wrap;

pub use entry::Entry;
pub use error::{QueueError, Result};
pub use frame::Frame;
pub use info::QueueInfo;
pub use lock::{LockDirector, QueueGuard, QueueLock};
pub use registry::{Eviction, Registry, RegistryBuilder, RegistryConfig, DEFAULT_MAX_SIZE};
pub use store::{Fields, Store, StoreHandle, StoreId};
pub use trail::Trail;
