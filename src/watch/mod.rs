//! Watch tracking for curriculum and explore video content.

pub mod store;
pub mod tracker;
pub mod types;

pub use store::WatchStore;
pub use tracker::WatchTracker;
pub use types::{WatchContext, WatchRecord, WatchStatus, WatchUpdate};
