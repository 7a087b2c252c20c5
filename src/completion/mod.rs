//! Content completion policy: per-kind completion predicates.

pub mod policy;

pub use policy::{CompletionSignal, ContentCompletionPolicy, ModerationLookup};
