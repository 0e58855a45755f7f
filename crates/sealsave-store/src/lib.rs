//! Save/load entry points for Sealsave.
//! Resolves a serializer and a file path, then delegates; batch operations
//! isolate per-record failures in a [`BatchReport`].

pub mod paths;
pub mod report;
pub mod save_system;

pub use paths::FILE_EXTENSION;
pub use report::{BatchItem, BatchReport};
pub use save_system::SaveSystem;
