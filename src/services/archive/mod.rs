//! Packed-container support: a reader collaborator per format and a
//! run-scoped, build-once index on top of it.

mod backend;
mod index;
mod types;

// Re-export public API
pub use backend::{ArchiveBackend, ArchiveReader, DefaultBackend};
pub use index::{ArchiveContainer, ArchiveIndex};
pub use types::{ArchiveFormat, ContainerSummary, EntryHandle};

#[cfg(test)]
#[path = "tests/archive_tests.rs"]
mod tests;
