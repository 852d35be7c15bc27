//! Storage seam shared by the repository traits.
//!
//! The persistent store is the only shared mutable resource in the
//! system; every conditional update a repository trait promises must be
//! applied atomically by the implementation. The bundled in-memory
//! store serializes writes behind a mutex; a document-database
//! implementation would lean on conditional update primitives instead.

pub mod memory;

pub use memory::{InMemoryDonationStore, InMemoryNgoStore, InMemoryVolunteerStore};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record state conflict")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
