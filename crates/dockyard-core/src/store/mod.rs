//! Store drivers for application records
//!
//! The relational store of the original system is an external collaborator;
//! this module defines its boundary plus two drivers:
//! - **Memory**: in-memory records with operation counters (tests)
//! - **File**: one JSON document per record under a base directory (CLI)

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreCounts};

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::{ApplicationSpec, NewApplication};
use crate::error::Result;

/// Persistence boundary for application records
///
/// Implementations must be Send + Sync for use across async tasks and must
/// enforce name uniqueness at create time.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Create a record from a request, failing with `NameTaken` on duplicates
    async fn create(&self, request: NewApplication) -> Result<ApplicationSpec>;

    /// Update an existing record, failing with `ApplicationNotFound`
    async fn update(&self, id: Uuid, request: NewApplication) -> Result<ApplicationSpec>;

    /// Get a record by id, failing with `ApplicationNotFound`
    async fn get(&self, id: Uuid) -> Result<ApplicationSpec>;

    /// List every stored record
    async fn list(&self) -> Result<Vec<ApplicationSpec>>;

    /// Delete a record, failing with `ApplicationNotFound`
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Check whether a record with the given name exists
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}
