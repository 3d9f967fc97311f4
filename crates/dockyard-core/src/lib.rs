//! Dockyard Core - Core types for the application deployer
//!
//! This crate provides the foundational types used throughout Dockyard:
//! - `ApplicationSpec`: The stored declarative application record
//! - `ApplicationStore`: Persistence collaborator boundary with drivers
//! - `env_pairs`: Environment-variable mapping for container injection

pub mod application;
pub mod env;
pub mod error;
pub mod store;

pub use application::{ApplicationSpec, NewApplication, ResourceSizing};
pub use env::env_pairs;
pub use error::{CoreError, Result};
pub use store::{ApplicationStore, FileStore, MemoryStore, StoreCounts};
