//! IPFS Rent File Registry
//!
//! Tracks metadata for files whose bytes live elsewhere (IPFS or any other
//! content-addressed store). Each content hash maps to at most one record,
//! and only the actor that uploaded a record may delete it.

pub mod config;
pub mod errors;
pub mod registry;
pub mod store;
pub mod types;

pub use config::{AccessCounting, RegistryConfig};
pub use errors::*;
pub use registry::FileRegistry;
pub use store::{FileStore, MemoryFileStore, SledFileStore};
pub use types::*;
