//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - MemoryEntry: Durable unit of knowledge
//! - ClassificationResult: Transient classifier verdict
//! - AdmissionConfig: Gate tunables
//! - SearchResults / StoreStats: Store answers

mod admission_config;
mod classification;
mod memory;
mod search;

pub use admission_config::*;
pub use classification::*;
pub use memory::*;
pub use search::*;
