//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod memory_store;

pub use memory_store::*;
