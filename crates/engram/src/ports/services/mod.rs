//! Service Ports
//!
//! Abstract interfaces for external services.

mod classifier;

pub use classifier::*;
