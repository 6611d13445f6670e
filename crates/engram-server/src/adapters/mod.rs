//! Infrastructure Adapters
//!
//! Implementations of the engram ports for external systems.

pub mod anthropic;
pub mod brain_http;

// Re-exports
pub use anthropic::AnthropicClassifier;
pub use brain_http::HttpMemoryStore;
