//! Domain Services
//!
//! Stateless domain logic shared across the application layer.

mod fingerprint;
pub mod text;

pub use fingerprint::Fingerprint;
pub use text::{normalize_tags, truncate_chars};
