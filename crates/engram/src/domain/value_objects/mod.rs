//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod memory_kind;
mod search_mode;
mod source_tool;

pub use memory_kind::*;
pub use search_mode::*;
pub use source_tool::*;
