//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod advise;
pub mod chat;
pub mod health;
pub mod identify;
pub mod summary;

// Re-export all handlers for use in router
pub use advise::*;
pub use chat::*;
pub use health::*;
pub use identify::*;
pub use summary::*;
