//! URL handling module for Weft
//!
//! This module provides network-location extraction, fragment stripping, and
//! the allowed-domain scope set used for link filtering.

mod netloc;
mod scope;

// Re-export main items
pub use netloc::{defragment, netloc};
pub use scope::ScopeSet;
