//! Utilities shared by the `ftcachetest` crates

// Modules
pub mod logger;
