//! Configuration types
//!
//! Board-agnostic experiment configuration. The firmware generates these
//! values at build time from its TOML file.

pub mod types;

pub use types::*;
