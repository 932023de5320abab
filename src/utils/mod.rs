//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, file hashing and archive handling used across the crate.

pub mod archive;
pub mod constants;
pub mod integrity;

pub use archive::*;
pub use constants::*;
pub use integrity::*;
