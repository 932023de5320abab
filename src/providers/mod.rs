//! Providers Module - External Data Sources
//!
//! Download clients for the hosts the dataset lives on.

pub mod drive;

pub use drive::*;
