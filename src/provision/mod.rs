//! Provision Module - Dataset Provisioning
//!
//! The split loop, the CelebA provisioner and the split handle it returns.

pub mod annotations;
pub mod celeba;
pub mod dataset;
pub mod report;
pub mod runner;

pub use annotations::*;
pub use celeba::*;
pub use dataset::*;
pub use report::*;
pub use runner::*;
