//! Split preparation loop
//!
//! The program's whole top-level behavior: prepare every split, in order,
//! stopping at the first failure.

use std::path::Path;
use tracing::info;

use crate::models::errors::AppResult;
use crate::models::types::{Split, ALL_SPLITS};

/// Capability that makes one split of a dataset available locally
#[allow(async_fn_in_trait)]
pub trait Provisioner {
    /// Handle returned for a prepared split
    type Handle;

    /// Ensure `split` is present under `root`, fetching it first when `download` is set
    async fn prepare(&self, root: &Path, split: Split, download: bool) -> AppResult<Self::Handle>;
}

/// Prepare train, valid, test and all, in that order
pub async fn prepare_all<P: Provisioner>(
    provisioner: &P,
    root: &Path,
    download: bool,
) -> AppResult<Vec<P::Handle>> {
    let mut handles = Vec::with_capacity(ALL_SPLITS.len());

    for split in ALL_SPLITS {
        info!("🚀 Preparing split '{}'", split);
        handles.push(provisioner.prepare(root, split, download).await?);
    }

    Ok(handles)
}
