//! CelebA provisioner
//!
//! Downloads the six CelebA files into `<root>/celeba`, unpacks the image
//! archive and indexes the requested split. A dataset that already passes
//! the integrity check is never fetched again.

use std::path::{Path, PathBuf};
use tracing::info;

use super::dataset::CelebaDataset;
use super::runner::Provisioner;
use crate::models::config::ProvisionConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{RemoteFile, Split};
use crate::providers::drive::DriveClient;
use crate::utils::archive::extract_zip;
use crate::utils::constants::{BASE_FOLDER, IMAGE_ARCHIVE, IMAGE_FOLDER};
use crate::utils::integrity::check_integrity_async;

pub struct CelebaProvisioner {
    drive: DriveClient,
    files: Vec<RemoteFile>,
}

impl CelebaProvisioner {
    /// Provisioner for the published CelebA files
    pub fn new(config: &ProvisionConfig) -> AppResult<Self> {
        Self::with_manifest(config, RemoteFile::celeba_manifest())
    }

    /// Provisioner for a custom file list laid out like CelebA
    pub fn with_manifest(config: &ProvisionConfig, files: Vec<RemoteFile>) -> AppResult<Self> {
        Ok(Self {
            drive: DriveClient::new(config)?,
            files,
        })
    }

    /// `<root>/celeba`
    pub fn base_dir(root: &Path) -> PathBuf {
        root.join(BASE_FOLDER)
    }

    /// Every non-archive file matches its digest and the images are unpacked
    pub async fn check_integrity(&self, root: &Path) -> AppResult<bool> {
        let base = Self::base_dir(root);

        for file in self.files.iter().filter(|f| !f.is_archive()) {
            let intact = check_integrity_async(base.join(&file.filename), Some(file.md5.clone())).await?;
            if !intact {
                return Ok(false);
            }
        }

        Ok(base.join(IMAGE_FOLDER).is_dir())
    }

    /// Fetch and unpack everything that is not already present
    pub async fn download(&self, root: &Path) -> AppResult<()> {
        if self.check_integrity(root).await? {
            info!("✅ Files already downloaded and verified");
            return Ok(());
        }

        let base = Self::base_dir(root);
        tokio::fs::create_dir_all(&base).await?;

        for file in &self.files {
            self.drive.download_file(file, &base).await?;
        }

        let archive = base.join(IMAGE_ARCHIVE);
        let dest = base.clone();
        let entries = tokio::task::spawn_blocking(move || extract_zip(&archive, &dest)).await??;
        info!("📦 Unpacked {} entries into {}", entries, base.join(IMAGE_FOLDER).display());

        Ok(())
    }
}

impl Provisioner for CelebaProvisioner {
    type Handle = CelebaDataset;

    async fn prepare(&self, root: &Path, split: Split, download: bool) -> AppResult<CelebaDataset> {
        if download {
            self.download(root).await?;
        }

        if !self.check_integrity(root).await? {
            return Err(AppError::dataset_not_found());
        }

        let base = Self::base_dir(root);
        let dataset = tokio::task::spawn_blocking(move || CelebaDataset::load(&base, split)).await??;
        Ok(dataset)
    }
}
