//! celeba_prep Library
//!
//! Downloads and prepares the CelebA face dataset:
//! - Google Drive retrieval with confirm-token handling and retry
//! - MD5 verification of every downloaded file
//! - Extraction of the aligned image archive
//! - Indexing of the train / valid / test / all splits

pub mod models;
pub mod providers;
pub mod provision;
pub mod utils;

pub use provision::{prepare_all, CelebaDataset, CelebaProvisioner, PrepReport, Provisioner, SplitSummary};
pub use models::{AppError, AppResult, CelebaItem, ErrorCode, ProvisionConfig, RemoteFile, Split, ALL_SPLITS};
pub use providers::DriveClient;
