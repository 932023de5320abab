//! Zip extraction
//!
//! Entries are unpacked relative to the destination; the zip crate refuses
//! names that would escape it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;
use zip::ZipArchive;

use crate::models::errors::{AppError, AppResult, ErrorCode};

/// Unpack `archive` into `dest`, returning the number of entries
pub fn extract_zip(archive: &Path, dest: &Path) -> AppResult<usize> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        AppError::with_source(
            ErrorCode::ArchiveInvalid,
            format!("{} is not a valid zip archive", archive.display()),
            e,
        )
    })?;

    let entries = zip.len();
    info!("📦 Extracting {} entries from {}", entries, archive.display());

    std::fs::create_dir_all(dest)?;
    zip.extract(dest).map_err(|e| {
        AppError::with_source(
            ErrorCode::ArchiveExtractFailed,
            format!("Failed to extract {} into {}", archive.display(), dest.display()),
            e,
        )
    })?;

    Ok(entries)
}
