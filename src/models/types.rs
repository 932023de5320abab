//! Type definitions for CelebA preparation
//! Splits, remote files and per-image annotations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::errors::AppError;
use crate::utils::constants::{ARCHIVE_EXTENSIONS, CELEBA_FILE_LIST, NUM_LANDMARK_COORDS};

/// Named partition of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
    /// Every image, i.e. the union of the three other splits
    All,
}

/// Every split, in preparation order
pub const ALL_SPLITS: [Split; 4] = [Split::Train, Split::Valid, Split::Test, Split::All];

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
            Split::All => "all",
        }
    }

    /// Code used for this split in the partition file, `None` selects every row
    pub fn partition(&self) -> Option<i32> {
        match self {
            Split::Train => Some(0),
            Split::Valid => Some(1),
            Split::Test => Some(2),
            Split::All => None,
        }
    }

    /// Whether an image with partition code `code` belongs to this split
    pub fn contains(&self, code: i32) -> bool {
        self.partition().map_or(true, |p| p == code)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "valid" => Ok(Split::Valid),
            "test" => Ok(Split::Test),
            "all" => Ok(Split::All),
            other => Err(AppError::invalid_split(other)),
        }
    }
}

/// A file hosted on Google Drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Drive file id
    pub file_id: String,
    /// Expected lowercase hex MD5
    pub md5: String,
    /// Name on disk
    pub filename: String,
}

impl RemoteFile {
    pub fn new(file_id: impl Into<String>, md5: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            md5: md5.into(),
            filename: filename.into(),
        }
    }

    /// The six files that make up CelebA
    pub fn celeba_manifest() -> Vec<RemoteFile> {
        CELEBA_FILE_LIST
            .iter()
            .map(|(id, md5, name)| RemoteFile::new(*id, *md5, *name))
            .collect()
    }

    /// Archives are only hashed right after download
    pub fn is_archive(&self) -> bool {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| ARCHIVE_EXTENSIONS.contains(&ext))
    }
}

/// Face bounding box in the original (unaligned) image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Five facial landmarks in the aligned image:
/// left eye, right eye, nose, left mouth corner, right mouth corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmarks(pub [i32; NUM_LANDMARK_COORDS]);

impl Landmarks {
    /// `(x, y)` of the landmark at `index` (0..5)
    pub fn point(&self, index: usize) -> Option<(i32, i32)> {
        let x = *self.0.get(index * 2)?;
        let y = *self.0.get(index * 2 + 1)?;
        Some((x, y))
    }
}

/// One annotated image of a split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelebaItem {
    /// Image file name inside the image folder
    pub filename: String,
    /// Celebrity identity
    pub identity: u32,
    pub bbox: BoundingBox,
    pub landmarks: Landmarks,
    /// Binary attributes, same order as the dataset's attribute names
    pub attributes: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_split_order_and_names() {
        let names: Vec<_> = ALL_SPLITS.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["train", "valid", "test", "all"]);
    }

    #[test]
    fn test_split_parse() {
        assert_eq!("valid".parse::<Split>().unwrap(), Split::Valid);
        let err = "Train".parse::<Split>().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidSplit);
    }

    #[test]
    fn test_all_split_contains_every_partition() {
        for code in 0..3 {
            assert!(Split::All.contains(code));
        }
        assert!(Split::Train.contains(0));
        assert!(!Split::Train.contains(1));
        assert!(Split::Test.contains(2));
    }

    #[test]
    fn test_manifest_archive_detection() {
        let manifest = RemoteFile::celeba_manifest();
        assert_eq!(manifest.len(), 6);
        let archives: Vec<_> = manifest.iter().filter(|f| f.is_archive()).collect();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].filename, "img_align_celeba.zip");

        for file in &manifest {
            assert_eq!(file.md5.len(), 32, "{} has a malformed digest", file.filename);
            assert!(file.md5.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_landmark_points() {
        let lm = Landmarks([69, 109, 106, 113, 77, 142, 73, 152, 108, 154]);
        assert_eq!(lm.point(0), Some((69, 109)));
        assert_eq!(lm.point(4), Some((108, 154)));
        assert_eq!(lm.point(5), None);
    }
}
