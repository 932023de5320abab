//! CelebA split handle
//!
//! Joins the five annotation tables on the partition file's image order and
//! keeps the rows that belong to the requested split.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use super::annotations::{load_table, Table};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{BoundingBox, CelebaItem, Landmarks, Split};
use crate::utils::constants::{
    ATTR_FILE, BBOX_FILE, IDENTITY_FILE, IMAGE_FOLDER, LANDMARKS_FILE, NUM_BBOX_VALUES,
    NUM_LANDMARK_COORDS, PARTITION_FILE, TABLE_HEADER_ROW,
};

/// Prepared split of CelebA
#[derive(Debug, Clone)]
pub struct CelebaDataset {
    split: Split,
    base_dir: PathBuf,
    attr_names: Vec<String>,
    items: Vec<CelebaItem>,
}

impl CelebaDataset {
    /// Load the annotations under `base_dir` for `split` (blocking)
    pub fn load(base_dir: &Path, split: Split) -> AppResult<Self> {
        let partition = load_table(&base_dir.join(PARTITION_FILE), None)?;
        let identity = load_table(&base_dir.join(IDENTITY_FILE), None)?;
        let bbox = load_table(&base_dir.join(BBOX_FILE), Some(TABLE_HEADER_ROW))?;
        let landmarks = load_table(&base_dir.join(LANDMARKS_FILE), Some(TABLE_HEADER_ROW))?;
        let attr = load_table(&base_dir.join(ATTR_FILE), Some(TABLE_HEADER_ROW))?;

        let dataset = Self::from_tables(base_dir, split, &partition, &identity, &bbox, &landmarks, &attr)?;
        info!("🗂️  Indexed split '{}': {} images", split, dataset.len());
        Ok(dataset)
    }

    /// Build the handle from already parsed tables
    pub fn from_tables(
        base_dir: &Path,
        split: Split,
        partition: &Table,
        identity: &Table,
        bbox: &Table,
        landmarks: &Table,
        attr: &Table,
    ) -> AppResult<Self> {
        require_width(PARTITION_FILE, partition, 1)?;
        require_width(IDENTITY_FILE, identity, 1)?;
        require_width(BBOX_FILE, bbox, NUM_BBOX_VALUES)?;
        require_width(LANDMARKS_FILE, landmarks, NUM_LANDMARK_COORDS)?;
        require_width(ATTR_FILE, attr, attr.header.len())?;

        for (name, table) in [
            (IDENTITY_FILE, identity),
            (BBOX_FILE, bbox),
            (LANDMARKS_FILE, landmarks),
            (ATTR_FILE, attr),
        ] {
            require_same_index(name, table, partition)?;
        }

        let mut items = Vec::new();
        for (row, filename) in partition.index.iter().enumerate() {
            if !split.contains(partition.data[row][0]) {
                continue;
            }

            let b = &bbox.data[row];
            let mut coords = [0i32; NUM_LANDMARK_COORDS];
            coords.copy_from_slice(&landmarks.data[row]);

            items.push(CelebaItem {
                filename: filename.clone(),
                identity: identity_value(filename, identity.data[row][0])?,
                bbox: BoundingBox {
                    x: b[0],
                    y: b[1],
                    width: b[2],
                    height: b[3],
                },
                landmarks: Landmarks(coords),
                // -1 / 1 in the file
                attributes: attr.data[row].iter().map(|v| *v > 0).collect(),
            });
        }

        Ok(Self {
            split,
            base_dir: base_dir.to_path_buf(),
            attr_names: attr.header.clone(),
            items,
        })
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn attr_names(&self) -> &[String] {
        &self.attr_names
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CelebaItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelebaItem> {
        self.items.iter()
    }

    /// Path of the extracted image for `item`
    pub fn image_path(&self, item: &CelebaItem) -> PathBuf {
        self.base_dir.join(IMAGE_FOLDER).join(&item.filename)
    }

    /// Number of distinct identities in this split
    pub fn identities(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.identity)
            .collect::<HashSet<_>>()
            .len()
    }
}

fn require_width(name: &str, table: &Table, expected: usize) -> AppResult<()> {
    if !table.is_empty() && table.width() != expected {
        return Err(AppError::index_mismatch(format!(
            "{} has {} value columns, expected {}",
            name,
            table.width(),
            expected
        )));
    }
    Ok(())
}

fn require_same_index(name: &str, table: &Table, partition: &Table) -> AppResult<()> {
    if table.len() != partition.len() {
        return Err(AppError::index_mismatch(format!(
            "{} lists {} images but {} lists {}",
            name,
            table.len(),
            PARTITION_FILE,
            partition.len()
        )));
    }
    if let Some((row, (got, want))) = table
        .index
        .iter()
        .zip(&partition.index)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(AppError::index_mismatch(format!(
            "{} row {} is {} but {} has {}",
            name, row, got, PARTITION_FILE, want
        )));
    }
    Ok(())
}

fn identity_value(filename: &str, raw: i32) -> AppResult<u32> {
    u32::try_from(raw)
        .map_err(|_| AppError::index_mismatch(format!("{} has negative identity {}", filename, raw)))
}
