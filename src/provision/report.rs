//! Preparation report
//!
//! Summary of a completed run, exported next to the dataset as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::dataset::CelebaDataset;
use crate::models::errors::AppResult;
use crate::models::types::Split;
use crate::utils::constants::{APP_VERSION, REPORT_FILE};

/// Per-split counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub split: Split,
    pub images: usize,
    pub identities: usize,
}

/// Outcome of preparing every split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub root: String,
    pub splits: Vec<SplitSummary>,
}

impl PrepReport {
    pub fn from_datasets(root: &Path, datasets: &[CelebaDataset]) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: APP_VERSION.to_string(),
            root: root.display().to_string(),
            splits: datasets
                .iter()
                .map(|d| SplitSummary {
                    split: d.split(),
                    images: d.len(),
                    identities: d.identities(),
                })
                .collect(),
        }
    }

    /// One line per split, for the log
    pub fn summary(&self) -> String {
        self.splits
            .iter()
            .map(|s| format!("{:<5} {:>7} images {:>6} identities", s.split.as_str(), s.images, s.identities))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the report as pretty JSON into `dir`
    pub fn export_json(&self, dir: &Path) -> AppResult<PathBuf> {
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
