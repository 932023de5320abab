//! File integrity helpers (MD5)
//!
//! Blocking functions; async callers run them through `spawn_blocking`.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::errors::AppResult;
use crate::utils::constants::HASH_BUFFER_BYTES;

/// Lowercase hex MD5 of a file's contents
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_BUFFER_BYTES];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Whether the file hashes to `expected` (case-insensitive hex)
pub fn check_md5(path: &Path, expected: &str) -> io::Result<bool> {
    let actual = md5_file(path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

/// File exists and, when a digest is given, matches it
pub fn check_integrity(path: &Path, expected_md5: Option<&str>) -> bool {
    if !path.is_file() {
        return false;
    }
    match expected_md5 {
        None => true,
        Some(md5) => match check_md5(path, md5) {
            Ok(ok) => {
                if !ok {
                    debug!("❌ Digest mismatch: {}", path.display());
                }
                ok
            }
            Err(e) => {
                debug!("❌ Cannot hash {}: {}", path.display(), e);
                false
            }
        },
    }
}

/// `check_integrity` on a blocking thread
pub async fn check_integrity_async(path: PathBuf, expected_md5: Option<String>) -> AppResult<bool> {
    let intact =
        tokio::task::spawn_blocking(move || check_integrity(&path, expected_md5.as_deref())).await?;
    Ok(intact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_md5_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").unwrap();

        assert_eq!(md5_file(&path).unwrap(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert!(check_md5(&path, "5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap());
    }

    #[test]
    fn test_check_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");

        assert!(!check_integrity(&path, None), "missing file is never intact");

        fs::write(&path, b"").unwrap();
        assert!(check_integrity(&path, None));
        assert!(check_integrity(&path, Some("d41d8cd98f00b204e9800998ecf8427e")));
        assert!(!check_integrity(&path, Some("00000000000000000000000000000000")));
    }

    #[test]
    fn test_directory_is_not_intact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_integrity(dir.path(), None));
    }
}
