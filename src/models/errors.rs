//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so a failed preparation run can be
//! diagnosed from the log line alone.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - DL_xxx / DRIVE_xxx: download errors
//! - INT_xxx: integrity errors
//! - ARC_xxx: archive errors
//! - IDX_xxx: annotation index errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Whether the failed operation may succeed if attempted again
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Download Errors
    // ============================================
    /// Could not connect to the download host
    DownloadConnectionFailed,
    /// Request or body read timed out
    DownloadTimeout,
    /// Host answered HTTP 429
    DownloadRateLimited,
    /// Host answered HTTP 5xx
    DownloadServerError,
    /// Host answered any other non-success status
    DownloadHttpError,
    /// Google Drive refused the file because its daily quota is used up
    DriveQuotaExceeded,

    // ============================================
    // Integrity Errors
    // ============================================
    /// Downloaded bytes do not hash to the recorded digest
    ChecksumMismatch,
    /// Dataset files missing or corrupted on disk
    DatasetNotFound,

    // ============================================
    // Archive Errors
    // ============================================
    /// File is not a readable zip archive
    ArchiveInvalid,
    /// Archive could not be unpacked
    ArchiveExtractFailed,

    // ============================================
    // Index Errors
    // ============================================
    /// Annotation table is malformed
    IndexParseFailed,
    /// Annotation tables disagree on the image list
    IndexMismatch,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Environment override could not be parsed
    ConfigInvalidValue,
    /// Unknown split name
    ConfigInvalidSplit,

    // ============================================
    // Generic Errors
    // ============================================
    /// Filesystem failure
    IoFailed,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DownloadConnectionFailed => "DL_CONNECTION_FAILED",
            Self::DownloadTimeout => "DL_TIMEOUT",
            Self::DownloadRateLimited => "DL_RATE_LIMITED",
            Self::DownloadServerError => "DL_SERVER_ERROR",
            Self::DownloadHttpError => "DL_HTTP_ERROR",
            Self::DriveQuotaExceeded => "DRIVE_QUOTA_EXCEEDED",

            Self::ChecksumMismatch => "INT_CHECKSUM_MISMATCH",
            Self::DatasetNotFound => "INT_DATASET_NOT_FOUND",

            Self::ArchiveInvalid => "ARC_INVALID",
            Self::ArchiveExtractFailed => "ARC_EXTRACT_FAILED",

            Self::IndexParseFailed => "IDX_PARSE_FAILED",
            Self::IndexMismatch => "IDX_MISMATCH",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigInvalidSplit => "CFG_INVALID_SPLIT",

            Self::IoFailed => "IO_FAILED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DownloadConnectionFailed
                | Self::DownloadTimeout
                | Self::DownloadRateLimited
                | Self::DownloadServerError
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Connection to the download host failed
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DownloadConnectionFailed, msg)
    }

    /// Request or body read timed out
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DownloadTimeout, msg)
    }

    /// Map a non-success HTTP status to the matching download error
    pub fn http_status(status: u16, url: &str) -> Self {
        match status {
            429 => Self::new(ErrorCode::DownloadRateLimited, format!("Rate limited (HTTP 429) by {}", url)),
            500..=599 => Self::new(ErrorCode::DownloadServerError, format!("HTTP {} from {}", status, url)),
            _ => Self::new(ErrorCode::DownloadHttpError, format!("HTTP {} from {}", status, url)),
        }
    }

    /// Drive download quota exhausted for a file
    pub fn quota_exceeded(filename: &str) -> Self {
        Self::new(
            ErrorCode::DriveQuotaExceeded,
            format!(
                "The daily quota of the file {} is exceeded and it can't be downloaded. \
                 This is a limitation of Google Drive and can only be overcome by trying again later.",
                filename
            ),
        )
    }

    /// Downloaded file does not match its recorded digest
    pub fn checksum_mismatch(filename: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::ChecksumMismatch,
            format!(
                "MD5 of {} does not match the one on record (expected {}, got {})",
                filename, expected, actual
            ),
        )
    }

    /// Dataset missing or corrupted on disk
    pub fn dataset_not_found() -> Self {
        Self::new(
            ErrorCode::DatasetNotFound,
            "Dataset not found or corrupted. Enable download to fetch it",
        )
    }

    /// Malformed annotation table
    pub fn index_parse(source_name: &str, line: usize, msg: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::IndexParseFailed,
            format!("{}:{}: {}", source_name, line, msg.into()),
        )
    }

    /// Annotation tables disagree
    pub fn index_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::IndexMismatch, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }

    /// Unknown split name
    pub fn invalid_split(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidSplit,
            format!("Unknown split {:?}, expected one of train, valid, test, all", name),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::IoFailed, format!("IO error: {}", err), err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::with_source(ErrorCode::DownloadTimeout, "Request timeout", err)
        } else if err.is_connect() {
            Self::with_source(ErrorCode::DownloadConnectionFailed, "Connection failed", err)
        } else if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            Self::http_status(status.as_u16(), &url)
        } else if err.is_body() || err.is_decode() {
            // Truncated bodies are usually a dropped connection
            Self::with_source(ErrorCode::DownloadConnectionFailed, "Response body interrupted", err)
        } else {
            Self::with_source(ErrorCode::Unknown, err.to_string(), err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::IoFailed, "JSON encode error", err)
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => {
                Self::with_source(ErrorCode::ArchiveExtractFailed, "Archive IO error", io)
            }
            other => Self::with_source(ErrorCode::ArchiveInvalid, "Invalid zip archive", other),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::with_source(ErrorCode::Unknown, "Blocking task failed", err)
    }
}
