//! Constants Module - Single Source of Truth
//!
//! File manifest, on-disk names and download tunables live here.
//! No other module hardcodes a file id, digest or retry value.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "celeba_prep";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("celeba_prep/", env!("CARGO_PKG_VERSION"));

// ============================================
// GOOGLE DRIVE
// ============================================

/// Default Drive endpoint for direct downloads
pub const DEFAULT_DRIVE_URL: &str = "https://drive.google.com/uc";

/// Cookie prefix Drive uses to hand out a confirm token
pub const DOWNLOAD_WARNING_COOKIE: &str = "download_warning";

/// Prefix of the `<title>` of every Drive interstitial page
pub const DRIVE_TITLE_PREFIX: &str = "Google Drive - ";

/// Interstitial shown for files too large to be virus scanned
pub const VIRUS_SCAN_WARNING: &str = "Virus scan warning";

/// Interstitial shown once a file's daily quota is used up
pub const QUOTA_EXCEEDED: &str = "Quota exceeded";

/// Confirm value accepted when no token is offered
pub const FALLBACK_CONFIRM_TOKEN: &str = "t";

/// Body bytes buffered before deciding whether Drive sent an interstitial page
pub const PEEK_BYTES: usize = 32 * 1024;

/// A saved file smaller than this that looks like HTML is an unhandled Drive page
pub const HTML_SUSPECT_MAX_BYTES: u64 = 10 * 1024;

// ============================================
// DOWNLOAD TUNABLES
// ============================================

/// Default connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default timeout while waiting for the next body chunk (seconds)
pub const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 60;

/// Default attempts per file
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Base retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 1000;

/// Maximum retry delay in milliseconds
pub const MAX_RETRY_MS: u64 = 64000;

/// Jitter percentage applied to each retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Read buffer for hashing files on disk
pub const HASH_BUFFER_BYTES: usize = 1024 * 1024;

/// Suffix for files still being downloaded
pub const PARTIAL_SUFFIX: &str = ".part";

// ============================================
// CELEBA LAYOUT
// ============================================

/// Folder under the root that holds every CelebA file
pub const BASE_FOLDER: &str = "celeba";

/// Folder the image archive unpacks into
pub const IMAGE_FOLDER: &str = "img_align_celeba";

/// Image archive
pub const IMAGE_ARCHIVE: &str = "img_align_celeba.zip";

pub const ATTR_FILE: &str = "list_attr_celeba.txt";
pub const IDENTITY_FILE: &str = "identity_CelebA.txt";
pub const BBOX_FILE: &str = "list_bbox_celeba.txt";
pub const LANDMARKS_FILE: &str = "list_landmarks_align_celeba.txt";
pub const PARTITION_FILE: &str = "list_eval_partition.txt";

/// Preparation report written after a full run
pub const REPORT_FILE: &str = "prep_report.json";

/// Extensions whose digest is checked only right after download
pub const ARCHIVE_EXTENSIONS: [&str; 2] = ["zip", "7z"];

/// (Drive file id, MD5, file name) for every CelebA file, in download order
pub const CELEBA_FILE_LIST: [(&str, &str, &str); 6] = [
    ("0B7EVK8r0v71pZjFTYXZWM3FlRnM", "00d2c5bc6d35e252742224ab0c1e8fcb", IMAGE_ARCHIVE),
    ("0B7EVK8r0v71pblRyaVFSWGxPY0U", "75e246fa4810816ffd6ee81facbd244c", ATTR_FILE),
    ("1_ee_0u7vcNLOfNLegJRHmolfH5ICW-XS", "32bd1bd63d3c78cd57e08160ec5ed1e2", IDENTITY_FILE),
    ("0B7EVK8r0v71pbThiMVRxWXZ4dU0", "00566efa6fedff7a56946cd1c10f1c16", BBOX_FILE),
    ("0B7EVK8r0v71pd0FJY3Blby1HUTQ", "cc24ecafdb5b50baae59b03474781f8c", LANDMARKS_FILE),
    ("0B7EVK8r0v71pY0NSMzRuSXJEVkk", "d32c9cbf5e040fd4025c592c306e6668", PARTITION_FILE),
];

// ============================================
// ANNOTATION SHAPES
// ============================================

/// Landmark coordinates per image (5 points, x/y)
pub const NUM_LANDMARK_COORDS: usize = 10;

/// Bounding box values per image (x, y, width, height)
pub const NUM_BBOX_VALUES: usize = 4;

/// Header row of the tables that carry one (row count sits on line 0)
pub const TABLE_HEADER_ROW: usize = 1;
