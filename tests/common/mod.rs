//! Local stand-in for Google Drive
//!
//! Serves a miniature CelebA (six images) through the same `/uc?id=..&export=download`
//! endpoint shape, with per-file behaviors for the interstitials Drive uses.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use celeba_prep::utils::constants::{
    ATTR_FILE, BBOX_FILE, IDENTITY_FILE, IMAGE_ARCHIVE, LANDMARKS_FILE, PARTITION_FILE,
};
use celeba_prep::{ProvisionConfig, RemoteFile};
use futures_util::StreamExt;
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zip::write::SimpleFileOptions;

pub const ZIP_ID: &str = "zip-id";
pub const ATTR_ID: &str = "attr-id";
pub const IDENTITY_ID: &str = "identity-id";
pub const BBOX_ID: &str = "bbox-id";
pub const LANDMARKS_ID: &str = "landmarks-id";
pub const PARTITION_ID: &str = "partition-id";

/// (image, partition code, identity)
pub const IMAGES: [(&str, i32, u32); 6] = [
    ("000001.jpg", 0, 2880),
    ("000002.jpg", 0, 2937),
    ("000003.jpg", 0, 2880),
    ("000004.jpg", 1, 4153),
    ("000005.jpg", 2, 9040),
    ("000006.jpg", 2, 6369),
];

/// How the fake Drive answers for one file id
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Serve the bytes straight away
    Direct,
    /// Serve Drive's virus-scan page; the bytes come from `/download` once the form is submitted
    VirusScanForm,
    /// Hand out a `download_warning` cookie; serve once `confirm` echoes it
    CookieToken(String),
    /// Virus-scan page without a form; the bytes come once `confirm=t` is sent
    VirusScanNoForm,
    /// Virus-scan page without a form, then the quota page once confirmed
    VirusScanThenQuota,
    /// Always serve the quota-exceeded page
    QuotaExceeded,
    /// Send a first chunk, then hang for longer than any test's chunk timeout
    StallBody,
    /// Answer 503 this many times before serving
    FailTimes(usize),
}

#[derive(Clone)]
pub struct FakeDrive {
    files: Arc<HashMap<String, Vec<u8>>>,
    behaviors: Arc<HashMap<String, Behavior>>,
    failures: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl FakeDrive {
    pub fn new(files: HashMap<String, Vec<u8>>, behaviors: HashMap<String, Behavior>) -> Self {
        Self {
            files: Arc::new(files),
            behaviors: Arc::new(behaviors),
            failures: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every query received so far
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn serve(&self, id: &str) -> Response {
        match self.files.get(id) {
            Some(bytes) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                bytes.clone(),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Start serving on an ephemeral port, returning the `/uc` URL
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/uc", get(uc))
            .route("/download", get(form_download))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/uc", addr)
    }
}

fn html(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

fn quota_page() -> Response {
    html(drive_page(
        "Quota exceeded",
        "<p>Too many users have viewed or downloaded this file recently.</p>",
    ))
}

fn virus_scan_page() -> Response {
    html(drive_page(
        "Virus scan warning",
        "<p>can't scan this file for viruses.</p>",
    ))
}

/// 64 KiB straight away, then silence
fn stalled_body() -> Response {
    let first = futures_util::stream::once(async { Ok::<_, std::io::Error>(vec![0u8; 64 * 1024]) });
    let hang = futures_util::stream::once(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, std::io::Error>(Vec::new())
    });
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(first.chain(hang)),
    )
        .into_response()
}

fn drive_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Google Drive - {}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn uc(State(drive): State<FakeDrive>, Query(query): Query<HashMap<String, String>>) -> Response {
    drive.requests.lock().unwrap().push(query.clone());
    let id = query.get("id").cloned().unwrap_or_default();
    let behavior = drive.behaviors.get(&id).cloned().unwrap_or(Behavior::Direct);

    match behavior {
        Behavior::Direct => drive.serve(&id),
        Behavior::VirusScanForm => html(drive_page(
            "Virus scan warning",
            &format!(
                r#"<p>can't scan this file for viruses.</p>
<form id="download-form" action="/download" method="get">
<input type="submit" id="uc-download-link" class="goog-inline-block" value="Download anyway"/>
<input type="hidden" name="id" value="{}">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
<input type="hidden" name="uuid" value="fixture-uuid">
</form>"#,
                id
            ),
        )),
        Behavior::CookieToken(token) => {
            if query.get("confirm") == Some(&token) {
                drive.serve(&id)
            } else {
                (
                    [
                        (header::SET_COOKIE, format!("download_warning_0_{}={}; Path=/uc", id, token)),
                        (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                    ],
                    "<html><body>confirm</body></html>".to_string(),
                )
                    .into_response()
            }
        }
        Behavior::VirusScanNoForm => match query.get("confirm").map(String::as_str) {
            Some("t") => drive.serve(&id),
            _ => virus_scan_page(),
        },
        Behavior::VirusScanThenQuota => match query.get("confirm").map(String::as_str) {
            Some("t") => quota_page(),
            _ => virus_scan_page(),
        },
        Behavior::QuotaExceeded => quota_page(),
        Behavior::StallBody => stalled_body(),
        Behavior::FailTimes(times) => {
            if drive.failures.fetch_add(1, Ordering::SeqCst) < times {
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            } else {
                drive.serve(&id)
            }
        }
    }
}

async fn form_download(
    State(drive): State<FakeDrive>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    drive.requests.lock().unwrap().push(query.clone());
    let complete = query.get("confirm").map(String::as_str) == Some("t")
        && query.get("uuid").map(String::as_str) == Some("fixture-uuid");
    if !complete {
        return StatusCode::BAD_REQUEST.into_response();
    }
    drive.serve(query.get("id").map(String::as_str).unwrap_or_default())
}

// ============================================
// Miniature dataset
// ============================================

pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

fn image_zip() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, _, _) in IMAGES {
        writer.start_file(format!("img_align_celeba/{}", name), options).unwrap();
        writer.write_all(format!("jpeg bytes of {}", name).as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn rows(value: impl Fn(usize) -> String) -> String {
    IMAGES
        .iter()
        .enumerate()
        .map(|(i, (name, _, _))| format!("{} {}\n", name, value(i)))
        .collect()
}

fn annotation_files() -> Vec<(&'static str, &'static str, String)> {
    let attr = format!(
        "{}\nSmiling Young Eyeglasses \n{}",
        IMAGES.len(),
        rows(|i| if i % 2 == 0 { " 1 -1 -1".to_string() } else { "-1  1 -1".to_string() })
    );
    let identity = rows(|i| IMAGES[i].2.to_string());
    let bbox = format!(
        "{}\nimage_id x_1 y_1 width height\n{}",
        IMAGES.len(),
        rows(|i| format!("{} {} 200 250", 90 + i, 100 + i))
    );
    let landmarks = format!(
        "{}\nlefteye_x lefteye_y righteye_x righteye_y nose_x nose_y leftmouth_x leftmouth_y rightmouth_x rightmouth_y\n{}",
        IMAGES.len(),
        rows(|_| "69 109 106 113 77 142 73 152 108 154".to_string())
    );
    let partition = rows(|i| IMAGES[i].1.to_string());

    vec![
        (ATTR_ID, ATTR_FILE, attr),
        (IDENTITY_ID, IDENTITY_FILE, identity),
        (BBOX_ID, BBOX_FILE, bbox),
        (LANDMARKS_ID, LANDMARKS_FILE, landmarks),
        (PARTITION_ID, PARTITION_FILE, partition),
    ]
}

/// Manifest and file bodies of the miniature dataset, zip first
pub fn fixture_dataset() -> (Vec<RemoteFile>, HashMap<String, Vec<u8>>) {
    let mut manifest = Vec::new();
    let mut bodies = HashMap::new();

    let zip = image_zip();
    manifest.push(RemoteFile::new(ZIP_ID, md5_hex(&zip), IMAGE_ARCHIVE));
    bodies.insert(ZIP_ID.to_string(), zip);

    for (id, name, text) in annotation_files() {
        manifest.push(RemoteFile::new(id, md5_hex(text.as_bytes()), name));
        bodies.insert(id.to_string(), text.into_bytes());
    }

    (manifest, bodies)
}

pub fn test_config(root: &Path, drive_url: &str) -> ProvisionConfig {
    ProvisionConfig {
        root: root.to_path_buf(),
        drive_url: drive_url.to_string(),
        max_retries: 3,
        retry_base: Duration::from_millis(10),
        chunk_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        show_progress: false,
    }
}
