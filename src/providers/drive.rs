//! Google Drive Download Client
//!
//! Fetches publicly shared Drive files through the direct-download endpoint:
//! 1. Confirm-token handshake (cookie, virus-scan interstitial, download form)
//! 2. Quota-exceeded detection
//! 3. Streamed writes to a `.part` file, hashed on the fly
//! 4. Exponential backoff retry with jitter (1s→2s→4s→...→64s) on transient failures

use futures_util::stream::{BoxStream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use md5::{Digest, Md5};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, SET_COOKIE, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::models::config::ProvisionConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::RemoteFile;
use crate::utils::constants::{
    DOWNLOAD_WARNING_COOKIE, DRIVE_TITLE_PREFIX, FALLBACK_CONFIRM_TOKEN,
    HTML_SUSPECT_MAX_BYTES, MAX_RETRY_MS, PARTIAL_SUFFIX, PEEK_BYTES, QUOTA_EXCEEDED,
    RETRY_JITTER_PERCENT, USER_AGENT as USER_AGENT_CONST, VIRUS_SCAN_WARNING,
};
use crate::utils::integrity::check_integrity_async;

/// Query parameters of a Drive request
type Params = Vec<(String, String)>;

/// Hidden form Drive serves in place of files it cannot virus scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadForm {
    pub action: String,
    pub params: Params,
}

/// A response body with its first bytes already buffered
struct Payload {
    head: Vec<u8>,
    rest: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    content_length: Option<u64>,
    is_html: bool,
}

impl Payload {
    /// Buffer up to `PEEK_BYTES` of the body
    async fn open(response: reqwest::Response, chunk_timeout: Duration) -> AppResult<Self> {
        let content_length = response.content_length();
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("text/html"));

        let mut rest = response.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed();
        let mut head = Vec::new();
        while head.len() < PEEK_BYTES {
            match next_chunk(&mut rest, chunk_timeout).await? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }

        Ok(Self {
            head,
            rest,
            content_length,
            is_html,
        })
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.head).into_owned()
    }

    /// Interstitial name from the page title, if this is a Drive page
    fn api_response(&self) -> Option<String> {
        if !self.is_html && !looks_like_html(&self.head) {
            return None;
        }
        extract_api_response(&self.text())
    }
}

/// Download client for Google Drive
#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    drive_url: String,
    max_retries: u32,
    retry_base: Duration,
    chunk_timeout: Duration,
    show_progress: bool,
}

impl DriveClient {
    pub fn new(config: &ProvisionConfig) -> AppResult<Self> {
        Ok(Self {
            client: Self::build_client(config)?,
            drive_url: config.drive_url.clone(),
            max_retries: config.max_retries.max(1),
            retry_base: config.retry_base,
            chunk_timeout: config.chunk_timeout,
            show_progress: config.show_progress,
        })
    }

    fn build_client(config: &ProvisionConfig) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::Unknown, "Failed to build HTTP client", e))
    }

    /// Download `file` into `dest_dir`, skipping it when an intact copy is already there
    pub async fn download_file(&self, file: &RemoteFile, dest_dir: &Path) -> AppResult<PathBuf> {
        let path = dest_dir.join(&file.filename);

        if check_integrity_async(path.clone(), Some(file.md5.clone())).await? {
            info!("✅ Using downloaded and verified file: {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(dest_dir).await?;
        info!("⬇️  Downloading {} (drive id {})", file.filename, file.file_id);

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(attempt, self.retry_base);
                debug!(
                    "⏳ Retry {}/{} for {} after {}ms",
                    attempt + 1,
                    self.max_retries,
                    file.filename,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.try_download(file, &path).await {
                Ok(()) => return Ok(path),
                Err(e) if e.is_retryable() => {
                    warn!(
                        "⚠️ {} failed (attempt {}/{}): {}",
                        file.filename,
                        attempt + 1,
                        self.max_retries,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::new(
                ErrorCode::Unknown,
                format!("{} failed after {} attempts", file.filename, self.max_retries),
            )
        }))
    }

    /// Single attempt: handshake, stream to `.part`, verify, rename
    async fn try_download(&self, file: &RemoteFile, path: &Path) -> AppResult<()> {
        let payload = self.open_confirmed(file).await?;
        let suspicious = looks_like_html(&payload.head);
        let part = partial_path(path);

        let (digest, size) = match self.save_payload(payload, &part, &file.filename).await {
            Ok(saved) => saved,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };

        if size < HTML_SUSPECT_MAX_BYTES && suspicious {
            warn!(
                "⚠️ {} is only {} bytes and looks like an HTML page; Drive may have answered with an unhandled response",
                file.filename, size
            );
        }

        if !digest.eq_ignore_ascii_case(&file.md5) {
            let _ = fs::remove_file(&part).await;
            return Err(AppError::checksum_mismatch(&file.filename, &file.md5, &digest));
        }

        if let Err(e) = fs::rename(&part, path).await {
            let _ = fs::remove_file(&part).await;
            return Err(e.into());
        }
        info!("✅ Downloaded {} ({} bytes, md5 verified)", file.filename, size);
        Ok(())
    }

    /// Request the file, following whatever confirmation Drive asks for
    async fn open_confirmed(&self, file: &RemoteFile) -> AppResult<Payload> {
        let mut params: Params = vec![
            ("id".to_string(), file.file_id.clone()),
            ("export".to_string(), "download".to_string()),
        ];

        let response = self.get(&self.drive_url, &params).await?;

        if let Some(token) = download_warning_token(response.headers()) {
            debug!("🍪 Confirm token received via cookie for {}", file.filename);
            drop(response);
            params.push(("confirm".to_string(), token));
            let response = self.get(&self.drive_url, &params).await?;
            return self.reject_quota(Payload::open(response, self.chunk_timeout).await?, file);
        }

        let payload = Payload::open(response, self.chunk_timeout).await?;

        match payload.api_response().as_deref() {
            Some(VIRUS_SCAN_WARNING) => {
                info!("🛡️ {} is too large for Drive's virus scan, confirming download", file.filename);
                let (url, params) = match parse_download_form(&payload.text()) {
                    Some(form) => (self.resolve(&form.action), form.params),
                    None => {
                        params.push(("confirm".to_string(), FALLBACK_CONFIRM_TOKEN.to_string()));
                        (self.drive_url.clone(), params)
                    }
                };
                drop(payload);
                let response = self.get(&url, &params).await?;
                self.reject_quota(Payload::open(response, self.chunk_timeout).await?, file)
            }
            _ => self.reject_quota(payload, file),
        }
    }

    fn reject_quota(&self, payload: Payload, file: &RemoteFile) -> AppResult<Payload> {
        if payload.api_response().as_deref() == Some(QUOTA_EXCEEDED) {
            return Err(AppError::quota_exceeded(&file.filename));
        }
        Ok(payload)
    }

    /// Resolve a form action against the Drive endpoint
    fn resolve(&self, action: &str) -> String {
        reqwest::Url::parse(&self.drive_url)
            .and_then(|base| base.join(action))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| action.to_string())
    }

    async fn get(&self, url: &str, params: &Params) -> AppResult<reqwest::Response> {
        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status(status.as_u16(), url));
        }

        Ok(response)
    }

    /// Stream the body to `part`, returning its MD5 and size
    async fn save_payload(&self, payload: Payload, part: &Path, name: &str) -> AppResult<(String, u64)> {
        let Payload {
            head,
            mut rest,
            content_length,
            ..
        } = payload;

        let mut file = File::create(part).await?;
        let mut hasher = Md5::new();
        let progress = self.progress_bar(content_length, name);
        let mut written = 0u64;

        let mut chunk = Some(head);
        while let Some(bytes) = chunk {
            if !bytes.is_empty() {
                hasher.update(&bytes);
                file.write_all(&bytes).await?;
                written += bytes.len() as u64;
                progress.inc(bytes.len() as u64);
            }
            chunk = next_chunk(&mut rest, self.chunk_timeout).await?;
        }

        file.flush().await?;
        progress.finish_and_clear();

        Ok((hex::encode(hasher.finalize()), written))
    }

    fn progress_bar(&self, len: Option<u64>, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = match len {
            Some(len) => {
                let style = ProgressStyle::with_template(
                    "{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                ProgressBar::new(len).with_style(style.progress_chars("#>-"))
            }
            None => {
                let style = ProgressStyle::with_template("{msg} {spinner} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                ProgressBar::new_spinner().with_style(style)
            }
        };
        progress.with_message(name.to_string())
    }
}

/// Next body chunk, failing if none arrives within `timeout`
async fn next_chunk(
    stream: &mut BoxStream<'static, reqwest::Result<Vec<u8>>>,
    timeout: Duration,
) -> AppResult<Option<Vec<u8>>> {
    match tokio::time::timeout(timeout, stream.next()).await {
        Err(_) => Err(AppError::timeout(format!(
            "No data received for {}ms",
            timeout.as_millis()
        ))),
        Ok(None) => Ok(None),
        Ok(Some(Err(e))) => Err(e.into()),
        Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
    }
}

/// Backoff before attempt `attempt` (1-based retry count): base·2^(n-1), capped, ±20% jitter
pub fn retry_delay(attempt: u32, base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
    let capped_delay = base_ms.saturating_mul(factor).min(MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 =
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    let final_delay = (capped_delay as i64 + jitter).max(0) as u64;

    Duration::from_millis(final_delay)
}

/// Confirm token from a `download_warning*` cookie
pub fn download_warning_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim().starts_with(DOWNLOAD_WARNING_COOKIE))
        .map(|(_, value)| value.trim().to_string())
}

/// `<api response>` out of `<title>Google Drive - <api response></title>`
pub fn extract_api_response(html: &str) -> Option<String> {
    let start = html.find("<title>")? + "<title>".len();
    let end = start + html[start..].find("</title>")?;
    html[start..end]
        .trim()
        .strip_prefix(DRIVE_TITLE_PREFIX)
        .map(|s| s.trim().to_string())
}

/// Action and hidden inputs of Drive's `download-form`
pub fn parse_download_form(html: &str) -> Option<DownloadForm> {
    let id_pos = html.find("id=\"download-form\"")?;
    let form_start = html[..id_pos].rfind("<form")?;
    let tag_end = form_start + html[form_start..].find('>')?;
    let action = attr_value(&html[form_start..tag_end], "action")?.replace("&amp;", "&");

    let form_end = html[tag_end..]
        .find("</form>")
        .map_or(html.len(), |p| tag_end + p);
    let body = &html[tag_end..form_end];

    let mut params = Vec::new();
    let mut cursor = 0;
    while let Some(pos) = body[cursor..].find("<input") {
        let start = cursor + pos;
        let end = body[start..].find('>').map_or(body.len(), |p| start + p);
        let tag = &body[start..end];
        if attr_value(tag, "type").as_deref() == Some("hidden") {
            if let (Some(name), Some(value)) = (attr_value(tag, "name"), attr_value(tag, "value")) {
                params.push((name, value));
            }
        }
        cursor = end;
    }

    Some(DownloadForm { action, params })
}

/// Value of `name="..."` where the attribute name follows whitespace
fn attr_value(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{}=\"", name);
    let mut from = 0;

    while let Some(pos) = tag[from..].find(&needle) {
        let start = from + pos;
        let value_start = start + needle.len();
        let separated = tag[..start]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_whitespace());
        if separated {
            let end = value_start + tag[value_start..].find('"')?;
            return Some(tag[value_start..end].to_string());
        }
        from = value_start;
    }

    None
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let probe = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).to_ascii_lowercase();
    let probe = probe.trim_start();
    probe.starts_with("<!doctype html") || probe.starts_with("<html") || probe.contains("<title>")
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}
