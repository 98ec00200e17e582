//! Image asset resolution and download.
//!
//! Resolution order for a key: numbered files `{key}_1.jpg` ..
//! `{key}_3.jpg` (first validated hit is the primary, all validated hits
//! form the gallery), then the legacy unsuffixed `{key}.jpg`, then the
//! shared placeholder. A file only counts when its CONTENT sniffs as one
//! of the whitelisted encodings - extension alone proves nothing, the
//! downloads land in `.jpg` files regardless of what the server sent.

use image::ImageFormat;
use reqwest::Client;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use upcvault_core::{ProductKey, VaultContext};

/// Numbered candidates consulted during resolution and download.
pub const NUMBERED_CANDIDATES: u32 = 3;

/// Bytes read for content sniffing; every whitelisted signature fits.
const SNIFF_LEN: usize = 512;

/// Per-request timeout for one image download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a download pass for one key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadReport {
    pub attempted: usize,
    pub saved: usize,
}

impl DownloadReport {
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.saved == 0
    }
}

/// Resolves local image files for keys, downloading on fresh lookups.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    images_dir: PathBuf,
    placeholder: PathBuf,
    client: Client,
}

impl AssetResolver {
    pub fn new(images_dir: impl Into<PathBuf>, placeholder: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            placeholder: placeholder.into(),
            client: Client::new(),
        }
    }

    pub fn from_context(ctx: &VaultContext) -> Self {
        Self::new(ctx.paths.images.clone(), ctx.placeholder.clone())
    }

    /// Path of the n-th numbered candidate (1-based).
    pub fn numbered_path(&self, key: &ProductKey, index: u32) -> PathBuf {
        self.images_dir.join(format!("{key}_{index}.jpg"))
    }

    /// Path of the legacy unsuffixed candidate.
    pub fn legacy_path(&self, key: &ProductKey) -> PathBuf {
        self.images_dir.join(format!("{key}.jpg"))
    }

    /// The shared placeholder path.
    pub fn placeholder(&self) -> &Path {
        &self.placeholder
    }

    /// First validated local image for a key, or `None`.
    pub fn resolve(&self, key: &ProductKey) -> Option<PathBuf> {
        for index in 1..=NUMBERED_CANDIDATES {
            let candidate = self.numbered_path(key, index);
            if validate_image(&candidate) {
                return Some(candidate);
            }
        }
        let legacy = self.legacy_path(key);
        if validate_image(&legacy) {
            return Some(legacy);
        }
        None
    }

    /// First validated local image, or the placeholder.
    pub fn primary(&self, key: &ProductKey) -> PathBuf {
        self.resolve(key)
            .unwrap_or_else(|| self.placeholder.clone())
    }

    /// Every validated numbered image, in numbered order.
    pub fn gallery(&self, key: &ProductKey) -> Vec<PathBuf> {
        (1..=NUMBERED_CANDIDATES)
            .map(|index| self.numbered_path(key, index))
            .filter(|candidate| validate_image(candidate))
            .collect()
    }

    /// Fetch up to [`NUMBERED_CANDIDATES`] remote URLs sequentially into
    /// numbered files. If every numbered attempt fails, one legacy-path
    /// download from the first URL is tried as a last resort. Partial
    /// failure is not fatal; the report says how many landed.
    pub async fn download_set(&self, key: &ProductKey, urls: &[String]) -> DownloadReport {
        let mut report = DownloadReport::default();
        for (offset, url) in urls.iter().take(NUMBERED_CANDIDATES as usize).enumerate() {
            report.attempted += 1;
            let dest = self.numbered_path(key, offset as u32 + 1);
            if self.download_one(url, &dest).await {
                report.saved += 1;
            }
        }
        if report.all_failed() {
            if let Some(first) = urls.first() {
                debug!(key = %key, "numbered downloads failed, trying legacy path");
                report.attempted += 1;
                if self.download_one(first, &self.legacy_path(key)).await {
                    report.saved += 1;
                }
            }
        }
        report
    }

    async fn download_one(&self, url: &str, dest: &Path) -> bool {
        let response = match self.client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await {
            Ok(r) => r,
            Err(err) => {
                warn!(url, error = %err, "image download failed");
                return false;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = response.status().as_u16(), "image download rejected");
            return false;
        }
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(err) => {
                warn!(url, error = %err, "image body read failed");
                return false;
            }
        };
        match std::fs::write(dest, &bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!(dest = %dest.display(), error = %err, "image write failed");
                false
            }
        }
    }
}

/// Content-sniff a file against the whitelisted encodings.
///
/// Missing files, unreadable files, and unrecognized or non-whitelisted
/// content all read as "not an image here".
pub fn validate_image(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut header = [0u8; SNIFF_LEN];
    let read = match file.read(&mut header) {
        Ok(n) => n,
        Err(_) => return false,
    };
    matches!(
        image::guess_format(&header[..read]),
        Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP)
    )
}

// =============================================================================
// TESTS
// =============================================================================
