//! Diagnostic screenshots written under date-stamped names

use std::fmt::Write;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::browser::Browser;
use crate::config::CaptureConfig;
use crate::error::{E2eError, E2eResult};

/// One screenshot persisted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub label: String,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: usize,
}

/// Writes browser snapshots to `<dir>/<label>_<stamp>.png`
pub struct DiagnosticCapture {
    /// Directory for screenshot artifacts
    dir: PathBuf,

    /// chrono format used to build date stamps
    date_format: String,

    /// Every artifact written so far, in order
    records: Mutex<Vec<CaptureRecord>>,
}

impl DiagnosticCapture {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            date_format: config.date_format.clone(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Date stamp for artifacts produced now
    pub fn stamp(&self) -> E2eResult<String> {
        let mut stamp = String::new();
        write!(stamp, "{}", chrono::Local::now().format(&self.date_format)).map_err(|_| {
            E2eError::Config(format!(
                "capture.date_format '{}' is not a valid date format",
                self.date_format
            ))
        })?;
        Ok(stamp)
    }

    /// Path an artifact for `label` and `stamp` is written to
    pub fn artifact_path(&self, label: &str, stamp: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.png", label, stamp))
    }

    /// Snapshot the browser and persist it.
    ///
    /// Fails with [`E2eError::Capture`] if the snapshot cannot be taken, is
    /// not a PNG, or cannot be written.
    pub async fn capture<B: Browser>(
        &self,
        browser: &B,
        label: &str,
        stamp: &str,
    ) -> E2eResult<CaptureRecord> {
        let capture_error = |reason: String| E2eError::Capture {
            label: label.to_string(),
            reason,
        };

        let png = browser
            .screenshot()
            .await
            .map_err(|e| capture_error(format!("screenshot failed: {}", e)))?;

        match image::guess_format(&png) {
            Ok(ImageFormat::Png) => {}
            Ok(other) => return Err(capture_error(format!("expected PNG, got {:?}", other))),
            Err(e) => return Err(capture_error(format!("unrecognized image data: {}", e))),
        }

        let path = self.artifact_path(label, stamp);
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&path, &png))
            .map_err(|e| capture_error(format!("cannot write {}: {}", path.display(), e)))?;

        let record = CaptureRecord {
            label: label.to_string(),
            path,
            sha256: hex::encode(Sha256::digest(&png)),
            bytes: png.len(),
        };

        info!("Captured '{}' -> {}", label, record.path.display());
        self.records.lock().push(record.clone());
        Ok(record)
    }

    /// Capture while already reporting another failure: errors are logged, never returned
    pub async fn capture_best_effort<B: Browser>(
        &self,
        browser: &B,
        label: &str,
        stamp: &str,
    ) -> Option<CaptureRecord> {
        match self.capture(browser, label, stamp).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Suppressed capture error while handling a failure: {}", e);
                None
            }
        }
    }

    /// All artifacts written so far
    pub fn records(&self) -> Vec<CaptureRecord> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name() {
        let capture = DiagnosticCapture::new(&CaptureConfig {
            dir: PathBuf::from("shots"),
            date_format: "%Y_%m_%d".to_string(),
        });

        assert_eq!(
            capture.artifact_path("searchItem", "2024_03_01"),
            PathBuf::from("shots/searchItem_2024_03_01.png")
        );
    }

    #[test]
    fn test_stamp_uses_configured_format() {
        let capture = DiagnosticCapture::new(&CaptureConfig {
            dir: PathBuf::from("shots"),
            date_format: "%Y_%m_%d".to_string(),
        });

        let stamp = capture.stamp().unwrap();
        let parts: Vec<&str> = stamp.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_invalid_stamp_format_is_an_error() {
        let capture = DiagnosticCapture::new(&CaptureConfig {
            dir: PathBuf::from("shots"),
            date_format: "%Y_%Q".to_string(),
        });

        assert!(matches!(capture.stamp(), Err(E2eError::Config(_))));
    }
}
