//! Text extraction from snapshots.
//!
//! The engine is the `tesseract` command-line tool, run once per snapshot
//! against a temporary PNG. Extraction never fails towards the caller: any
//! fault is logged and yields an empty string. If the engine cannot be set
//! up at startup, extraction is disabled for the whole session.

use crate::error::{AppError, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

/// Image to UTF-8 text. Returns an empty string on any internal failure.
pub trait TextExtractor {
    fn extract(&self, image: &RgbaImage) -> String;
}

/// Stand-in used when the engine could not be initialised.
pub struct DisabledExtractor;

impl TextExtractor for DisabledExtractor {
    fn extract(&self, _image: &RgbaImage) -> String {
        String::new()
    }
}

const LANGUAGE: &str = "eng";

/// Removes the file when dropped.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

pub struct TesseractExtractor {
    binary: PathBuf,
    tessdata_dir: PathBuf,
    counter: AtomicU64,
}

impl TesseractExtractor {
    /// Checks that `tessdata_dir` holds the English model and that the
    /// binary runs.
    pub fn new(tessdata_dir: &Path) -> Result<Self> {
        Self::with_binary(PathBuf::from("tesseract"), tessdata_dir)
    }

    pub fn with_binary(binary: PathBuf, tessdata_dir: &Path) -> Result<Self> {
        let model = tessdata_dir.join(format!("{LANGUAGE}.traineddata"));
        if !model.is_file() {
            return Err(AppError::OcrUnavailable(format!(
                "{} not found; put the tessdata folder with {}.traineddata next to the executable",
                model.display(),
                LANGUAGE
            )));
        }

        let status = Command::new(&binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                AppError::OcrUnavailable(format!("cannot run {}: {}", binary.display(), e))
            })?;
        if !status.success() {
            return Err(AppError::OcrUnavailable(format!(
                "{} --version exited with {}",
                binary.display(),
                status
            )));
        }

        Ok(Self {
            binary,
            tessdata_dir: tessdata_dir.to_path_buf(),
            counter: AtomicU64::new(0),
        })
    }

    fn run(&self, image: &RgbaImage) -> Result<String> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "stealth_overlay_ocr_{}_{}.png",
            std::process::id(),
            n
        ));
        let _guard = TempFileGuard(path.clone());
        image
            .save(&path)
            .map_err(|e| AppError::image(format!("failed to write {}: {}", path.display(), e)))?;

        let output = Command::new(&self.binary)
            .arg(&path)
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata_dir)
            .args(["-l", LANGUAGE, "--psm", "3"])
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(AppError::OcrUnavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, image: &RgbaImage) -> String {
        match self.run(image) {
            Ok(text) => {
                log::debug!("OCR extracted {} chars", text.len());
                text
            }
            Err(e) => {
                log::warn!("OCR failed: {}", e);
                String::new()
            }
        }
    }
}

/// Builds the session's extractor. A missing directory or engine disables
/// extraction, reported once here.
pub fn extractor_for(tessdata_dir: Option<&Path>) -> Box<dyn TextExtractor> {
    let Some(dir) = tessdata_dir else {
        log::warn!("No tessdata directory configured; text extraction disabled");
        return Box::new(DisabledExtractor);
    };
    match TesseractExtractor::new(dir) {
        Ok(extractor) => {
            log::info!("OCR ready (tessdata: {})", dir.display());
            Box::new(extractor)
        }
        Err(e) => {
            log::warn!("{}; text extraction disabled for this session", e);
            Box::new(DisabledExtractor)
        }
    }
}
