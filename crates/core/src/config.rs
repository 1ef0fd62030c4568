//! Runtime configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional read-only `settings.json` in the user's config directory, and
//! environment variables (including a `.env` file).

use crate::error::{AppError, Result};
use crate::geometry::{Point, Size};
use crate::image_processing::BlankCheck;
use directories::ProjectDirs;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini-2025-04-14";

/// Geometry and appearance of the overlay window.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    pub size: Size,
    pub initial_position: Point,
    /// Pixels moved per movement hotkey.
    pub move_step: i32,
    /// Layered-window alpha (0 transparent, 255 opaque).
    pub alpha: u8,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            size: Size::new(800, 700),
            initial_position: Point::new(100, 100),
            move_step: 50,
            alpha: 180,
        }
    }
}

/// Timing and classification knobs for the capture pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    /// Wait after hiding the overlay before querying or copying a window.
    pub settle_delay: Duration,
    /// Wait after hiding the overlay before copying the whole display.
    pub full_screen_settle_delay: Duration,
    pub blank: BlankCheck,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            full_screen_settle_delay: Duration::from_millis(100),
            blank: BlankCheck::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Directory holding `eng.traineddata` for the text extractor.
    pub tessdata_dir: Option<PathBuf>,
    pub overlay: OverlayConfig,
    pub capture: CaptureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            tessdata_dir: None,
            overlay: OverlayConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Config {
    /// Loads defaults, then `settings.json`, then the environment.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let mut config = Self::default();
        if let Some(settings) = SettingsFile::load()? {
            settings.apply(&mut config);
        }

        config.gemini_api_key = non_empty_var("GEMINI_API_KEY");
        config.openai_api_key = non_empty_var("OPENAI_API_KEY");
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(model) = non_empty_var("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Some(dir) = non_empty_var("OVERLAY_TESSDATA") {
            config.tessdata_dir = Some(PathBuf::from(dir));
        }
        if config.tessdata_dir.is_none() {
            config.tessdata_dir = default_tessdata_dir();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    fn validate(&self) -> Result<()> {
        if self.overlay.move_step <= 0 {
            return Err(AppError::config(format!(
                "move step must be positive, got {}",
                self.overlay.move_step
            )));
        }
        if self.overlay.size.width <= 0 || self.overlay.size.height <= 0 {
            return Err(AppError::config(format!(
                "overlay size must be positive, got {}x{}",
                self.overlay.size.width, self.overlay.size.height
            )));
        }
        if self.capture.blank.sample_size == 0 {
            return Err(AppError::config("blank-check sample size must be non-zero"));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// `tessdata/` next to the executable, matching where OCR data ships.
fn default_tessdata_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("tessdata")))
}

/// Builder used by the CLI for flag overrides and by tests.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn with_move_step(mut self, step: i32) -> Self {
        self.config.overlay.move_step = step;
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.config.overlay.alpha = alpha;
        self
    }

    pub fn with_settle_delays(mut self, settle: Duration, full_screen: Duration) -> Self {
        self.config.capture.settle_delay = settle;
        self.config.capture.full_screen_settle_delay = full_screen;
        self
    }

    pub fn with_tessdata_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.tessdata_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Optional overrides read from `settings.json`. Never written back.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    overlay_size: Option<Size>,
    initial_position: Option<Point>,
    move_step: Option<i32>,
    opacity: Option<u8>,
    settle_delay_ms: Option<u64>,
    full_screen_settle_delay_ms: Option<u64>,
    tessdata_dir: Option<PathBuf>,
    gemini_model: Option<String>,
    openai_model: Option<String>,
}

impl SettingsFile {
    fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stealth-overlay")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    fn load() -> Result<Option<Self>> {
        let Some(path) = Self::path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let settings = serde_json::from_str(&content).map_err(|e| {
            AppError::config(format!("invalid settings file {}: {}", path.display(), e))
        })?;
        log::info!("Loaded overrides from {}", path.display());
        Ok(Some(settings))
    }

    fn apply(self, config: &mut Config) {
        if let Some(size) = self.overlay_size {
            config.overlay.size = size;
        }
        if let Some(position) = self.initial_position {
            config.overlay.initial_position = position;
        }
        if let Some(step) = self.move_step {
            config.overlay.move_step = step;
        }
        if let Some(opacity) = self.opacity {
            config.overlay.alpha = opacity;
        }
        if let Some(ms) = self.settle_delay_ms {
            config.capture.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.full_screen_settle_delay_ms {
            config.capture.full_screen_settle_delay = Duration::from_millis(ms);
        }
        if self.tessdata_dir.is_some() {
            config.tessdata_dir = self.tessdata_dir;
        }
        if let Some(model) = self.gemini_model {
            config.gemini_model = model;
        }
        if let Some(model) = self.openai_model {
            config.openai_model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_non_positive_step() {
        let err = Config::builder().with_move_step(0).build().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn defaults_match_overlay_layout() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.overlay.size, Size::new(800, 700));
        assert_eq!(config.overlay.initial_position, Point::new(100, 100));
        assert_eq!(config.overlay.move_step, 50);
        assert_eq!(config.overlay.alpha, 180);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn settings_file_overrides_only_present_fields() {
        let settings: SettingsFile =
            serde_json::from_str(r#"{"move_step": 20, "opacity": 200, "settle_delay_ms": 5}"#)
                .unwrap();
        let mut config = Config::default();
        settings.apply(&mut config);

        assert_eq!(config.overlay.move_step, 20);
        assert_eq!(config.overlay.alpha, 200);
        assert_eq!(config.capture.settle_delay, Duration::from_millis(5));
        assert_eq!(
            config.capture.full_screen_settle_delay,
            Duration::from_millis(100)
        );
        assert_eq!(config.overlay.size, Size::new(800, 700));
    }
}
