//! Error types for the stealth-overlay-core library.
//!
//! Most faults in this crate are absorbed at a well-defined boundary
//! (capture fallbacks, provider adapters, hotkey registration). The variants
//! below are what crosses those boundaries before being logged or rendered.

use thiserror::Error;

/// Errors that can occur within the stealth-overlay-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values, unreadable settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A platform window-service call failed.
    #[error("Platform call failed: {0}")]
    Platform(String),

    /// A capture attempt failed at some level of the fallback chain.
    #[error("Screen capture failed: {0}")]
    ScreenCapture(String),

    /// No display is available to copy from.
    #[error("Screen not found: index {0}")]
    ScreenNotFound(usize),

    /// The text-recognition engine could not be initialised.
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    /// A global hotkey could not be registered (usually already taken).
    #[error("Hotkey {chord} could not be registered: {reason}")]
    HotkeyRegistration { chord: String, reason: String },

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Provider client construction failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Clipboard access failed.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a platform error with the given message.
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Creates a screen capture error with the given message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::ScreenCapture(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a provider error with the given message.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
