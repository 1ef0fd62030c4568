//! Stealth Overlay Core Library
//!
//! A hotkey-driven overlay that stays out of screen captures. Each capture
//! snapshots the window under it, extracts the text, and appends it to a
//! corpus that is later sent to a completion provider together with a
//! problem-type prompt template.
//!
//! # Overview
//!
//! - **Stealth window**: layered, click-through where empty, excluded from
//!   capture via [`stealth`] and the [`platform`] backends
//! - **Capture**: window render, screen-region and full-screen fallbacks via
//!   [`capture`]
//! - **Text extraction**: Tesseract-backed [`ocr`]
//! - **Requests**: Gemini and OpenAI providers in [`providers`], dispatched
//!   off the message thread by [`orchestrator`]
//!
//! # Quick Start
//!
//! ```ignore
//! use stealth_overlay_core::{App, Config, RequestOrchestrator};
//!
//! stealth_overlay_core::init();
//! let config = Config::load()?;
//! let providers = stealth_overlay_core::providers::from_config(&config)?;
//! // Build a window service and view for the platform, then:
//! let orchestrator = RequestOrchestrator::new(runtime.handle().clone(), providers, service.notifier());
//! let mut app = App::new(service, view, &config, registry, extractor, orchestrator);
//! app.start();
//! ```
//!
//! # Module Structure
//!
//! - [`app`]: Command dispatcher owning all overlay state
//! - [`config`]: Environment and settings-file configuration
//! - [`error`]: Error types and result aliases
//! - [`hit_test`]: Interactive regions and click-through classification
//! - [`render`]: Line classification for the response area

pub mod app;
pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hotkey;
pub mod image_processing;
pub mod ocr;
pub mod orchestrator;
pub mod platform;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod selection;
pub mod snapshot;
pub mod stealth;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use app::App;
pub use capture::ScreenCapturer;
pub use command::Command;
pub use config::{Config, ConfigBuilder};
pub use error::{AppError, Result};
pub use orchestrator::RequestOrchestrator;

/// Loads `.env` files if present. Call once at startup, before
/// [`Config::load`].
pub fn init() {
    let _ = dotenvy::dotenv();
}
