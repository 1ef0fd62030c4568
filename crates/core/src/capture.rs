//! Screen capture.
//!
//! [`ScreenCapturer`] copies pixels straight from the display through the
//! `screenshots` crate and backs the display-copy operations of every
//! window service. [`CapturePipeline`] runs the snapshot fallback chain:
//!
//! 1. the foreground window (re-queried with the overlay hidden if the
//!    overlay itself has focus),
//! 2. its bounds, skipping to 4 if they are unknown or empty,
//! 3. the window's own rendering, or a copy of its screen area if the
//!    rendering is refused or blank,
//! 4. the whole primary display.
//!
//! The overlay is hidden around every attempt so it never shows up in its
//! own captures.

use crate::config::CaptureConfig;
use crate::error::{AppError, Result};
use crate::geometry::Rect;
use crate::image_processing::BlankCheck;
use crate::platform::{WindowId, WindowService};
use crate::snapshot::{CaptureSource, Snapshot};
use image::RgbaImage;
use screenshots::Screen;
use std::thread;
use std::time::Duration;

/// Display copier over the `screenshots` crate.
pub struct ScreenCapturer {
    screens: Vec<Screen>,
}

impl ScreenCapturer {
    /// Enumerates the attached displays.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ScreenCapture`] if enumeration fails or no
    /// display is attached.
    pub fn new() -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }

        Ok(Self { screens })
    }

    /// Human-readable description of each display.
    pub fn list_screens(&self) -> Vec<String> {
        self.screens
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "Monitor {}: {}x{} at ({}, {}) (scale: {}){}",
                    i,
                    s.display_info.width,
                    s.display_info.height,
                    s.display_info.x,
                    s.display_info.y,
                    s.display_info.scale_factor,
                    if s.display_info.is_primary { " primary" } else { "" }
                )
            })
            .collect()
    }

    fn primary(&self) -> Result<&Screen> {
        self.screens
            .iter()
            .find(|s| s.display_info.is_primary)
            .or_else(|| self.screens.first())
            .ok_or(AppError::ScreenNotFound(0))
    }

    /// Copies the entire primary display.
    pub fn capture_primary(&self) -> Result<RgbaImage> {
        let captured = self
            .primary()?
            .capture()
            .map_err(|e| AppError::capture(format!("Failed to capture screen: {}", e)))?;

        let (width, height) = (captured.width(), captured.height());
        RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))
    }

    /// Copies a rectangle given in virtual-screen coordinates from the
    /// display containing its centre, clipped to that display. Maximized
    /// windows report bounds a few pixels past the display edges.
    pub fn capture_region(&self, region: Rect) -> Result<RgbaImage> {
        if !region.has_positive_area() {
            return Err(AppError::capture(format!("Empty capture region {:?}", region)));
        }
        let center = region.center();
        let screen = match Screen::from_point(center.x, center.y) {
            Ok(screen) => screen,
            Err(e) => {
                log::debug!("No display at ({}, {}): {}; using primary", center.x, center.y, e);
                self.primary()?.clone()
            }
        };

        let info = screen.display_info;
        let display = Rect::new(info.x, info.y, info.width as i32, info.height as i32);
        let area = display_area(region, display)?;
        let captured = screen
            .capture_area(area.x, area.y, area.width as u32, area.height as u32)
            .map_err(|e| AppError::capture(format!("Failed to capture region: {}", e)))?;

        let (width, height) = (captured.width(), captured.height());
        RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))
    }
}

/// Clips `region` to `display` and makes it display-relative.
fn display_area(region: Rect, display: Rect) -> Result<Rect> {
    let clipped = region.intersection(&display).ok_or_else(|| {
        AppError::capture(format!("Region {:?} lies outside display {:?}", region, display))
    })?;
    Ok(clipped.translated(-display.x, -display.y))
}

/// Runs `f` with the overlay hidden and the settle delay elapsed, then
/// restores the previous visibility.
fn hidden<W, T>(service: &mut W, settle: Duration, f: impl FnOnce(&mut W) -> T) -> T
where
    W: WindowService + ?Sized,
{
    let was_visible = service.is_visible();
    if was_visible {
        service.set_visible(false);
    }
    if !settle.is_zero() {
        thread::sleep(settle);
    }
    let out = f(service);
    if was_visible {
        service.set_visible(true);
        if let Err(e) = service.set_capture_excluded(true) {
            log::warn!("Capture exclusion not reapplied: {}", e);
        }
    }
    out
}

/// The snapshot fallback chain.
pub struct CapturePipeline {
    settle_delay: Duration,
    full_screen_settle_delay: Duration,
    blank: BlankCheck,
}

impl CapturePipeline {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            settle_delay: config.settle_delay,
            full_screen_settle_delay: config.full_screen_settle_delay,
            blank: config.blank,
        }
    }

    /// Produces one snapshot. Only a failure of the final full-screen copy
    /// is returned as an error.
    pub fn capture<W: WindowService + ?Sized>(&self, service: &mut W) -> Result<Snapshot> {
        match self.target_window(service) {
            Some((window, bounds)) => self.capture_window(service, window, bounds),
            None => self.capture_full_screen(service),
        }
    }

    /// Foreground window other than the overlay, with non-empty bounds.
    fn target_window<W: WindowService + ?Sized>(&self, service: &mut W) -> Option<(WindowId, Rect)> {
        let overlay = service.overlay_id();
        let mut window = service.foreground_window();
        if window == Some(overlay) {
            log::debug!("Overlay has focus; re-querying with it hidden");
            window = hidden(service, self.settle_delay, |s| s.foreground_window());
        }

        let Some(window) = window else {
            log::info!("No foreground window; capturing full screen");
            return None;
        };
        match service.window_bounds(window) {
            Some(bounds) if bounds.has_positive_area() => Some((window, bounds)),
            Some(bounds) => {
                log::info!("Foreground window has empty bounds {:?}; capturing full screen", bounds);
                None
            }
            None => {
                log::info!("Foreground window bounds unavailable; capturing full screen");
                None
            }
        }
    }

    fn capture_window<W: WindowService + ?Sized>(
        &self,
        service: &mut W,
        window: WindowId,
        bounds: Rect,
    ) -> Result<Snapshot> {
        let rendered = hidden(service, self.settle_delay, |s| s.render_window(window, bounds));
        match rendered {
            Ok(image) if !self.blank.is_blank(&image) => {
                log::debug!("Captured window content {}x{}", image.width(), image.height());
                return Ok(Snapshot::new(image, CaptureSource::Window(bounds)));
            }
            Ok(_) => log::info!("Window rendering is blank; copying its screen region"),
            Err(e) => log::info!("Window rendering refused ({}); copying its screen region", e),
        }

        match hidden(service, self.settle_delay, |s| s.copy_screen_region(bounds)) {
            Ok(image) => Ok(Snapshot::new(image, CaptureSource::ScreenRegion(bounds))),
            Err(e) => {
                log::warn!("Screen region copy failed ({}); capturing full screen", e);
                self.capture_full_screen(service)
            }
        }
    }

    fn capture_full_screen<W: WindowService + ?Sized>(&self, service: &mut W) -> Result<Snapshot> {
        let image = hidden(service, self.full_screen_settle_delay, |s| {
            s.copy_primary_display()
        })?;
        Ok(Snapshot::new(image, CaptureSource::FullScreen))
    }
}
