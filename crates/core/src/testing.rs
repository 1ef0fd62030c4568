//! In-memory window service and view for unit tests.

use crate::error::{AppError, Result};
use crate::geometry::{Point, Rect};
use crate::hotkey::{HotkeyBinding, HotkeyId};
use crate::platform::{ExStyle, Notifier, OverlayView, WindowId, WindowService};
use crate::render::StyledLine;
use crate::selection::SelectionRow;
use image::{imageops, Rgba, RgbaImage};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const OVERLAY_WINDOW: WindowId = WindowId::from_raw(1);
pub(crate) const OTHER_WINDOW: WindowId = WindowId::from_raw(2);

pub(crate) struct FakeWindow {
    pub overlay: WindowId,
    pub hotkeys: HashSet<HotkeyId>,
    pub reject_hotkeys: HashSet<HotkeyId>,
    pub ex_style: ExStyle,
    pub alpha: u8,
    pub capture_excluded: bool,
    pub fail_capture_exclusion: bool,
    pub visible: bool,
    pub raise_count: usize,
    pub position: Point,
    pub foreground: Option<WindowId>,
    /// Returned by `foreground_window` while the overlay is hidden.
    pub foreground_when_hidden: Option<WindowId>,
    pub bounds: HashMap<WindowId, Rect>,
    /// `None` makes window rendering fail.
    pub rendered: Option<RgbaImage>,
    pub screen: RgbaImage,
    pub fail_primary: bool,
    pub region_copies: RefCell<Vec<Rect>>,
    pub wakes: Arc<AtomicUsize>,
}

impl Default for FakeWindow {
    fn default() -> Self {
        Self {
            overlay: OVERLAY_WINDOW,
            hotkeys: HashSet::new(),
            reject_hotkeys: HashSet::new(),
            ex_style: ExStyle::default(),
            alpha: 255,
            capture_excluded: false,
            fail_capture_exclusion: false,
            visible: false,
            raise_count: 0,
            position: Point::default(),
            foreground: None,
            foreground_when_hidden: None,
            bounds: HashMap::new(),
            rendered: None,
            screen: RgbaImage::from_pixel(320, 200, Rgba([180, 180, 180, 255])),
            fail_primary: false,
            region_copies: RefCell::new(Vec::new()),
            wakes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeWindow {
    /// A service whose foreground window is another app at `bounds`.
    pub fn with_target(bounds: Rect) -> Self {
        let mut window = Self::default();
        window.foreground = Some(OTHER_WINDOW);
        window.bounds.insert(OTHER_WINDOW, bounds);
        window
    }
}

impl WindowService for FakeWindow {
    fn overlay_id(&self) -> WindowId {
        self.overlay
    }

    fn register_hotkey(&mut self, binding: &HotkeyBinding) -> Result<()> {
        if self.reject_hotkeys.contains(&binding.id) {
            return Err(AppError::HotkeyRegistration {
                chord: binding.chord().to_string(),
                reason: "already registered".into(),
            });
        }
        self.hotkeys.insert(binding.id);
        Ok(())
    }

    fn unregister_hotkey(&mut self, id: HotkeyId) -> Result<()> {
        self.hotkeys.remove(&id);
        Ok(())
    }

    fn ex_style(&self) -> Result<ExStyle> {
        Ok(self.ex_style)
    }

    fn set_ex_style(&mut self, style: ExStyle) -> Result<()> {
        self.ex_style = style;
        Ok(())
    }

    fn set_alpha(&mut self, alpha: u8) -> Result<()> {
        self.alpha = alpha;
        Ok(())
    }

    fn set_capture_excluded(&mut self, excluded: bool) -> Result<()> {
        if self.fail_capture_exclusion {
            return Err(AppError::platform("display affinity not supported"));
        }
        self.capture_excluded = excluded;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn raise_topmost(&mut self) -> Result<()> {
        self.raise_count += 1;
        Ok(())
    }

    fn set_position(&mut self, position: Point) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn foreground_window(&self) -> Option<WindowId> {
        if !self.visible && self.foreground_when_hidden.is_some() {
            return self.foreground_when_hidden;
        }
        self.foreground
    }

    fn window_bounds(&self, window: WindowId) -> Option<Rect> {
        self.bounds.get(&window).copied()
    }

    fn render_window(&self, _window: WindowId, _bounds: Rect) -> Result<RgbaImage> {
        if self.visible {
            return Err(AppError::platform("rendered while the overlay was showing"));
        }
        self.rendered
            .clone()
            .ok_or_else(|| AppError::platform("PrintWindow refused"))
    }

    fn copy_screen_region(&self, region: Rect) -> Result<RgbaImage> {
        if self.visible {
            return Err(AppError::platform("copied while the overlay was showing"));
        }
        self.region_copies.borrow_mut().push(region);
        Ok(imageops::crop_imm(
            &self.screen,
            region.x.max(0) as u32,
            region.y.max(0) as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image())
    }

    fn copy_primary_display(&self) -> Result<RgbaImage> {
        if self.fail_primary {
            return Err(AppError::capture("display unavailable"));
        }
        Ok(self.screen.clone())
    }

    fn notifier(&self) -> Notifier {
        let wakes = Arc::clone(&self.wakes);
        Arc::new(move || {
            wakes.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Records whatever the app last showed.
#[derive(Default)]
pub(crate) struct RecordingView {
    pub thumbnails: usize,
    pub rows: Vec<SelectionRow>,
    pub response: Vec<StyledLine>,
}

impl RecordingView {
    pub fn response_text(&self) -> String {
        self.response
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OverlayView for RecordingView {
    fn show_thumbnails(&mut self, thumbnails: &[RgbaImage]) {
        self.thumbnails = thumbnails.len();
    }

    fn show_selection(&mut self, rows: &[SelectionRow]) {
        self.rows = rows.to_vec();
    }

    fn show_response(&mut self, lines: Vec<StyledLine>) {
        self.response = lines;
    }
}
