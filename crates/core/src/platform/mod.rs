//! Platform window/input service.
//!
//! Raw platform handles never leave this module: windows are referred to by
//! the opaque [`WindowId`], and every call that touches the OS goes through
//! [`WindowService`]. One implementation exists per target OS plus a
//! headless one for platforms without an overlay backend.

pub mod headless;
#[cfg(windows)]
pub mod win32;

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::hotkey::{HotkeyBinding, HotkeyId};
use crate::render::StyledLine;
use crate::selection::SelectionRow;
use image::RgbaImage;
use std::ops::BitOr;
use std::sync::Arc;

/// Opaque identifier for a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) const fn raw(self) -> u64 {
        self.0
    }
}

/// Extended window style bits the overlay cares about. Values match the
/// Win32 `WS_EX_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExStyle(u32);

impl ExStyle {
    pub const TRANSPARENT: ExStyle = ExStyle(0x0000_0020);
    pub const TOOL_WINDOW: ExStyle = ExStyle(0x0000_0080);
    pub const LAYERED: ExStyle = ExStyle(0x0008_0000);
    pub const NO_ACTIVATE: ExStyle = ExStyle(0x0800_0000);

    /// The bits the overlay adds on setup. Click-through is decided per
    /// pointer query, so `TRANSPARENT` is deliberately absent.
    pub const OVERLAY: ExStyle =
        ExStyle(Self::LAYERED.0 | Self::TOOL_WINDOW.0 | Self::NO_ACTIVATE.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ExStyle) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ExStyle {
    type Output = ExStyle;

    fn bitor(self, rhs: Self) -> Self::Output {
        ExStyle(self.0 | rhs.0)
    }
}

/// Wakes the message thread from any thread.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Operations the overlay needs from the windowing system.
///
/// All methods are called on the message thread.
pub trait WindowService {
    /// The overlay's own window.
    fn overlay_id(&self) -> WindowId;

    fn register_hotkey(&mut self, binding: &HotkeyBinding) -> Result<()>;
    fn unregister_hotkey(&mut self, id: HotkeyId) -> Result<()>;

    fn ex_style(&self) -> Result<ExStyle>;
    fn set_ex_style(&mut self, style: ExStyle) -> Result<()>;
    fn set_alpha(&mut self, alpha: u8) -> Result<()>;
    /// Sets or clears exclusion from every screen-capture surface.
    fn set_capture_excluded(&mut self, excluded: bool) -> Result<()>;

    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;
    fn raise_topmost(&mut self) -> Result<()>;
    fn set_position(&mut self, position: Point) -> Result<()>;

    fn foreground_window(&self) -> Option<WindowId>;
    /// Screen bounds of a window, if the platform can report them.
    fn window_bounds(&self, window: WindowId) -> Option<Rect>;
    /// Asks the window to render its own content into an image.
    fn render_window(&self, window: WindowId, bounds: Rect) -> Result<RgbaImage>;
    /// Copies a screen-space rectangle straight from the display.
    fn copy_screen_region(&self, region: Rect) -> Result<RgbaImage>;
    /// Copies the entire primary display.
    fn copy_primary_display(&self) -> Result<RgbaImage>;

    /// A callback that wakes the message loop so it drains
    /// [`Command::ResponseReady`](crate::command::Command::ResponseReady).
    fn notifier(&self) -> Notifier;
}

/// Sink for everything the overlay displays. The widget tree behind it is
/// free to lay things out as it likes; it only receives already-classified
/// content.
pub trait OverlayView {
    fn show_thumbnails(&mut self, thumbnails: &[RgbaImage]);
    fn show_selection(&mut self, rows: &[SelectionRow]);
    fn show_response(&mut self, lines: Vec<StyledLine>);
}
