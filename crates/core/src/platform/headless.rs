//! Window service for platforms without an overlay backend.
//!
//! There is no window: visibility and position are only tracked, nothing
//! reports as foreground, so every capture copies the primary display. Key
//! chords are observed by the binary and fed in as commands. Responses are
//! printed to the terminal.

use super::{ExStyle, Notifier, OverlayView, WindowId, WindowService};
use crate::capture::ScreenCapturer;
use crate::command::Command;
use crate::error::{AppError, Result};
use crate::geometry::{Point, Rect};
use crate::hotkey::{HotkeyBinding, HotkeyId};
use crate::render::{LineClass, StyledLine};
use crate::selection::SelectionRow;
use image::RgbaImage;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

const HEADLESS_ID: WindowId = WindowId::from_raw(0);

pub struct HeadlessWindow {
    capturer: ScreenCapturer,
    commands: Sender<Command>,
    style: ExStyle,
    visible: bool,
    position: Point,
}

impl HeadlessWindow {
    /// `commands` is the queue the app drains; response wake-ups are posted
    /// to it as [`Command::ResponseReady`].
    pub fn new(commands: Sender<Command>) -> Result<Self> {
        let capturer = ScreenCapturer::new()?;
        for screen in capturer.list_screens() {
            log::info!("{}", screen);
        }
        Ok(Self {
            capturer,
            commands,
            style: ExStyle::default(),
            visible: false,
            position: Point::default(),
        })
    }
}

impl WindowService for HeadlessWindow {
    fn overlay_id(&self) -> WindowId {
        HEADLESS_ID
    }

    fn register_hotkey(&mut self, binding: &HotkeyBinding) -> Result<()> {
        log::debug!("Listening for {}", binding.chord());
        Ok(())
    }

    fn unregister_hotkey(&mut self, _id: HotkeyId) -> Result<()> {
        Ok(())
    }

    fn ex_style(&self) -> Result<ExStyle> {
        Ok(self.style)
    }

    fn set_ex_style(&mut self, style: ExStyle) -> Result<()> {
        self.style = style;
        Ok(())
    }

    fn set_alpha(&mut self, _alpha: u8) -> Result<()> {
        Ok(())
    }

    fn set_capture_excluded(&mut self, _excluded: bool) -> Result<()> {
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn raise_topmost(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_position(&mut self, position: Point) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn foreground_window(&self) -> Option<WindowId> {
        None
    }

    fn window_bounds(&self, _window: WindowId) -> Option<Rect> {
        None
    }

    fn render_window(&self, _window: WindowId, _bounds: Rect) -> Result<RgbaImage> {
        Err(AppError::platform("window rendering is not available headless"))
    }

    fn copy_screen_region(&self, region: Rect) -> Result<RgbaImage> {
        self.capturer.capture_region(region)
    }

    fn copy_primary_display(&self) -> Result<RgbaImage> {
        self.capturer.capture_primary()
    }

    fn notifier(&self) -> Notifier {
        let commands = Mutex::new(self.commands.clone());
        Arc::new(move || {
            if let Ok(tx) = commands.lock() {
                let _ = tx.send(Command::ResponseReady);
            }
        })
    }
}

/// Prints the response area to stdout.
#[derive(Default)]
pub struct TerminalView;

impl OverlayView for TerminalView {
    fn show_thumbnails(&mut self, thumbnails: &[RgbaImage]) {
        log::info!("{} snapshot(s) held", thumbnails.len());
    }

    fn show_selection(&mut self, rows: &[SelectionRow]) {
        let line: Vec<String> = rows
            .iter()
            .map(|r| {
                if r.active {
                    format!("[{}]", r.text)
                } else {
                    r.text.clone()
                }
            })
            .collect();
        log::info!("{}", line.join("  "));
    }

    fn show_response(&mut self, lines: Vec<StyledLine>) {
        println!();
        for line in lines {
            match line.class {
                LineClass::SectionHeader => println!("== {} ==", line.text.trim_matches('*')),
                LineClass::CodeFence => println!("{}", "-".repeat(40)),
                _ => println!("{}", line.text),
            }
        }
    }
}
