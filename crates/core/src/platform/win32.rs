//! Win32 overlay window.
//!
//! One layered popup window on the message thread. The window procedure
//! only translates: hotkeys become queued [`Command`]s, hit tests are
//! answered from the shared region registry, the wake-up message becomes
//! [`Command::ResponseReady`], and paint requests draw the current
//! [`PaintModel`]. The loop in [`run_message_loop`] hands queued commands to
//! the app after each dispatched message.

use super::{ExStyle, Notifier, OverlayView, WindowId, WindowService};
use crate::app::App;
use crate::capture::ScreenCapturer;
use crate::command::Command;
use crate::config::OverlayConfig;
use crate::error::{AppError, Result};
use crate::geometry::{Point, Rect};
use crate::hit_test::{overlay_registry, HitTest, SharedRegistry};
use crate::hotkey::{HotkeyBinding, HotkeyDispatcher, HotkeyId};
use crate::image_processing::{ImageProcessor, THUMBNAIL_SIZE};
use crate::render::{LineClass, StyledLine};
use crate::selection::SelectionRow;
use image::RgbaImage;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;
use windows::core::w;
use windows::Win32::Foundation::{BOOL, COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWA_EXCLUDED_FROM_PEEK};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateCompatibleBitmap, CreateCompatibleDC, CreateSolidBrush, DeleteDC,
    DeleteObject, EndPaint, FillRect, GetDC, GetDIBits, GetStockObject, IntersectClipRect,
    InvalidateRect, ReleaseDC, SelectObject, SetBkMode, SetTextColor, StretchDIBits, TextOutW,
    ANSI_FIXED_FONT, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DEFAULT_GUI_FONT, DIB_RGB_COLORS, HDC,
    PAINTSTRUCT, SRCCOPY, TRANSPARENT,
};
use windows::Win32::Storage::Xps::{PrintWindow, PRINT_WINDOW_FLAGS};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetForegroundWindow,
    GetMessageW, GetWindowLongW, GetWindowRect, IsWindowVisible, LoadCursorW, PostMessageW,
    PostQuitMessage, RegisterClassW, SetLayeredWindowAttributes, SetWindowDisplayAffinity,
    SetWindowLongW, SetWindowPos, ShowWindow, TranslateMessage, CS_HREDRAW, CS_VREDRAW,
    GWL_EXSTYLE, HMENU, HTCLIENT, HTTRANSPARENT, HWND_TOPMOST, IDC_ARROW, LWA_ALPHA, MSG,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SW_HIDE, SW_SHOWNOACTIVATE,
    WDA_EXCLUDEFROMCAPTURE, WDA_NONE, WINDOW_EX_STYLE, WM_APP, WM_DESTROY, WM_HOTKEY,
    WM_MOUSEWHEEL, WM_NCHITTEST, WM_PAINT, WNDCLASSW, WS_EX_TOPMOST, WS_POPUP,
};

/// Posted by background jobs when a response is waiting.
const WM_APP_RESPONSE_READY: u32 = WM_APP + 1;

const LINE_HEIGHT: i32 = 18;
const SCROLL_LINES: i32 = 3;
const THUMBNAIL_GAP: i32 = 10;

const fn rgb(r: u8, g: u8, b: u8) -> COLORREF {
    COLORREF(r as u32 | (g as u32) << 8 | (b as u32) << 16)
}

const BACKGROUND: COLORREF = rgb(30, 30, 30);
const PANEL: COLORREF = rgb(45, 45, 48);

fn line_color(class: LineClass) -> COLORREF {
    match class {
        LineClass::SectionHeader => rgb(255, 215, 0),
        LineClass::SubHeader => rgb(135, 206, 250),
        LineClass::CodeFence => rgb(128, 128, 128),
        LineClass::Code => rgb(152, 251, 152),
        LineClass::TableRow => rgb(221, 160, 221),
        LineClass::ListItem => rgb(255, 255, 255),
        LineClass::StatusMarker => rgb(144, 238, 144),
        LineClass::Plain => rgb(220, 220, 220),
    }
}

fn hwnd_of(id: WindowId) -> HWND {
    HWND(id.raw() as usize as *mut c_void)
}

fn id_of(hwnd: HWND) -> WindowId {
    WindowId::from_raw(hwnd.0 as usize as u64)
}

fn win_err(context: &str, e: windows::core::Error) -> AppError {
    AppError::platform(format!("{}: {}", context, e))
}

/// Everything the overlay draws.
#[derive(Default)]
struct PaintModel {
    /// BGRA pixels of each thumbnail.
    thumbnails: Vec<Vec<u8>>,
    rows: Vec<SelectionRow>,
    lines: Vec<StyledLine>,
    /// First visible response line.
    scroll: usize,
}

struct WindowState {
    queue: VecDeque<Command>,
    registry: SharedRegistry,
    hotkeys: HotkeyDispatcher,
    model: PaintModel,
    size: (i32, i32),
}

thread_local! {
    static STATE: RefCell<Option<WindowState>> = const { RefCell::new(None) };
}

fn with_state<T>(f: impl FnOnce(&mut WindowState) -> T) -> Option<T> {
    STATE.with(|cell| cell.try_borrow_mut().ok()?.as_mut().map(f))
}

fn take_queued() -> Vec<Command> {
    with_state(|state| state.queue.drain(..).collect()).unwrap_or_default()
}

unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCHITTEST => {
            let screen = Point::new(
                (lparam.0 & 0xFFFF) as i16 as i32,
                ((lparam.0 >> 16) & 0xFFFF) as i16 as i32,
            );
            let mut rect = RECT::default();
            if GetWindowRect(hwnd, &mut rect).is_err() {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            }
            let origin = Point::new(rect.left, rect.top);
            let hit = with_state(|state| {
                state
                    .registry
                    .try_borrow()
                    .map(|registry| registry.classify_screen(screen, origin))
                    .unwrap_or(HitTest::Interactive)
            });
            match hit {
                Some(HitTest::PassThrough) => LRESULT(HTTRANSPARENT as isize),
                _ => LRESULT(HTCLIENT as isize),
            }
        }
        WM_HOTKEY => {
            let id = HotkeyId(wparam.0 as i32);
            with_state(|state| {
                if let Some(command) = state.hotkeys.command_for(id) {
                    state.queue.push_back(command);
                }
            });
            LRESULT(0)
        }
        WM_APP_RESPONSE_READY => {
            with_state(|state| state.queue.push_back(Command::ResponseReady));
            LRESULT(0)
        }
        WM_MOUSEWHEEL => {
            let delta = ((wparam.0 >> 16) & 0xFFFF) as i16 as i32;
            let lines = -(delta / 120) * SCROLL_LINES;
            with_state(|state| {
                let max = state.model.lines.len().saturating_sub(1) as i32;
                let next = (state.model.scroll as i32 + lines).clamp(0, max.max(0));
                state.model.scroll = next as usize;
            });
            let _ = InvalidateRect(hwnd, None, true);
            LRESULT(0)
        }
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            with_state(|state| paint(hdc, state));
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn fill(hdc: HDC, rect: Rect, color: COLORREF) {
    let brush = CreateSolidBrush(color);
    let r = RECT {
        left: rect.x,
        top: rect.y,
        right: rect.right(),
        bottom: rect.bottom(),
    };
    FillRect(hdc, &r, brush);
    let _ = DeleteObject(brush);
}

unsafe fn text(hdc: HDC, x: i32, y: i32, s: &str) {
    let wide: Vec<u16> = s.encode_utf16().collect();
    let _ = TextOutW(hdc, x, y, &wide);
}

unsafe fn paint(hdc: HDC, state: &WindowState) {
    use crate::hit_test::layout::*;

    let (width, height) = state.size;
    fill(hdc, Rect::new(0, 0, width, height), BACKGROUND);
    SetBkMode(hdc, TRANSPARENT);
    SelectObject(hdc, GetStockObject(DEFAULT_GUI_FONT));

    let side = THUMBNAIL_SIZE as i32;
    let bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: side,
            biHeight: -side,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };
    for (i, bgra) in state.model.thumbnails.iter().enumerate() {
        let x = MARGIN + i as i32 * (side + THUMBNAIL_GAP);
        StretchDIBits(
            hdc,
            x,
            MARGIN,
            side,
            side,
            0,
            0,
            side,
            side,
            Some(bgra.as_ptr() as *const c_void),
            &bmi,
            DIB_RGB_COLORS,
            SRCCOPY,
        );
    }

    let label_x = width - MARGIN - LABEL_WIDTH;
    for (i, row) in state.model.rows.iter().enumerate() {
        let y = MARGIN + i as i32 * (LABEL_HEIGHT + LABEL_SPACING);
        if row.active {
            fill(hdc, Rect::new(label_x, y, LABEL_WIDTH, LABEL_HEIGHT), rgb(0, 90, 158));
        }
        SetTextColor(hdc, rgb(255, 255, 255));
        text(hdc, label_x + 6, y + 5, &row.text);
    }

    let area = response_container_size(crate::geometry::Size::new(width, height));
    let panel = Rect::new(MARGIN, RESPONSE_TOP, area.width, area.height);
    fill(hdc, panel, PANEL);
    IntersectClipRect(hdc, panel.x, panel.y, panel.right(), panel.bottom());

    let fixed = GetStockObject(ANSI_FIXED_FONT);
    let proportional = GetStockObject(DEFAULT_GUI_FONT);
    let mut y = panel.y + 6;
    for line in state.model.lines.iter().skip(state.model.scroll) {
        if y > panel.bottom() {
            break;
        }
        let is_code = matches!(line.class, LineClass::Code | LineClass::CodeFence);
        SelectObject(hdc, if is_code { fixed } else { proportional });
        SetTextColor(hdc, line_color(line.class));
        let indent = if line.class == LineClass::ListItem { 16 } else { 6 };
        text(hdc, panel.x + indent, y, &line.text);
        y += LINE_HEIGHT;
    }
}

/// The overlay window and the display copier backing capture.
pub struct Win32Window {
    hwnd: HWND,
    capturer: ScreenCapturer,
}

impl Win32Window {
    /// Creates the hidden overlay window on the calling thread, which
    /// becomes the message thread. Returns the window service, its view and
    /// the region registry the window procedure answers hit tests from.
    pub fn create(config: &OverlayConfig) -> Result<(Self, GdiView, SharedRegistry)> {
        let capturer = ScreenCapturer::new()?;
        let registry: SharedRegistry = Rc::new(RefCell::new(overlay_registry(config.size)));

        STATE.with(|cell| {
            *cell.borrow_mut() = Some(WindowState {
                queue: VecDeque::new(),
                registry: Rc::clone(&registry),
                hotkeys: HotkeyDispatcher::default(),
                model: PaintModel::default(),
                size: (config.size.width, config.size.height),
            });
        });

        let hwnd = unsafe {
            let instance = GetModuleHandleW(None).map_err(|e| win_err("GetModuleHandleW", e))?;
            let class_name = w!("StealthOverlayWindow");
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(overlay_wnd_proc),
                hInstance: instance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: class_name,
                ..Default::default()
            };
            // Zero means already registered, which is fine.
            RegisterClassW(&wc);

            CreateWindowExW(
                WINDOW_EX_STYLE(ExStyle::OVERLAY.bits()) | WS_EX_TOPMOST,
                class_name,
                w!("Stealth Overlay"),
                WS_POPUP,
                config.initial_position.x,
                config.initial_position.y,
                config.size.width,
                config.size.height,
                HWND::default(),
                HMENU::default(),
                instance,
                None,
            )
            .map_err(|e| win_err("CreateWindowExW", e))?
        };
        log::info!("Overlay window created ({}x{})", config.size.width, config.size.height);

        Ok((Self { hwnd, capturer }, GdiView { hwnd }, registry))
    }

    /// Destroys the window, which ends the message loop.
    pub fn destroy(&self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
        STATE.with(|cell| *cell.borrow_mut() = None);
    }
}

impl WindowService for Win32Window {
    fn overlay_id(&self) -> WindowId {
        id_of(self.hwnd)
    }

    fn register_hotkey(&mut self, binding: &HotkeyBinding) -> Result<()> {
        unsafe {
            RegisterHotKey(
                self.hwnd,
                binding.id.0,
                HOT_KEY_MODIFIERS(binding.modifiers.bits() | MOD_NOREPEAT.0),
                binding.key.vk_code(),
            )
        }
        .map_err(|e| AppError::HotkeyRegistration {
            chord: binding.chord().to_string(),
            reason: e.message().to_string(),
        })
    }

    fn unregister_hotkey(&mut self, id: HotkeyId) -> Result<()> {
        unsafe { UnregisterHotKey(self.hwnd, id.0) }.map_err(|e| win_err("UnregisterHotKey", e))
    }

    fn ex_style(&self) -> Result<ExStyle> {
        let bits = unsafe { GetWindowLongW(self.hwnd, GWL_EXSTYLE) };
        if bits == 0 {
            return Err(win_err("GetWindowLongW", windows::core::Error::from_win32()));
        }
        Ok(ExStyle::from_bits(bits as u32))
    }

    fn set_ex_style(&mut self, style: ExStyle) -> Result<()> {
        unsafe {
            SetWindowLongW(self.hwnd, GWL_EXSTYLE, style.bits() as i32);
        }
        Ok(())
    }

    fn set_alpha(&mut self, alpha: u8) -> Result<()> {
        unsafe { SetLayeredWindowAttributes(self.hwnd, COLORREF(0), alpha, LWA_ALPHA) }
            .map_err(|e| win_err("SetLayeredWindowAttributes", e))
    }

    fn set_capture_excluded(&mut self, excluded: bool) -> Result<()> {
        let affinity = if excluded { WDA_EXCLUDEFROMCAPTURE } else { WDA_NONE };
        unsafe { SetWindowDisplayAffinity(self.hwnd, affinity) }
            .map_err(|e| win_err("SetWindowDisplayAffinity", e))?;

        let value = BOOL::from(excluded);
        let peek = unsafe {
            DwmSetWindowAttribute(
                self.hwnd,
                DWMWA_EXCLUDED_FROM_PEEK,
                &value as *const BOOL as *const c_void,
                mem::size_of::<BOOL>() as u32,
            )
        };
        if let Err(e) = peek {
            log::debug!("DWMWA_EXCLUDED_FROM_PEEK not applied: {}", e);
        }
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        unsafe {
            let _ = ShowWindow(self.hwnd, if visible { SW_SHOWNOACTIVATE } else { SW_HIDE });
        }
    }

    fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.hwnd).as_bool() }
    }

    fn raise_topmost(&mut self) -> Result<()> {
        unsafe {
            SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| win_err("SetWindowPos", e))
    }

    fn set_position(&mut self, position: Point) -> Result<()> {
        unsafe {
            SetWindowPos(
                self.hwnd,
                HWND::default(),
                position.x,
                position.y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| win_err("SetWindowPos", e))
    }

    fn foreground_window(&self) -> Option<WindowId> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            None
        } else {
            Some(id_of(hwnd))
        }
    }

    fn window_bounds(&self, window: WindowId) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd_of(window), &mut rect) }.ok()?;
        Some(Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn render_window(&self, window: WindowId, bounds: Rect) -> Result<RgbaImage> {
        let (width, height) = (bounds.width, bounds.height);
        let mut bgra = vec![0u8; width as usize * height as usize * 4];

        let (printed, lines) = unsafe {
            let screen_dc = GetDC(None);
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let old_bitmap = SelectObject(mem_dc, bitmap);

            let printed = PrintWindow(hwnd_of(window), mem_dc, PRINT_WINDOW_FLAGS(0)).as_bool();
            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height, // Top-down DIB
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = if printed {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(bgra.as_mut_ptr() as *mut c_void),
                    &mut bmi,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(mem_dc, old_bitmap);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(None, screen_dc);
            (printed, lines)
        };

        if !printed {
            return Err(AppError::platform("PrintWindow refused the window"));
        }
        if lines == 0 {
            return Err(AppError::platform("GetDIBits failed"));
        }
        ImageProcessor::from_bgra(width as u32, height as u32, bgra)
            .ok_or_else(|| AppError::image("window bitmap size mismatch"))
    }

    fn copy_screen_region(&self, region: Rect) -> Result<RgbaImage> {
        self.capturer.capture_region(region)
    }

    fn copy_primary_display(&self) -> Result<RgbaImage> {
        self.capturer.capture_primary()
    }

    fn notifier(&self) -> Notifier {
        let raw = self.hwnd.0 as isize;
        Arc::new(move || unsafe {
            let _ = PostMessageW(
                HWND(raw as *mut c_void),
                WM_APP_RESPONSE_READY,
                WPARAM(0),
                LPARAM(0),
            );
        })
    }
}

/// Pushes display content into the paint model and schedules a repaint.
pub struct GdiView {
    hwnd: HWND,
}

impl GdiView {
    fn update(&self, f: impl FnOnce(&mut PaintModel)) {
        with_state(|state| f(&mut state.model));
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, true);
        }
    }
}

impl OverlayView for GdiView {
    fn show_thumbnails(&mut self, thumbnails: &[RgbaImage]) {
        let bgra = thumbnails.iter().map(ImageProcessor::to_bgra).collect();
        self.update(|model| model.thumbnails = bgra);
    }

    fn show_selection(&mut self, rows: &[SelectionRow]) {
        let rows = rows.to_vec();
        self.update(|model| model.rows = rows);
    }

    fn show_response(&mut self, lines: Vec<StyledLine>) {
        self.update(|model| {
            model.lines = lines;
            model.scroll = 0;
        });
    }
}

/// Pumps window messages and feeds queued commands to `app` until it
/// quits or the window is destroyed.
pub fn run_message_loop(app: &mut App<Win32Window, GdiView>) {
    let mut msg = MSG::default();
    loop {
        let got = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        if got.0 <= 0 {
            break;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        for command in take_queued() {
            if !app.handle(command) {
                app.service().destroy();
                return;
            }
        }
    }
}
