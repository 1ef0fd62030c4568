//! The dispatcher that owns all overlay state.
//!
//! Every platform event arrives as a [`Command`] and is handled here, on the
//! message thread, one at a time. Nothing in [`App`] is shared with other
//! threads: background requests only see owned prompt strings and report
//! back through the orchestrator's channel.

use crate::capture::CapturePipeline;
use crate::command::Command;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::hit_test::{RegionId, SharedRegistry};
use crate::hotkey::HotkeyDispatcher;
use crate::ocr::TextExtractor;
use crate::orchestrator::RequestOrchestrator;
use crate::platform::{OverlayView, WindowService};
use crate::render::classify_lines;
use crate::selection::{Dimension, SelectionState};
use crate::snapshot::{AccumulatedCorpus, Snapshot, SnapshotStore};
use crate::stealth::OverlayController;
use std::sync::mpsc::Receiver;

pub const INITIAL_STATUS: &str =
    "No analysis generated yet. Take screenshots and press Ctrl+Space to analyze.";
pub const CAPTURED_STATUS: &str = "Screenshots captured. Press Ctrl+Space to analyze.";
pub const NO_TEXT_TO_VIEW: &str = "No text has been extracted yet. Take some screenshots first!";

type ClipboardWriter = Box<dyn FnMut(&str) -> Result<()>>;

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| AppError::Clipboard(format!("Failed to open clipboard: {}", e)))?;
    clipboard
        .set_text(text)
        .map_err(|e| AppError::Clipboard(format!("Failed to set clipboard text: {}", e)))
}

pub struct App<W: WindowService, V: OverlayView> {
    service: W,
    view: V,
    overlay: OverlayController,
    hotkeys: HotkeyDispatcher,
    registry: SharedRegistry,
    pipeline: CapturePipeline,
    extractor: Box<dyn TextExtractor>,
    snapshots: SnapshotStore,
    corpus: AccumulatedCorpus,
    selection: SelectionState,
    orchestrator: RequestOrchestrator,
    clipboard: ClipboardWriter,
    response: String,
}

impl<W: WindowService, V: OverlayView> App<W, V> {
    pub fn new(
        service: W,
        view: V,
        config: &Config,
        registry: SharedRegistry,
        extractor: Box<dyn TextExtractor>,
        orchestrator: RequestOrchestrator,
    ) -> Self {
        Self {
            service,
            view,
            overlay: OverlayController::new(&config.overlay),
            hotkeys: HotkeyDispatcher::default(),
            registry,
            pipeline: CapturePipeline::new(&config.capture),
            extractor,
            snapshots: SnapshotStore::new(),
            corpus: AccumulatedCorpus::new(),
            selection: SelectionState::default(),
            orchestrator,
            clipboard: Box::new(copy_to_clipboard),
            response: String::new(),
        }
    }

    /// Applies window attributes, registers hotkeys and draws the initial
    /// content. Returns the number of active hotkeys.
    pub fn start(&mut self) -> usize {
        self.overlay.setup(&mut self.service);
        let active = self.hotkeys.register_all(&mut self.service);
        self.view.show_selection(&self.selection.rows());
        self.view.show_thumbnails(self.snapshots.thumbnails());
        self.set_response(INITIAL_STATUS.to_string());
        active
    }

    /// Sets a selection value by name; returns whether it was offered.
    pub fn select(&mut self, dimension: Dimension, value: &str) -> bool {
        let found = self.selection.dimension_mut(dimension).select(value);
        if found {
            self.view.show_selection(&self.selection.rows());
        }
        found
    }

    /// Handles one command. Returns `false` once the app should exit.
    pub fn handle(&mut self, command: Command) -> bool {
        log::debug!("Command: {:?}", command);
        match command {
            Command::ToggleVisibility => {
                self.overlay.toggle(&mut self.service);
            }
            Command::Move(direction) => self.overlay.move_by(&mut self.service, direction),
            Command::Capture => self.capture(),
            Command::ClearSnapshots => self.clear(),
            Command::SendRequest => {
                let dispatch = self.orchestrator.dispatch(&self.corpus, &self.selection);
                self.set_response(dispatch.message().to_string());
            }
            Command::AdvanceDimension => {
                self.selection.advance_dimension();
                self.view.show_selection(&self.selection.rows());
            }
            Command::AdvanceValue => {
                self.selection.advance_value();
                self.view.show_selection(&self.selection.rows());
            }
            Command::ViewText => self.view_text(),
            Command::ResponseReady => {
                if let Some(text) = self.orchestrator.drain() {
                    self.set_response(text);
                }
            }
            Command::Quit => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Handles commands until `Quit` or until every sender is gone.
    pub fn run_queue(&mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            if !self.handle(command) {
                return;
            }
        }
        self.shutdown();
    }

    fn capture(&mut self) {
        match self.pipeline.capture(&mut self.service) {
            Ok(snapshot) => self.record(snapshot),
            Err(e) => log::error!("Capture failed: {}", e),
        }
    }

    fn record(&mut self, mut snapshot: Snapshot) {
        let text = self.extractor.extract(&snapshot.image);
        if !text.trim().is_empty() {
            snapshot.text = Some(text.clone());
        }
        log::info!(
            "Snapshot {}x{} from {:?}",
            snapshot.width,
            snapshot.height,
            snapshot.source
        );
        let index = self.snapshots.push(snapshot);
        if self.corpus.append(index, &text) && self.response == INITIAL_STATUS {
            self.set_response(CAPTURED_STATUS.to_string());
        }
        self.refresh_thumbnails();
    }

    fn clear(&mut self) {
        self.snapshots.clear();
        self.corpus.clear();
        self.refresh_thumbnails();
        self.set_response(INITIAL_STATUS.to_string());
        log::info!("Cleared snapshots and extracted text");
    }

    fn refresh_thumbnails(&mut self) {
        self.snapshots.regenerate_thumbnails();
        self.view.show_thumbnails(self.snapshots.thumbnails());
        self.registry
            .borrow_mut()
            .set_visible(RegionId::ThumbnailStrip, !self.snapshots.is_empty());
    }

    fn view_text(&mut self) {
        if self.corpus.is_empty() {
            self.set_response(NO_TEXT_TO_VIEW.to_string());
            return;
        }
        let text = self.corpus.render();
        match (self.clipboard)(&text) {
            Ok(()) => log::info!("Copied {} chars of extracted text to the clipboard", text.len()),
            Err(e) => log::warn!("{}", e),
        }
        self.set_response(text);
    }

    fn set_response(&mut self, text: String) {
        self.view.show_response(classify_lines(&text));
        self.response = text;
    }

    fn shutdown(&mut self) {
        self.hotkeys.unregister_all(&mut self.service);
        self.overlay.shutdown(&mut self.service);
        log::info!("Shut down");
    }

    pub fn service(&self) -> &W {
        &self.service
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn corpus(&self) -> &AccumulatedCorpus {
        &self.corpus
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}
