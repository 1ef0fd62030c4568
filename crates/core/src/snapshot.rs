//! Captured snapshots and the text accumulated from them.

use crate::geometry::Rect;
use crate::image_processing::ImageProcessor;
use chrono::{DateTime, Local};
use image::RgbaImage;

/// Where a snapshot's pixels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    /// The window rendered its own content.
    Window(Rect),
    /// The window's screen area copied from the display.
    ScreenRegion(Rect),
    FullScreen,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
    pub source: CaptureSource,
    pub captured_at: DateTime<Local>,
    /// Text extracted from the image, if any was found.
    pub text: Option<String>,
}

impl Snapshot {
    pub fn new(image: RgbaImage, source: CaptureSource) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
            source,
            captured_at: Local::now(),
            text: None,
        }
    }
}

/// Ordered snapshots plus their thumbnails.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
    thumbnails: Vec<RgbaImage>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot and returns its 1-based index.
    pub fn push(&mut self, snapshot: Snapshot) -> usize {
        self.snapshots.push(snapshot);
        self.snapshots.len()
    }

    /// Rebuilds every thumbnail from the current snapshots.
    pub fn regenerate_thumbnails(&mut self) {
        self.thumbnails = self
            .snapshots
            .iter()
            .map(|s| ImageProcessor::thumbnail(&s.image))
            .collect();
    }

    pub fn thumbnails(&self) -> &[RgbaImage] {
        &self.thumbnails
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.thumbnails.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// 1-based index of the snapshot the text came from.
    pub snapshot: usize,
    pub text: String,
}

/// Append-only record of extracted text until cleared.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedCorpus {
    blocks: Vec<TextBlock>,
}

impl AccumulatedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` for the given snapshot. Whitespace-only text is
    /// dropped; returns whether a block was added.
    pub fn append(&mut self, snapshot: usize, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.blocks.push(TextBlock {
            snapshot,
            text: trimmed.to_string(),
        });
        true
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// The corpus as sent to providers: one headed block per snapshot.
    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(|b| format!("\n--- Screenshot {} ---\n{}\n", b.snapshot, b.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::THUMBNAIL_SIZE;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    #[test]
    fn corpus_renders_headed_blocks() {
        let mut corpus = AccumulatedCorpus::new();
        assert!(corpus.append(1, "  two sum  \n"));
        assert!(!corpus.append(2, " \n\t"));
        assert!(corpus.append(3, "binary search"));

        assert_eq!(
            corpus.render(),
            "\n--- Screenshot 1 ---\ntwo sum\n\n--- Screenshot 3 ---\nbinary search\n"
        );
        assert_eq!(corpus.blocks()[1].snapshot, 3);
    }

    #[test]
    fn empty_corpus_renders_nothing() {
        let mut corpus = AccumulatedCorpus::new();
        assert!(corpus.is_empty());
        assert_eq!(corpus.render(), "");
        corpus.append(1, "x");
        corpus.clear();
        assert!(corpus.is_empty());
    }

    #[test]
    fn store_tracks_thumbnails_and_clears() {
        let mut store = SnapshotStore::new();
        let image = RgbaImage::from_pixel(200, 100, Rgba([9, 9, 9, 255]));
        assert_eq!(store.push(Snapshot::new(image.clone(), CaptureSource::FullScreen)), 1);
        assert_eq!(store.push(Snapshot::new(image, CaptureSource::FullScreen)), 2);
        store.regenerate_thumbnails();

        assert_eq!(store.thumbnails().len(), 2);
        assert_eq!(store.thumbnails()[0].width(), THUMBNAIL_SIZE);
        assert_eq!(store.snapshots()[0].width, 200);

        store.clear();
        assert!(store.is_empty());
        assert!(store.thumbnails().is_empty());
    }
}
