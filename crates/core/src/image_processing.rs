//! Image utilities for the capture pipeline.
//!
//! Window content renders can come back black when the target application
//! draws through a path the platform cannot reproduce (hardware surfaces,
//! protected content). [`BlankCheck`] spots those so the pipeline can fall
//! back to copying the screen directly. Thumbnails for the overlay strip are
//! produced here too.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Edge length of the square thumbnails shown in the overlay strip.
pub const THUMBNAIL_SIZE: u32 = 80;

/// Parameters for classifying a captured image as blank.
///
/// An `sample_size`×`sample_size` block at the top-left corner is scanned;
/// a pixel counts as lit when any colour channel exceeds
/// `channel_threshold`. Fewer than `min_lit_pixels` lit pixels means blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankCheck {
    pub sample_size: u32,
    pub channel_threshold: u8,
    pub min_lit_pixels: usize,
}

impl Default for BlankCheck {
    fn default() -> Self {
        Self {
            sample_size: 10,
            channel_threshold: 10,
            min_lit_pixels: 3,
        }
    }
}

impl BlankCheck {
    /// Number of lit pixels in the sampled corner block.
    pub fn lit_pixels(&self, image: &RgbaImage) -> usize {
        let w = image.width().min(self.sample_size);
        let h = image.height().min(self.sample_size);

        let mut lit = 0;
        for x in 0..w {
            for y in 0..h {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                if r > self.channel_threshold
                    || g > self.channel_threshold
                    || b > self.channel_threshold
                {
                    lit += 1;
                }
            }
        }
        lit
    }

    pub fn is_blank(&self, image: &RgbaImage) -> bool {
        self.lit_pixels(image) < self.min_lit_pixels
    }
}

/// Image processing helpers used by the snapshot store.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Scales an image into a `THUMBNAIL_SIZE` square, stretching as the
    /// thumbnail strip expects.
    pub fn thumbnail(image: &RgbaImage) -> RgbaImage {
        imageops::resize(image, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::CatmullRom)
    }

    /// Converts RGBA pixels to the BGRA order GDI bitmaps use.
    pub fn to_bgra(image: &RgbaImage) -> Vec<u8> {
        let mut out = image.as_raw().clone();
        for px in out.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        out
    }

    /// Builds an RGBA image from a top-down BGRA buffer, as returned by
    /// `GetDIBits`. Alpha is forced opaque since GDI leaves it undefined.
    pub fn from_bgra(width: u32, height: u32, mut bgra: Vec<u8>) -> Option<RgbaImage> {
        for px in bgra.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }
        RgbaImage::from_raw(width, height, bgra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn black_image_is_blank() {
        let img = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        assert!(BlankCheck::default().is_blank(&img));
    }

    #[test]
    fn near_black_below_threshold_is_blank() {
        let img = RgbaImage::from_pixel(50, 50, Rgba([10, 10, 10, 255]));
        assert!(BlankCheck::default().is_blank(&img));
    }

    #[test]
    fn two_lit_pixels_are_still_blank_three_are_not() {
        let check = BlankCheck::default();
        let mut img = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 200, 0, 255]));
        assert_eq!(check.lit_pixels(&img), 2);
        assert!(check.is_blank(&img));

        img.put_pixel(9, 9, Rgba([0, 0, 200, 255]));
        assert!(!check.is_blank(&img));
    }

    #[test]
    fn content_outside_sample_block_is_ignored() {
        let mut img = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        for x in 10..50 {
            img.put_pixel(x, 20, Rgba([255, 255, 255, 255]));
        }
        assert!(BlankCheck::default().is_blank(&img));
    }

    #[test]
    fn tiny_images_are_sampled_within_bounds() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        assert_eq!(BlankCheck::default().lit_pixels(&img), 4);
        assert!(!BlankCheck::default().is_blank(&img));
    }

    #[test]
    fn thumbnail_is_square() {
        let img = RgbaImage::from_pixel(400, 100, Rgba([1, 2, 3, 255]));
        let thumb = ImageProcessor::thumbnail(&img);
        assert_eq!(thumb.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    }

    #[test]
    fn bgra_conversion_swaps_red_and_blue() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        assert_eq!(ImageProcessor::to_bgra(&rgba), vec![3, 2, 1, 4]);

        let back = ImageProcessor::from_bgra(1, 1, vec![3, 2, 1, 0]).unwrap();
        assert_eq!(back.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
