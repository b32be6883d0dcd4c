// THEORY:
// Frames arrive from outside the engine: a video decoder, a camera, a folder
// of stills. This module is the seam. A `Frame` is an immutable, cheaply
// clonable, flat run of `Sample`s plus the dimensions it was captured at; the
// sample buffer is shared (`Arc<[Sample]>`) so batched pixelization can hand
// slices of it to worker tasks without copying.
//
// `ImageSequence` is the in-tree source: it decodes a directory of stills in
// name order, resizes each to the render grid and optionally loops.
//
// Orientation: index 0 is the bottom-left sample. Decoded images are top-down,
// so they are flipped on the way in; the geometry mapper then grows rows away
// from the origin, which keeps the picture upright when viewed from above.

use crate::core_modules::sample::sample::Sample;
use crate::error::{RenderError, RenderResult};
use image::DynamicImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const RGBA_CHANNELS: usize = 4;
const FRAME_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// One frame of samples. Always holds exactly `width * height` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    samples: Arc<[Sample]>,
}

impl Frame {
    /// Wraps `samples`, rejecting a buffer that does not fill `width x height`.
    pub fn new(width: u32, height: u32, samples: Vec<Sample>) -> RenderResult<Self> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(RenderError::frame(format!(
                "expected {expected} samples for {width}x{height}, got {}",
                samples.len()
            )));
        }
        Ok(Self::from_parts(width, height, samples))
    }

    fn from_parts(width: u32, height: u32, samples: Vec<Sample>) -> Self {
        Self {
            width,
            height,
            samples: samples.into(),
        }
    }

    /// A frame with no samples.
    pub fn empty() -> Self {
        Self::from_parts(0, 0, Vec::new())
    }

    /// Reads a tightly packed RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> RenderResult<Self> {
        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if bytes.len() != expected {
            return Err(RenderError::frame(format!(
                "expected {expected} RGBA bytes for {width}x{height}, got {}",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(RGBA_CHANNELS)
            .filter_map(Sample::from_bytes)
            .collect();
        Self::new(width, height, samples)
    }

    /// Resizes a decoded image to the grid and reads it bottom row first.
    pub fn from_image(image: &DynamicImage, grid_width: u32, grid_height: u32) -> Self {
        let rgba = image.to_rgba8();
        let resized = if rgba.dimensions() == (grid_width, grid_height) {
            rgba
        } else {
            imageops::resize(&rgba, grid_width, grid_height, FilterType::Triangle)
        };
        let flipped = imageops::flip_vertical(&resized);
        let samples = flipped.pixels().map(|p| Sample::from(*p)).collect();
        Self::from_parts(grid_width, grid_height, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub(crate) fn shared_samples(&self) -> Arc<[Sample]> {
        Arc::clone(&self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Anything that can produce frames on demand.
pub trait FrameSource {
    /// The next frame, `None` once the source is exhausted.
    fn next_frame(&mut self) -> Option<RenderResult<Frame>>;
}

/// Plays a directory of still images as a frame sequence.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    cursor: usize,
    grid_width: u32,
    grid_height: u32,
    looping: bool,
}

impl ImageSequence {
    pub fn open(
        dir: impl AsRef<Path>,
        grid_width: u32,
        grid_height: u32,
        looping: bool,
    ) -> RenderResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_frame_file(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(RenderError::frame(format!(
                "no frames found in {}",
                dir.display()
            )));
        }
        paths.sort();
        tracing::info!(frames = paths.len(), dir = %dir.display(), "opened image sequence");
        Ok(Self {
            paths,
            cursor: 0,
            grid_width,
            grid_height,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Option<RenderResult<Frame>> {
        if self.cursor >= self.paths.len() {
            if !self.looping {
                return None;
            }
            self.cursor = 0;
        }
        let path = &self.paths[self.cursor];
        self.cursor += 1;
        Some(
            image::open(path)
                .map(|img| Frame::from_image(&img, self.grid_width, self.grid_height))
                .map_err(RenderError::from),
        )
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path, width: u32, height: u32, level: u8) {
        RgbaImage::from_pixel(width, height, Rgba([level, level, level, 255]))
            .save(path)
            .expect("write test frame");
    }

    #[test]
    fn rgba_buffer_must_match_dimensions() {
        let frame = Frame::from_rgba8(2, 1, &[1, 2, 3, 255, 4, 5, 6, 0]).expect("valid");
        assert_eq!(frame.samples(), &[Sample::new(1, 2, 3), Sample::new(4, 5, 6)]);
        assert!(matches!(
            Frame::from_rgba8(2, 2, &[0; 8]),
            Err(RenderError::Frame(_))
        ));
    }

    #[test]
    fn sample_count_must_fill_the_frame() {
        let frame = Frame::new(3, 2, vec![Sample::WHITE; 6]).expect("3x2 samples");
        assert_eq!((frame.width(), frame.height(), frame.len()), (3, 2, 6));
        assert!(matches!(
            Frame::new(3, 3, vec![Sample::WHITE; 8]),
            Err(RenderError::Frame(_))
        ));
        assert!(matches!(
            Frame::new(0, 4, vec![Sample::BLACK]),
            Err(RenderError::Frame(_))
        ));
        assert!(Frame::new(0, 0, Vec::new()).expect("empty").is_empty());
    }

    #[test]
    fn image_is_read_bottom_row_first() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // top-left
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255])); // bottom-left
        let frame = Frame::from_image(&DynamicImage::ImageRgba8(img), 2, 2);
        assert_eq!(frame.samples()[0], Sample::new(0, 0, 255));
        assert_eq!(frame.samples()[2], Sample::new(255, 0, 0));
    }

    #[test]
    fn image_is_resized_to_grid() {
        let img = RgbaImage::from_pixel(40, 30, Rgba([200, 200, 200, 255]));
        let frame = Frame::from_image(&DynamicImage::ImageRgba8(img), 8, 6);
        assert_eq!((frame.width(), frame.height(), frame.len()), (8, 6, 48));
        assert!(frame.samples().iter().all(|s| *s == Sample::gray(200)));
    }

    #[test]
    fn sequence_plays_in_name_order_and_stops() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(&dir.path().join("frame_002.png"), 4, 4, 255);
        write_png(&dir.path().join("frame_001.png"), 4, 4, 0);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").expect("write");

        let mut seq = ImageSequence::open(dir.path(), 2, 2, false).expect("open");
        assert_eq!(seq.len(), 2);
        let first = seq.next_frame().expect("first").expect("decodes");
        let second = seq.next_frame().expect("second").expect("decodes");
        assert_eq!(first.samples()[0], Sample::BLACK);
        assert_eq!(second.samples()[0], Sample::WHITE);
        assert!(seq.next_frame().is_none());
    }

    #[test]
    fn looping_sequence_wraps_around() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(&dir.path().join("only.png"), 2, 2, 90);
        let mut seq = ImageSequence::open(dir.path(), 2, 2, true).expect("open");
        for _ in 0..3 {
            assert!(seq.next_frame().expect("never ends").is_ok());
        }
    }

    #[test]
    fn empty_directory_is_a_frame_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            ImageSequence::open(dir.path(), 2, 2, false),
            Err(RenderError::Frame(_))
        ));
    }
}
