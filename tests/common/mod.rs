//! Shared fixtures for the integration tests: synthesized images written to disk
//! and small codecs for counting or failing encodes.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageBuffer, ImageEncoder, Rgb, RgbImage};
use image_budget::{CompressError, CompressResult, EncodeTarget, ImageCodec, StandardCodec};

/// Deterministic pseudo-random noise; compresses poorly so files stay large.
pub fn noise_image(w: u32, h: u32, seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

/// Smooth gradient; compresses well losslessly.
pub fn gradient_image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, ((x + y) % 256) as u8])
    }))
}

/// 16-bit gradient whose low byte varies, so narrowing to 8 bits is visible.
pub fn gradient_image16(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb16(ImageBuffer::from_fn(w, h, |x, y| {
        Rgb([
            (x * 65_535 / w) as u16,
            (y * 65_535 / h) as u16,
            ((x * 257 + y * 3) % 65_536) as u16,
        ])
    }))
}

pub fn write_jpeg(path: &Path, image: &DynamicImage, quality: u8) -> PathBuf {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// PNG written with the fastest, unfiltered settings so recompression has room to win.
/// The image's own channel layout and bit depth are kept.
pub fn write_loose_png(path: &Path, image: &DynamicImage) -> PathBuf {
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, CompressionType::Fast, FilterType::NoFilter)
        .write_image(image.as_bytes(), image.width(), image.height(), image.color().into())
        .unwrap();
    fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// Size of `image` encoded by the production codec.
pub fn encoded_len(image: &DynamicImage, target: EncodeTarget) -> u64 {
    let mut out = Vec::new();
    StandardCodec.encode(image, target, &mut out).unwrap();
    out.len() as u64
}

/// Smallest whole-KB budget that an encoded length fits into.
pub fn budget_kb_for(len: u64) -> u64 {
    len.div_ceil(1024)
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Delegates to the production codec and records every call.
#[derive(Default)]
pub struct CountingCodec {
    pub decodes: Cell<usize>,
    pub encodes: RefCell<Vec<EncodeTarget>>,
}

impl CountingCodec {
    pub fn encode_count(&self) -> usize {
        self.encodes.borrow().len()
    }

    pub fn qualities(&self) -> Vec<u8> {
        self.encodes.borrow().iter().filter_map(|t| t.quality()).collect()
    }
}

impl ImageCodec for CountingCodec {
    fn decode(&self, path: &Path) -> CompressResult<DynamicImage> {
        self.decodes.set(self.decodes.get() + 1);
        StandardCodec.decode(path)
    }

    fn encode(&self, image: &DynamicImage, target: EncodeTarget, out: &mut dyn Write) -> CompressResult<()> {
        self.encodes.borrow_mut().push(target);
        StandardCodec.encode(image, target, out)
    }
}

/// Writes half a candidate, then fails like a codec crashing mid-encode.
pub struct FailingCodec;

impl ImageCodec for FailingCodec {
    fn decode(&self, _path: &Path) -> CompressResult<DynamicImage> {
        Ok(gradient_image(16, 16))
    }

    fn encode(&self, _image: &DynamicImage, target: EncodeTarget, out: &mut dyn Write) -> CompressResult<()> {
        out.write_all(&[0u8; 4096])?;
        Err(CompressError::encode(target.format_name(), target.quality(), "simulated codec crash"))
    }
}
