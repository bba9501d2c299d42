//! # Codec Seam
//!
//! The re-encoder never talks to an image library directly. It goes through
//! [`ImageCodec`], which decodes an artifact once and encodes candidates into a
//! caller-provided writer (the scratch file).
//!
//! [`StandardCodec`] is the production implementation:
//! - **JPEG**: `image`'s `JpegEncoder` at the ladder quality (RGB8, JPEG has no alpha)
//! - **PNG**: `image`'s `PngEncoder` with `CompressionType::Best` and adaptive filtering
//! - **WebP**: libwebp through the `webp` crate, lossy, with alpha quality equal to
//!   the ladder quality
//!
//! Tests substitute their own implementations to count calls or inject failures.

use std::io::Write;
use std::path::Path;

use budget_scale::{cpu::{downscale_rgba, downscale_rgba16}, plan::{build_plan, Size}};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{
    ColorType, DynamicImage, ExtendedColorType, GenericImageView, ImageBuffer, ImageEncoder, Rgba, RgbaImage,
};
use tracing::debug;

use crate::error::{CompressError, CompressResult};

type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// One encode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    Jpeg { quality: u8 },
    WebP { quality: u8 },
    /// Lossless PNG at the strongest compression level.
    PngMaxCompression,
}

impl EncodeTarget {
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Jpeg { quality } | Self::WebP { quality } => Some(*quality),
            Self::PngMaxCompression => None,
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpeg",
            Self::WebP { .. } => "webp",
            Self::PngMaxCompression => "png",
        }
    }
}

/// Decode/encode capability used by the re-encoder.
pub trait ImageCodec {
    /// Decode the image stored at `path`.
    fn decode(&self, path: &Path) -> CompressResult<DynamicImage>;

    /// Encode `image` according to `target`, writing the bytes to `out`.
    fn encode(&self, image: &DynamicImage, target: EncodeTarget, out: &mut dyn Write) -> CompressResult<()>;
}

/// Codec backed by the `image` and `webp` crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl ImageCodec for StandardCodec {
    fn decode(&self, path: &Path) -> CompressResult<DynamicImage> {
        image::open(path).map_err(|e| {
            CompressError::decode(path, e)
                .with_recovery_suggestion("check that the file is a complete image of the type its extension names")
        })
    }

    fn encode(&self, image: &DynamicImage, target: EncodeTarget, out: &mut dyn Write) -> CompressResult<()> {
        let (width, height) = image.dimensions();
        match target {
            EncodeTarget::Jpeg { quality } => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(out, quality)
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| CompressError::encode("jpeg", Some(quality), e.to_string()))
            }
            EncodeTarget::PngMaxCompression => {
                let (bytes, color) = png_pixels(image);
                PngEncoder::new_with_quality(out, CompressionType::Best, FilterType::Adaptive)
                    .write_image(&bytes, width, height, color)
                    .map_err(|e| CompressError::encode("png", None, e.to_string()))
            }
            EncodeTarget::WebP { quality } => {
                let rgba = image.to_rgba8();
                let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
                let mut config = webp::WebPConfig::new()
                    .map_err(|_| CompressError::encode("webp", Some(quality), "cannot initialise encoder config"))?;
                config.lossless = 0;
                config.quality = f32::from(quality);
                config.alpha_quality = i32::from(quality);
                let encoded = encoder
                    .encode_advanced(&config)
                    .map_err(|e| CompressError::encode("webp", Some(quality), format!("{:?}", e)))?;
                out.write_all(&encoded)
                    .map_err(|e| CompressError::io("write webp candidate", e))
            }
        }
    }
}

// PNG stores every 8- and 16-bit layout natively (`as_bytes` is native-endian,
// which is what `PngEncoder` expects). Only float images are narrowed, to 16 bits.
fn png_pixels(image: &DynamicImage) -> (Vec<u8>, ExtendedColorType) {
    match image {
        DynamicImage::ImageRgb32F(_) => {
            let rgb = image.to_rgb16();
            (u16_ne_bytes(rgb.as_raw()), ExtendedColorType::Rgb16)
        }
        DynamicImage::ImageRgba32F(_) => {
            let rgba = image.to_rgba16();
            (u16_ne_bytes(rgba.as_raw()), ExtendedColorType::Rgba16)
        }
        _ => (image.as_bytes().to_vec(), image.color().into()),
    }
}

fn u16_ne_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

/// Shrink `image` so its longest side is at most `max_dimension`. Never upscales.
///
/// The result keeps the source's channel layout and bit depth (8-bit layouts
/// stay 8-bit, 16-bit and float layouts come back as 16-bit), so a later
/// lossless PNG encode does not lose precision it never had to.
pub fn fit_to_max_dimension(image: DynamicImage, max_dimension: u32) -> CompressResult<DynamicImage> {
    let (w, h) = image.dimensions();
    let plan = build_plan(Size { w, h }, max_dimension);
    if !plan.is_resize() {
        return Ok(image);
    }
    debug!(from_w = w, from_h = h, to_w = plan.out.w, to_h = plan.out.h, "downscaling before encode");

    let color = image.color();
    let scaled = if color.bytes_per_pixel() / color.channel_count() > 1 {
        let rgba = image.to_rgba16();
        let scaled = downscale_rgba16(rgba.as_raw(), &plan)?;
        let scaled: Rgba16Image = ImageBuffer::from_raw(plan.out.w, plan.out.h, scaled)
            .ok_or_else(|| CompressError::scale("resized buffer does not match planned dimensions"))?;
        DynamicImage::ImageRgba16(scaled)
    } else {
        let rgba = image.to_rgba8();
        let scaled = downscale_rgba(rgba.as_raw(), &plan)?;
        let scaled = RgbaImage::from_raw(plan.out.w, plan.out.h, scaled)
            .ok_or_else(|| CompressError::scale("resized buffer does not match planned dimensions"))?;
        DynamicImage::ImageRgba8(scaled)
    };

    Ok(match color {
        ColorType::L8 => DynamicImage::ImageLuma8(scaled.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(scaled.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(scaled.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(scaled.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(scaled.to_luma_alpha16()),
        ColorType::Rgb16 | ColorType::Rgb32F => DynamicImage::ImageRgb16(scaled.to_rgb16()),
        _ => scaled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 128])
        }))
    }

    #[test]
    fn jpeg_round_trips_dimensions() {
        let mut out = Vec::new();
        StandardCodec
            .encode(&gradient(64, 48), EncodeTarget::Jpeg { quality: 60 }, &mut out)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn lower_jpeg_quality_is_not_larger() {
        let image = gradient(128, 128);
        let mut high = Vec::new();
        let mut low = Vec::new();
        StandardCodec.encode(&image, EncodeTarget::Jpeg { quality: 95 }, &mut high).unwrap();
        StandardCodec.encode(&image, EncodeTarget::Jpeg { quality: 20 }, &mut low).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn webp_keeps_alpha_channel() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(32, 32, Rgba([10, 20, 30, 128])));
        let mut out = Vec::new();
        StandardCodec.encode(&image, EncodeTarget::WebP { quality: 50 }, &mut out).unwrap();
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
    }

    #[test]
    fn png_output_is_decodable() {
        let mut out = Vec::new();
        StandardCodec
            .encode(&gradient(40, 30), EncodeTarget::PngMaxCompression, &mut out)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn fit_to_max_dimension_preserves_aspect_and_color_type() {
        let scaled = fit_to_max_dimension(gradient(400, 200), 100).unwrap();
        assert_eq!(scaled.dimensions(), (100, 50));
        assert!(!scaled.color().has_alpha());

        let untouched = fit_to_max_dimension(gradient(50, 20), 100).unwrap();
        assert_eq!(untouched.dimensions(), (50, 20));
    }

    #[test]
    fn png_keeps_sixteen_bit_samples() {
        let image = DynamicImage::ImageRgb16(ImageBuffer::from_fn(24, 16, |x, y| {
            Rgb([(x * 2731) as u16, (y * 4099) as u16, 0x1234 + (x * y) as u16])
        }));
        let mut out = Vec::new();
        StandardCodec.encode(&image, EncodeTarget::PngMaxCompression, &mut out).unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb16);
        assert_eq!(decoded.as_bytes(), image.as_bytes());
    }

    #[test]
    fn fit_to_max_dimension_keeps_bit_depth() {
        let image = DynamicImage::ImageLumaA16(ImageBuffer::from_pixel(64, 32, image::LumaA([40_000u16, 65_535])));
        let scaled = fit_to_max_dimension(image, 16).unwrap();
        assert_eq!(scaled.dimensions(), (16, 8));
        assert_eq!(scaled.color(), ColorType::La16);
        let px = scaled.as_luma_alpha16().unwrap().get_pixel(3, 3);
        assert!(px[0].abs_diff(40_000) <= 1);
    }

    #[test]
    fn target_reports_quality_and_name() {
        assert_eq!(EncodeTarget::WebP { quality: 40 }.quality(), Some(40));
        assert_eq!(EncodeTarget::PngMaxCompression.quality(), None);
        assert_eq!(EncodeTarget::Jpeg { quality: 1 }.format_name(), "jpeg");
    }
}
