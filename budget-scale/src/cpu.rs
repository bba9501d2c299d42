// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 or RGBA16 in, same layout out, tightly packed rows.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::{U16x4, U8x4};
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::ScalePlan;

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall { expected: usize, actual: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall { expected, actual } => {
                write!(f, "Buffer too small: expected {} bytes, got {}", expected, actual)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resize `src_rgba` into the caller-provided `dst` buffer.
/// `dst` must be at least `plan.out.w * plan.out.h * 4` bytes.
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    plan: &ScalePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let src_len = (plan.input.w as usize) * (plan.input.h as usize) * 4;
    if src_rgba.len() < src_len {
        return Err(ScaleError::BufferTooSmall { expected: src_len, actual: src_rgba.len() });
    }
    let dst_len = (plan.out.w as usize) * (plan.out.h as usize) * 4;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall { expected: dst_len, actual: dst.len() });
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(plan.input.w, plan.input.h, &src_rgba[..src_len])?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    // Photos dominate oversized assets; Lanczos3 keeps edges crisp after a large shrink.
    let opts = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}

/// Allocate an output buffer and resize into it.
/// Returns a copy of the input when the plan does not change dimensions.
pub fn downscale_rgba(src_rgba: &[u8], plan: &ScalePlan) -> Result<Vec<u8>, ScaleError> {
    if !plan.is_resize() {
        return Ok(src_rgba.to_vec());
    }
    let mut resizer = Resizer::new();
    let mut out = vec![0u8; (plan.out.w as usize) * (plan.out.h as usize) * 4];
    scale_rgba_cpu(&mut resizer, src_rgba, plan, &mut out)?;
    Ok(out)
}

/// 16-bit counterpart of [`downscale_rgba`]. Samples are four `u16` per pixel.
pub fn downscale_rgba16(src_rgba: &[u16], plan: &ScalePlan) -> Result<Vec<u16>, ScaleError> {
    if !plan.is_resize() {
        return Ok(src_rgba.to_vec());
    }
    let src_len = (plan.input.w as usize) * (plan.input.h as usize) * 4;
    if src_rgba.len() < src_len {
        return Err(ScaleError::BufferTooSmall { expected: src_len, actual: src_rgba.len() });
    }
    let pixels: Vec<U16x4> = src_rgba[..src_len]
        .chunks_exact(4)
        .map(|c| U16x4::new([c[0], c[1], c[2], c[3]]))
        .collect();
    let src_view = TypedImageRef::<U16x4>::new(plan.input.w, plan.input.h, &pixels)
        .map_err(|_| ScaleError::ImageBuf(fir::ImageBufferError::InvalidBufferSize))?;
    let mut dst_image = TypedImage::<U16x4>::new(plan.out.w, plan.out.h);

    let opts = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    Resizer::new().resize_typed::<U16x4>(&src_view, &mut dst_image, &opts)?;

    Ok(dst_image.pixels().iter().flat_map(|px| px.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_plan, Size};

    #[test]
    fn solid_color_survives_downscale() {
        let input = Size { w: 64, h: 32 };
        let src: Vec<u8> = [200u8, 100, 50, 255].repeat((input.w * input.h) as usize);
        let plan = build_plan(input, 16);

        let out = downscale_rgba(&src, &plan).unwrap();
        assert_eq!(out.len(), 16 * 8 * 4);
        for px in out.chunks_exact(4) {
            for (got, want) in px.iter().zip([200u8, 100, 50, 255]) {
                assert!(got.abs_diff(want) <= 1, "pixel {:?} drifted", px);
            }
        }
    }

    #[test]
    fn short_source_buffer_is_rejected() {
        let plan = build_plan(Size { w: 10, h: 10 }, 5);
        let mut resizer = Resizer::new();
        let mut dst = vec![0u8; 5 * 5 * 4];
        let err = scale_rgba_cpu(&mut resizer, &[0u8; 16], &plan, &mut dst).unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall { expected: 400, actual: 16 }));
    }

    #[test]
    fn sixteen_bit_solid_color_keeps_full_precision() {
        let input = Size { w: 32, h: 32 };
        let src: Vec<u16> = [51_234u16, 1_027, 40_000, 65_535].repeat((input.w * input.h) as usize);
        let plan = build_plan(input, 8);

        let out = downscale_rgba16(&src, &plan).unwrap();
        assert_eq!(out.len(), 8 * 8 * 4);
        for px in out.chunks_exact(4) {
            for (got, want) in px.iter().zip([51_234u16, 1_027, 40_000, 65_535]) {
                assert!(got.abs_diff(want) <= 1, "pixel {:?} drifted", px);
            }
        }
    }

    #[test]
    fn identity_plan_copies_input() {
        let input = Size { w: 4, h: 4 };
        let src = vec![7u8; 64];
        let plan = build_plan(input, 100);
        assert_eq!(downscale_rgba(&src, &plan).unwrap(), src);
    }
}
