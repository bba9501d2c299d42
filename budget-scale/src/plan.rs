// SPDX-License-Identifier: MIT
//! # Downscale Plan Computation
//!
//! Computes output dimensions for the longest-side clamp applied to oversized
//! images. Aspect ratio is always preserved and images are never upscaled.
//!
//! - All computations use floating-point for precision but round to integers
//! - Clamp to minimum 1px to prevent zero-sized output

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Complete downscale plan computed from the input size and the longest-side limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Longest side allowed in the output
    pub max_long_side: u32,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the plan changes the image dimensions.
    pub fn is_resize(&self) -> bool {
        self.input != self.out
    }
}

/// Compute a downscale plan that clamps the longest side to `max_long_side`.
///
/// # Performance
/// O(1) computation with minimal floating-point operations
pub fn build_plan(input: Size, max_long_side: u32) -> ScalePlan {
    let (w, h) = fit_preserve(input, max_long_side.max(1));
    ScalePlan {
        input,
        max_long_side,
        out: Size { w, h },
    }
}

/// Fit image within max_long constraint while preserving aspect ratio.
/// Never upscales - returns original dimensions if already smaller than max_long.
fn fit_preserve(input: Size, max_long: u32) -> (u32, u32) {
    if input.w == 0 || input.h == 0 {
        return (input.w, input.h);
    }
    let (w, h) = (input.w as f64, input.h as f64);
    let long = w.max(h);
    let s = (max_long as f64 / long).min(1.0); // don't upscale
    (
        ((w * s).round() as u32).max(1),
        ((h * s).round() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_clamps_width() {
        let plan = build_plan(Size { w: 4000, h: 3000 }, 2000);
        assert_eq!(plan.out, Size { w: 2000, h: 1500 });
        assert!(plan.is_resize());
    }

    #[test]
    fn portrait_clamps_height() {
        let plan = build_plan(Size { w: 1080, h: 1920 }, 960);
        assert_eq!(plan.out, Size { w: 540, h: 960 });
    }

    #[test]
    fn never_upscales() {
        let input = Size { w: 640, h: 480 };
        let plan = build_plan(input, 2048);
        assert_eq!(plan.out, input);
        assert!(!plan.is_resize());
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let plan = build_plan(Size { w: 10000, h: 1 }, 100);
        assert_eq!(plan.out, Size { w: 100, h: 1 });
    }
}
