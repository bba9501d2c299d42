// SPDX-License-Identifier: MIT
//! # budget-scale: Longest-Side Downscaling for Size-Budgeted Images
//!
//! Optional pre-pass used by the re-encoder before an oversized image is
//! written back at lower quality. Shrinking the pixel count first lets the
//! quality ladder stop at a higher level for very large photos.
//!
//! ## Key Components
//!
//! - [`plan`]: Output-size computation (clamp longest side, keep aspect ratio)
//! - [`cpu`]: SIMD-accelerated RGBA8/RGBA16 resize using `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust
//! use budget_scale::{cpu::downscale_rgba, plan::{build_plan, Size}};
//!
//! let input = Size { w: 4000, h: 3000 };
//! let plan = build_plan(input, 2000);
//! assert_eq!((plan.out.w, plan.out.h), (2000, 1500));
//!
//! let pixels = vec![0u8; (input.w * input.h * 4) as usize];
//! let scaled = downscale_rgba(&pixels, &plan).unwrap();
//! assert_eq!(scaled.len(), (2000 * 1500 * 4) as usize);
//! ```

pub mod cpu;
pub mod plan;
