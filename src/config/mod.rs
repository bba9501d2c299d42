//! # Configuration Module
//!
//! This module provides the immutable run configuration and the quality ladder
//! derived from it.

pub mod config;
pub mod ladder;

pub use config::CompressConfig;
pub use ladder::QualityLadder;
