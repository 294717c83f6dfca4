//! QR image generation.
//!
//! This module handles:
//! - Parsing the request query into [`QrParams`]
//! - Color specifiers for the dark and light modules
//! - Encoding, rendering and resizing into PNG or SVG bytes

pub mod color;
pub mod generator;
pub mod params;

pub use color::Rgba;
pub use generator::{generate, EncoderConfig, QrImage, ENCODER};
pub use params::{OutputFormat, QrParams, DEFAULT_SIZE, MAX_SIZE};
