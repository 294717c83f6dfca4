//! QR code image service.
//!
//! Serves QR codes rendered from query parameters:
//!
//! ```text
//! GET /api/qr?data=https://example.com&size=400&fg=blue&bg=yellow&format=png
//! ```
//!
//! Encoding is delegated to the `qrcode` crate with a fixed configuration
//! (highest error correction, 10 px modules, 4 module border), so the same
//! query always produces the same bytes and responses are cached for a year.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`qr`]: Parameter parsing, colors and image generation
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod qr;
pub mod utils;

pub use config::Config;
pub use error::{AppError, QrError, Result};
