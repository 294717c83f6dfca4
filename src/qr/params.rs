//! Query string to request parameters.

use std::num::IntErrorKind;
use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::QrError;

/// Default raster edge in pixels. Requests at this size skip the resize step.
pub const DEFAULT_SIZE: u32 = 300;

/// Upper bound applied to `size`.
pub const MAX_SIZE: u32 = 2000;

pub const DEFAULT_FG: &str = "black";
pub const DEFAULT_BG: &str = "white";

/// Output image format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// Parse a `format` value. Unknown values select PNG.
    pub fn from_param(raw: &str) -> Self {
        OutputFormat::from_str(raw.trim()).unwrap_or_default()
    }

    /// MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

/// Parameters of a single QR request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrParams {
    /// Text to encode. Never empty.
    pub data: String,
    /// Raster edge in pixels, already clamped to [`MAX_SIZE`].
    pub size: u32,
    /// Dark module color specifier.
    pub fg: String,
    /// Light module color specifier.
    pub bg: String,
    pub format: OutputFormat,
}

impl QrParams {
    /// Params with defaults for everything but `data`.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            size: DEFAULT_SIZE,
            fg: DEFAULT_FG.to_string(),
            bg: DEFAULT_BG.to_string(),
            format: OutputFormat::default(),
        }
    }

    /// Build params from a raw (still percent-encoded) query string.
    ///
    /// Blank values count as absent, so `fg=` keeps the default color. Among
    /// the remaining values the first occurrence of a key wins. A missing
    /// `data` fails before anything else is looked at.
    pub fn from_query(raw: Option<&str>) -> Result<Self, QrError> {
        let query = raw.unwrap_or_default();
        let first = |key: &str| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.into_owned())
        };

        let data = first("data").unwrap_or_default();
        if data.is_empty() {
            return Err(QrError::MissingData);
        }

        let size = match first("size") {
            Some(raw) => parse_size(&raw)?,
            None => DEFAULT_SIZE,
        };

        Ok(Self {
            data,
            size,
            fg: first("fg").unwrap_or_else(|| DEFAULT_FG.to_string()),
            bg: first("bg").unwrap_or_else(|| DEFAULT_BG.to_string()),
            format: first("format")
                .map(|f| OutputFormat::from_param(&f))
                .unwrap_or_default(),
        })
    }

    /// Whether the PNG path needs a resize step.
    pub fn needs_resize(&self) -> bool {
        self.format == OutputFormat::Png && self.size != DEFAULT_SIZE
    }
}

/// Parse and clamp a `size` value.
///
/// Integers too large for `i64` are still integers and clamp like any other.
pub fn parse_size(raw: &str) -> Result<u32, QrError> {
    let value: i64 = match raw.trim().parse() {
        Ok(value) => value,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Ok(MAX_SIZE),
        Err(_) => {
            return Err(QrError::InvalidSize(format!("'{raw}' is not an integer")));
        }
    };

    let clamped = value.min(i64::from(MAX_SIZE));
    if clamped <= 0 {
        return Err(QrError::InvalidSize(format!("{value} must be positive")));
    }

    Ok(clamped as u32)
}
