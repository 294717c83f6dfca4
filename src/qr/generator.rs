//! Request parameters to encoded image bytes.
//!
//! Encoding itself is done by the `qrcode` crate. This module fixes its
//! configuration, paints the modules in the requested colors and handles the
//! PNG resize step.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Pixel, Rgb};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use super::color::Rgba;
use super::params::{OutputFormat, QrParams};
use crate::error::QrError;
use crate::metrics;

/// Fixed encoder settings shared by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Error correction level. The version is the smallest that fits.
    pub ec_level: EcLevel,
    /// Pixels per module edge.
    pub box_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
}

/// The configuration every image is rendered with.
pub const ENCODER: EncoderConfig = EncoderConfig {
    ec_level: EcLevel::H,
    box_size: 10,
    // Matches the quiet zone the renderer draws for standard symbols.
    border: 4,
};

impl EncoderConfig {
    /// Encode `data` into a symbol.
    pub fn encode(&self, data: &str) -> Result<QrCode, QrError> {
        Ok(QrCode::with_error_correction_level(data.as_bytes(), self.ec_level)?)
    }

    /// Edge in pixels of the unresized raster for `code`.
    pub fn native_edge(&self, code: &QrCode) -> u32 {
        (code.width() as u32 + 2 * self.border) * self.box_size
    }
}

/// A finished image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl QrImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Run the full pipeline for one request.
pub fn generate(params: &QrParams) -> Result<QrImage, QrError> {
    let _timer = metrics::timer_generation(params.format);

    let result = render(params);
    match &result {
        Ok(image) => {
            metrics::inc_generated(params.format);
            debug!(
                format = %params.format,
                size = params.size,
                bytes = image.bytes.len(),
                "QR image generated"
            );
        }
        Err(e) => metrics::inc_errors(e.kind()),
    }
    result
}

fn render(params: &QrParams) -> Result<QrImage, QrError> {
    let fg = Rgba::parse(&params.fg)?;
    let bg = Rgba::parse(&params.bg)?;
    let code = ENCODER.encode(&params.data)?;

    let bytes = match params.format {
        OutputFormat::Svg => render_svg(&code, fg, bg).into_bytes(),
        OutputFormat::Png => {
            let resize_to = params.needs_resize().then_some(params.size);
            let grayscale = is_black_on_white(&params.fg, &params.bg);
            encode_png(render_raster(&code, fg, bg, grayscale, resize_to))?
        }
    };

    Ok(QrImage {
        format: params.format,
        bytes,
    })
}

/// Vector rendering: a background rect plus one path for the dark modules.
/// The requested size does not apply here.
pub fn render_svg(code: &QrCode, fg: Rgba, bg: Rgba) -> String {
    let dark = fg.to_svg();
    let light = bg.to_svg();
    code.render()
        .quiet_zone(true)
        .module_dimensions(ENCODER.box_size, ENCODER.box_size)
        .dark_color(svg::Color(&dark))
        .light_color(svg::Color(&light))
        .build()
}

/// Whether the colors were given as the names `black` on `white`.
///
/// Only the names select the bilevel image. `#000` on `#fff` renders as RGB.
pub fn is_black_on_white(fg: &str, bg: &str) -> bool {
    fg.trim().eq_ignore_ascii_case("black") && bg.trim().eq_ignore_ascii_case("white")
}

/// Rasterize `code`, optionally resizing to `resize_to × resize_to`.
///
/// A `grayscale` image stays single-channel and is resized with
/// nearest-neighbour sampling. Any other image is resized bicubically.
pub fn render_raster(
    code: &QrCode,
    fg: Rgba,
    bg: Rgba,
    grayscale: bool,
    resize_to: Option<u32>,
) -> DynamicImage {
    if grayscale {
        let img = paint::<Luma<u8>>(code, Luma([0]), Luma([255]));
        return DynamicImage::ImageLuma8(resized(img, resize_to, FilterType::Nearest));
    }

    if fg.is_opaque() && bg.is_opaque() {
        let img = paint::<Rgb<u8>>(code, Rgb(fg.rgb()), Rgb(bg.rgb()));
        return DynamicImage::ImageRgb8(resized(img, resize_to, FilterType::CatmullRom));
    }

    let img = paint::<image::Rgba<u8>>(code, image::Rgba(fg.rgba()), image::Rgba(bg.rgba()));
    DynamicImage::ImageRgba8(resized(img, resize_to, FilterType::CatmullRom))
}

fn paint<P>(code: &QrCode, dark: P, light: P) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + qrcode::render::Pixel<Image = ImageBuffer<P, Vec<u8>>> + 'static,
{
    code.render::<P>()
        .quiet_zone(true)
        .module_dimensions(ENCODER.box_size, ENCODER.box_size)
        .dark_color(dark)
        .light_color(light)
        .build()
}

fn resized<P>(
    img: ImageBuffer<P, Vec<u8>>,
    resize_to: Option<u32>,
    filter: FilterType,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    match resize_to {
        Some(edge) if edge != img.width() || edge != img.height() => {
            imageops::resize(&img, edge, edge, filter)
        }
        _ => img,
    }
}

/// Encode a raster as PNG bytes.
pub fn encode_png(img: DynamicImage) -> Result<Vec<u8>, QrError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
