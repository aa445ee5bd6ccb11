//! Conversion of pixel payloads into displayable images.
//!
//! A payload is either a ready-made image reference
//! (`{"imageUrl", "height", "width"}`) or a raw `[height][width][3]` RGB array.
//! References pass through untouched; raw arrays are PNG-encoded into a
//! `data:` URL.

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde_json::Value;

use crate::error::MaterializationError;
use crate::types::DisplayImage;

/// An image payload, resolved by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelPayload {
    /// Pre-encoded image the server already hosts or inlined.
    Reference {
        image_url: String,
        height: u32,
        width: u32,
    },
    /// Row-major 8-bit RGB pixels.
    Raw(RawPixels),
}

/// Validated raw pixel buffer, `height * width * 3` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPixels {
    pub height: u32,
    pub width: u32,
    pub rgb: Vec<u8>,
}

impl PixelPayload {
    /// Resolve a JSON payload by inspecting its structure.
    ///
    /// Objects are tried as references before anything else, so a reference
    /// never pays for pixel validation.
    pub fn from_value(value: &Value) -> Result<Self, MaterializationError> {
        match value {
            Value::Object(obj) => {
                let image_url = obj
                    .get("imageUrl")
                    .and_then(|v| v.as_str())
                    .ok_or(MaterializationError::UnrecognizedShape)?;
                let height = dimension(obj.get("height"))?;
                let width = dimension(obj.get("width"))?;
                Ok(PixelPayload::Reference {
                    image_url: image_url.to_string(),
                    height,
                    width,
                })
            }
            Value::Array(rows) => RawPixels::from_rows(rows).map(PixelPayload::Raw),
            _ => Err(MaterializationError::UnrecognizedShape),
        }
    }
}

fn dimension(v: Option<&Value>) -> Result<u32, MaterializationError> {
    v.and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(MaterializationError::UnrecognizedShape)
}

impl RawPixels {
    /// Validate a `[height][width][3]` array, clamping channels to 0..=255.
    pub fn from_rows(rows: &[Value]) -> Result<Self, MaterializationError> {
        let first = rows
            .first()
            .and_then(|r| r.as_array())
            .ok_or(MaterializationError::EmptyPayload)?;
        let width = first.len();
        if width == 0 {
            return Err(MaterializationError::EmptyPayload);
        }

        let mut rgb = Vec::with_capacity(rows.len() * width * 3);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_array().ok_or(MaterializationError::RaggedRows {
                row: y,
                expected: width,
                found: 0,
            })?;
            if row.len() != width {
                return Err(MaterializationError::RaggedRows {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, pixel) in row.iter().enumerate() {
                let bad = || MaterializationError::BadPixel { row: y, col: x };
                let channels = pixel.as_array().filter(|c| c.len() == 3).ok_or_else(bad)?;
                for channel in channels {
                    let n = channel.as_f64().ok_or_else(bad)?;
                    rgb.push(clamp_channel(n));
                }
            }
        }

        let height = u32::try_from(rows.len()).map_err(|_| MaterializationError::UnrecognizedShape)?;
        let width = u32::try_from(width).map_err(|_| MaterializationError::UnrecognizedShape)?;
        Ok(Self { height, width, rgb })
    }
}

fn clamp_channel(n: f64) -> u8 {
    if n.is_nan() {
        0
    } else {
        n.round().clamp(0.0, 255.0) as u8
    }
}

/// Turns [`PixelPayload`]s into [`DisplayImage`]s.
///
/// Stateless; the same payload always produces the same image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMaterializer;

impl ImageMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// Materialize a payload. Dimensions are the image's native pixel size.
    pub fn materialize(&self, payload: &PixelPayload) -> Result<DisplayImage, MaterializationError> {
        match payload {
            PixelPayload::Reference {
                image_url,
                height,
                width,
            } => Ok(DisplayImage {
                image_url: image_url.clone(),
                height: *height,
                width: *width,
                is_expanded: false,
            }),
            PixelPayload::Raw(pixels) => Ok(DisplayImage {
                image_url: png_data_url(pixels)?,
                height: pixels.height,
                width: pixels.width,
                is_expanded: false,
            }),
        }
    }

    /// Resolve and materialize a raw JSON payload in one step.
    pub fn materialize_value(&self, value: &Value) -> Result<DisplayImage, MaterializationError> {
        self.materialize(&PixelPayload::from_value(value)?)
    }
}

fn png_data_url(pixels: &RawPixels) -> Result<String, MaterializationError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels.rgb, pixels.width, pixels.height, ExtendedColorType::Rgb8)
        .map_err(|e| MaterializationError::Encode(e.to_string()))?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    ))
}
