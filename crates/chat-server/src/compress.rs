//! Shrinking uploaded images before they are inlined into a chat request.
//!
//! Every image is re-encoded as JPEG at most twice: a first pass that fits
//! it inside 400x300, and a harsher second pass (300x225) that only runs when
//! the first result is still over 100 KiB. Anything above the absolute cap
//! after that is refused. The constants are fixed choices, not a bound that
//! holds for every input.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use thiserror::Error;

/// MIME type of every compressed image.
pub const COMPRESSED_MIME_TYPE: &str = "image/jpeg";

/// Output size above which the second pass runs (100 KiB).
pub const DEFAULT_RETRY_ABOVE_BYTES: usize = 100 * 1024;

/// Largest compressed image that may be sent upstream (4 MiB).
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024 * 1024;

/// One resize-and-encode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPass {
    /// Bounding box width; images are never enlarged.
    pub max_width: u32,
    /// Bounding box height.
    pub max_height: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

/// Thresholds for the two-pass compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// Passes in order; later passes run only while the output is too big.
    pub passes: [CompressionPass; 2],
    /// Run the next pass when the output exceeds this many bytes.
    pub retry_above_bytes: usize,
    /// Reject the image when the final output exceeds this many bytes.
    pub max_bytes: usize,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            passes: [
                CompressionPass {
                    max_width: 400,
                    max_height: 300,
                    quality: 60,
                },
                CompressionPass {
                    max_width: 300,
                    max_height: 225,
                    quality: 40,
                },
            ],
            retry_above_bytes: DEFAULT_RETRY_ABOVE_BYTES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// A JPEG ready to be inlined.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// How many passes were needed.
    pub passes: usize,
}

impl CompressedImage {
    /// Base64 (standard alphabet, padded) of the JPEG bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Errors from [`compress`].
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("could not decode image: {0}")]
    Decode(#[source] ImageError),

    #[error("could not encode image: {0}")]
    Encode(#[source] ImageError),

    #[error("Image too large ({}MB). Please try a smaller image.", megabytes(.size))]
    TooLarge {
        size: usize,
        max: usize,
        /// Passes that ran before giving up.
        passes: usize,
    },
}

fn megabytes(bytes: &usize) -> String {
    format!("{:.2}", *bytes as f64 / (1024.0 * 1024.0))
}

/// Decode `original` and re-encode it under `policy`.
pub fn compress(
    original: &[u8],
    policy: &CompressionPolicy,
) -> Result<CompressedImage, CompressError> {
    let mut image = image::load_from_memory(original).map_err(CompressError::Decode)?;
    let mut encoded = Vec::new();
    let mut passes = 0;

    for pass in &policy.passes {
        if passes > 0 && encoded.len() <= policy.retry_above_bytes {
            break;
        }
        image = fit_within(image, pass.max_width, pass.max_height);
        encoded = encode_jpeg(&image, pass.quality)?;
        passes += 1;

        tracing::debug!(
            pass = passes,
            width = image.width(),
            height = image.height(),
            bytes = encoded.len(),
            "Compression pass finished"
        );
    }

    if encoded.len() > policy.max_bytes {
        return Err(CompressError::TooLarge {
            size: encoded.len(),
            max: policy.max_bytes,
            passes,
        });
    }

    Ok(CompressedImage {
        width: image.width(),
        height: image.height(),
        bytes: encoded,
        passes,
    })
}

/// Shrink to fit the box, keeping aspect ratio. Smaller images are untouched.
fn fit_within(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if image.width() <= max_width && image.height() <= max_height {
        image
    } else {
        image.resize(max_width, max_height, FilterType::Lanczos3)
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(CompressError::Encode)?;
    Ok(out.into_inner())
}
