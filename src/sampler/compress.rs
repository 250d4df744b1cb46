use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::capture::Frame;

/// Default JPEG quality, matching what browsers use for `image/jpeg` data URLs.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Still-image format frames are encoded to before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameEncoding {
    #[default]
    Jpeg,
    Png,
}

impl FrameEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("raster holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

fn rgb_view(
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<ImageBuffer<Rgb<u8>, &[u8]>, EncodeError> {
    ImageBuffer::from_raw(width, height, data).ok_or(EncodeError::BufferSize {
        width,
        height,
        expected: width as usize * height as usize * 3,
        actual: data.len(),
    })
}

/// Compress raw RGB pixel data to JPEG at the given quality (1-100).
pub fn compress_jpeg(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let img = rgb_view(data, width, height)?;
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

/// Compress raw RGB pixel data to PNG.
pub fn compress_png(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    let img = rgb_view(data, width, height)?;
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))?;
    Ok(buf)
}

/// Encode a captured frame at its own resolution.
pub fn encode_frame(
    frame: &Frame,
    encoding: FrameEncoding,
    jpeg_quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match encoding {
        FrameEncoding::Jpeg => compress_jpeg(&frame.data, frame.width, frame.height, jpeg_quality),
        FrameEncoding::Png => compress_png(&frame.data, frame.width, frame.height),
    }
}

/// Wrap encoded bytes as a base64 data URL, the text form images travel in.
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// File extension for the MIME type, if it is an image type we know.
    pub fn extension(&self) -> Option<&'static str> {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }
}

/// Parse a base64 data URL. Returns `None` for anything else.
pub fn parse_data_url(url: &str) -> Option<DataUrl> {
    let (header, payload) = url.strip_prefix("data:")?.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
