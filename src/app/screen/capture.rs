//! Decoder for the raw `screencap` stream.
//!
//! Wire format written by `adb exec-out screencap` (no `-p`):
//! ```text
//! [width:4][height:4][format:4][pixels:width*height*4]
//! ```
//! All header words are little-endian `u32`. Android 9 and later can write a
//! fourth header word (the color space) before the pixels; that layout is
//! decoded only on request through [`HeaderLayout::WithColorSpace`].

use thiserror::Error;

/// Size of the fixed header preceding the pixel payload.
pub const HEADER_SIZE: usize = 12;

/// Color-space word written after the header by newer `screencap` builds.
const COLOR_SPACE_SIZE: usize = 4;

/// Header layout of a capture stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Width, height and format only; pixels start at byte 12.
    #[default]
    Standard,
    /// Width, height, format and color space; pixels start at byte 16.
    WithColorSpace,
}

impl HeaderLayout {
    pub fn size(self) -> usize {
        match self {
            HeaderLayout::Standard => HEADER_SIZE,
            HeaderLayout::WithColorSpace => HEADER_SIZE + COLOR_SPACE_SIZE,
        }
    }
}

const BYTES_PER_PIXEL: usize = 4;

/// Errors produced while decoding a capture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Only `PixelFormat::Rgba8888` is decoded; anything else is rejected
    /// instead of being misread.
    #[error(
        "cannot handle pixel format: {0}, see https://developer.android.com/reference/android/graphics/PixelFormat"
    )]
    UnsupportedPixelFormat(u32),

    /// The stream ended before the header or the declared pixel data.
    #[error("malformed capture: need {expected} bytes, got {available}")]
    MalformedCapture { expected: usize, available: usize },
}

/// Pixel encodings understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8888,
}

impl PixelFormat {
    pub fn from_code(code: u32) -> Result<Self, CaptureError> {
        match code {
            1 => Ok(Self::Rgba8888),
            other => Err(CaptureError::UnsupportedPixelFormat(other)),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Rgba8888 => 1,
        }
    }
}

/// One decoded frame. Fields are private so a buffer never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Interleaved RGBA bytes, row-major, no row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let slice = self.data.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([slice[0], slice[1], slice[2], slice[3]])
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Decodes a raw `screencap` stream with the standard 12-byte header into a
/// [`PixelBuffer`].
///
/// The format gate runs before any length check, so an unsupported format is
/// reported even when the payload is truncated. Bytes past the declared pixel
/// data are ignored.
///
/// # Errors
///
/// [`CaptureError::UnsupportedPixelFormat`] for any format other than
/// RGBA_8888, [`CaptureError::MalformedCapture`] when the stream is shorter
/// than the header or the declared pixel data.
pub fn decode_screencap(bytes: &[u8]) -> Result<PixelBuffer, CaptureError> {
    decode_screencap_with_layout(bytes, HeaderLayout::Standard)
}

/// Decodes a capture whose header carries the trailing color-space word.
pub fn decode_screencap_with_color_space(bytes: &[u8]) -> Result<PixelBuffer, CaptureError> {
    decode_screencap_with_layout(bytes, HeaderLayout::WithColorSpace)
}

/// Decodes a capture with an explicit header layout.
pub fn decode_screencap_with_layout(
    bytes: &[u8],
    layout: HeaderLayout,
) -> Result<PixelBuffer, CaptureError> {
    let header_size = layout.size();
    if bytes.len() < HEADER_SIZE {
        return Err(CaptureError::MalformedCapture {
            expected: header_size,
            available: bytes.len(),
        });
    }
    let width = read_u32_le(bytes, 0);
    let height = read_u32_le(bytes, 4);
    let format = PixelFormat::from_code(read_u32_le(bytes, 8))?;
    if bytes.len() < header_size {
        return Err(CaptureError::MalformedCapture {
            expected: header_size,
            available: bytes.len(),
        });
    }

    let payload = &bytes[header_size..];
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
        .ok_or(CaptureError::MalformedCapture {
            expected: usize::MAX,
            available: payload.len(),
        })?;
    if payload.len() < expected {
        return Err(CaptureError::MalformedCapture {
            expected,
            available: payload.len(),
        });
    }

    Ok(PixelBuffer {
        width,
        height,
        format,
        data: payload[..expected].to_vec(),
    })
}

#[cfg(test)]
pub(crate) fn encode_header(width: u32, height: u32, format: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE);
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&format.to_le_bytes());
    bytes
}
