use std::fmt;

use crate::device::BackendError;

/// Error returned by [`decode`](super::decode).
#[derive(Debug)]
pub struct DecodeError(pub image::ImageError);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image decode error: {}", self.0)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Why a texture could not be created.
#[derive(Debug)]
pub enum TextureError {
    Decode(DecodeError),
    Io(std::io::Error),
    Backend(BackendError),
    /// Zero-sized or oversized image, or a pixel buffer that does not match
    /// its size.
    InvalidSize { width: u32, height: u32 },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => e.fmt(f),
            Self::Io(e) => write!(f, "cannot read image: {e}"),
            Self::Backend(e) => write!(f, "texture allocation failed: {e}"),
            Self::InvalidSize { width, height } => {
                write!(f, "invalid image size {width}x{height}")
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Backend(e) => Some(e),
            Self::InvalidSize { .. } => None,
        }
    }
}

impl From<DecodeError> for TextureError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<std::io::Error> for TextureError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BackendError> for TextureError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}
