use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Error returned by fallible [`GpuBackend`](super::GpuBackend) calls.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BackendError {
    /// The texture could not be allocated (zero or oversized dimensions).
    TextureAllocation { width: u32, height: u32 },
    /// The texture cannot be rendered to.
    TargetAllocation(u32),
    /// The handle does not name a live texture.
    UnknownTexture(u32),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextureAllocation { width, height } => {
                write!(f, "cannot allocate a {width}x{height} texture")
            }
            Self::TargetAllocation(id) => write!(f, "texture {id} cannot be a render target"),
            Self::UnknownTexture(id) => write!(f, "unknown texture handle {id}"),
        }
    }
}

impl std::error::Error for BackendError {}
