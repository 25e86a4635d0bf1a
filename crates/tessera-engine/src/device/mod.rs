//! GPU capability and its implementations.
//!
//! - [`GpuBackend`]: the operations the batcher needs from a GPU
//! - [`WgpuBackend`]: the windowed implementation on wgpu
//! - [`HeadlessBackend`]: a recording implementation without a GPU
//! - [`Gpu`]: wgpu Instance/Adapter/Device/Queue plus the window surface

pub(crate) mod backend;
mod error;
mod gpu;
mod headless;
mod surface;
mod wgpu_backend;

pub use backend::{
    AlphaTest, BlendMode, CompareFunc, GpuBackend, GpuTexture, ScreenTarget, StencilTest, TargetId,
    TextureDesc, TextureWrap, Topology, FIRST_TEXTURE_TARGET,
};
pub use error::{BackendError, SurfaceErrorAction};
pub use gpu::{Gpu, GpuInit, SurfaceFrame};
pub use headless::{BackendCall, DrawRecord, HeadlessBackend, HeadlessTexture};
pub use wgpu_backend::WgpuBackend;
