//! wgpu implementation of [`GpuBackend`](super::GpuBackend).

mod backend;
mod composite;
mod pipeline;
mod target;

pub use backend::WgpuBackend;
