//! Tessera: a small 2D batching renderer for a dual-screen layout.
//!
//! Every draw call lands in one shared vertex batch that is flushed whenever
//! render state changes. Textures are reference counted, text is laid out
//! from UTF-8 through a glyph atlas, and sprites rebuild their model matrix
//! only when a transform changed. The `device` layer ships a `wgpu` backend
//! and a headless one for tests.

pub mod coords;
pub mod device;
pub mod paint;
pub mod render;
pub mod sprite;
pub mod text;
pub mod texture;

pub mod core;
pub mod input;
pub mod logging;
pub mod time;
pub mod window;
