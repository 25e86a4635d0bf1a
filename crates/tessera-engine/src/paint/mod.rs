//! Color primitives.
//!
//! Colors are packed 32-bit words, the same representation the batcher hands
//! to the GPU combiner as its constant color.

mod color;

pub use color::Color;
