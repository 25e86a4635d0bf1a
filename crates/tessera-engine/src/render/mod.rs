//! Batching and the drawing front end.
//!
//! Conventions:
//! - Geometry is in target pixels (top-left origin, +Y down).
//! - Every draw funnels into one [`VertexBatch`]; state setters flush before
//!   they mutate, so a submitted range never spans two states.

mod batch;
mod outline;
pub(crate) mod renderer;
mod screen;
mod state;
mod vertex;

pub use batch::{VertexBatch, DEFAULT_MAX_VERTICES, STRIP_QUAD_VERTICES};
pub use outline::{OutlinePhase, OutlineState, OutlineTests, OUTLINE_STAMP};
pub use renderer::{Frame, Renderer, RendererConfig};
pub use screen::{Screen, Side};
pub use state::RenderState;
pub use vertex::Vertex;
