mod camera;
pub mod gizmo;
mod grid;
mod lighting;
mod renderer;
mod vertex;

pub use renderer::{FrameData, RenderError, Renderer};
pub use vertex::{LineVertex, Vertex};
