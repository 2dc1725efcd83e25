pub mod arrow;
pub mod json;
pub mod render;

pub use arrow::ArrowRenderer;
pub use json::JsonRenderer;
pub use render::{RenderError, Renderer, StreamingFormat};
