pub use crate::transform::SourceTransform;
pub use crate::vertex::{PositionVertex, UVVertex, Vertex};
