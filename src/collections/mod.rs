//! Set collections used by the counting engine.
//!
//! - `vertex_set`: borrowed sorted vertex-ID views and their merge algebra

pub mod vertex_set;

pub use vertex_set::{VertexSet, Vid};
