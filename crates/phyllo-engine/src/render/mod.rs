//! GPU rendering subsystem.
//!
//! Scenes build [`Model`]s from [`Buffer`]s and [`Attribute`]s; each model owns
//! its pipeline and issues one (optionally instanced) draw call per frame.
//!
//! Convention:
//! - vertex positions are clip-space (NDC), +Y up
//! - the viewport uniform carries the drawable size in physical pixels

mod attribute;
mod buffer;
mod common;
mod ctx;
mod model;
pub mod shader;

pub use attribute::{step_mode_for_divisor, Attribute, AttributeFormat};
pub use buffer::Buffer;
pub use ctx::{RenderCtx, RenderTarget, Viewport};
pub use model::{DrawCounts, Model, ModelDesc};
