//! Paint model shared between the frame context and renderers.
//!
//! Scope: color representation (linear premultiplied alpha).

mod color;

pub use color::Color;
