//! Phyllo engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the demo scenes:
//! the window loop, the animation-loop contract, GPU buffers, shader module
//! composition and instanced draw calls.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod render;
