//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and scenes: the
//! [`App`] lifecycle and the contexts handed to each callback.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, GpuCtx, WindowCtx};
