use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::{FrameCtx, GpuCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Animation-loop contract implemented by scenes.
///
/// The runtime calls [`initialize`](App::initialize) once after the GPU is
/// ready, [`render`](App::render) once per frame, and
/// [`finalize`](App::finalize) once before the GPU goes away. Resources
/// created in `initialize` travel in `State`.
pub trait App {
    type State;

    /// Short human-readable description of the scene.
    fn info(&self) -> &str {
        ""
    }

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Creates GPU resources. An error stops the loop.
    fn initialize(&mut self, ctx: &GpuCtx<'_, '_>) -> Result<Self::State>;

    /// Called once per animation frame.
    fn render(&mut self, state: &mut Self::State, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Releases resources created in `initialize`.
    fn finalize(&mut self, state: Self::State, ctx: &GpuCtx<'_, '_>) {
        let _ = ctx;
        drop(state);
    }
}
