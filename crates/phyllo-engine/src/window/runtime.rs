use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, GpuCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Close the window when Escape is pressed.
    pub exit_on_escape: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "phyllo".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            exit_on_escape: true,
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until the window closes or the app
    /// asks to exit. Returns an error if the event loop or app initialization fails.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    scene: Option<A::State>,

    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            scene: None,
            exit_requested: false,
            failure: None,
        }
    }

    /// Records a startup failure; [`Runtime::run`] returns it once the loop exits.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.failure = Some(err);
        self.exit_requested = true;
        self.shutdown();
        event_loop.exit();
    }

    /// Runs the app's `initialize` against the freshly created window entry.
    fn initialize_scene(&mut self) -> Result<()> {
        let Some(entry) = self.entry.as_ref() else {
            anyhow::bail!("no window to initialize the scene on");
        };
        let app = &mut self.app;

        let scene = entry.with(|fields| {
            let ctx = GpuCtx {
                window: WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                gpu: fields.gpu,
            };
            app.initialize(&ctx)
        });

        self.scene = Some(scene.context("scene initialization failed")?);
        log::info!("scene initialized");

        // Setup time is not frame time.
        if let Some(entry) = self.entry.as_mut() {
            entry.with_clock_mut(|clock| clock.reset());
        }
        Ok(())
    }

    /// Runs `finalize` (once) and drops the GPU before the window.
    fn shutdown(&mut self) {
        let app = &mut self.app;
        let mut frames = 0;
        let finalized = teardown(&mut self.entry, &mut self.scene, |entry, scene| {
            entry.with(|fields| {
                frames = fields.clock.frames();
                let ctx = GpuCtx {
                    window: WindowCtx {
                        id: fields.window.id(),
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                };
                app.finalize(scene, &ctx);
            });
        });

        if finalized {
            log::info!("scene finalized after {frames} frames");
        }
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::Exit => self.exit_requested = true,
            }
        }

        if self.exit_requested {
            self.shutdown();
            event_loop.exit();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut app_control = AppControl::Continue;

        let (app, entry, scene) = (&mut self.app, &mut self.entry, &mut self.scene);
        let (Some(entry), Some(scene)) = (entry.as_mut(), scene.as_mut()) else {
            return;
        };

        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            if time.frame_index == 0 {
                log::debug!("first frame");
            }

            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                time,
                runtime: &mut runtime_ctx,
            };

            app_control = app.render(scene, &mut ctx);
        });

        if app_control == AppControl::Exit {
            runtime_ctx.exit();
        }

        self.apply_commands(event_loop, runtime_ctx);
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        let info = self.app.info();
        if !info.is_empty() {
            log::info!("{}", info.trim());
        }

        let entry = match create_window_entry(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(entry) => entry,
            Err(err) => return self.fail(event_loop, err),
        };
        self.entry = Some(entry);

        if let Err(err) = self.initialize_scene() {
            return self.fail(event_loop, err);
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous animation loop: one redraw per iteration.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.exit_requested = true;
            self.shutdown();
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event: key, .. }
                if self.config.exit_on_escape
                    && key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.exit_requested = true;
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Takes the window entry and, if a scene is live, hands both to `finalize`
/// before the entry drops. Returns whether `finalize` ran; later calls are no-ops.
fn teardown<E, S>(
    entry: &mut Option<E>,
    scene: &mut Option<S>,
    finalize: impl FnOnce(&E, S),
) -> bool {
    let Some(entry) = entry.take() else {
        return false;
    };

    let finalized = match scene.take() {
        Some(scene) => {
            finalize(&entry, scene);
            true
        }
        None => false,
    };

    drop(entry);
    finalized
}

fn create_window_entry(
    event_loop: &ActiveEventLoop,
    config: &RuntimeConfig,
    gpu_init: GpuInit,
) -> Result<WindowEntry> {
    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(config.initial_size);

    let window = event_loop
        .create_window(attrs)
        .context("failed to create window")?;

    WindowEntryTryBuilder {
        clock: FrameClock::default(),
        window,
        gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
    }
    .try_build()
    .context("GPU initialization failed for window")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_runs_once_across_repeated_shutdowns() {
        let mut entry = Some("window");
        let mut scene = Some(vec![1, 2, 3]);
        let mut finalized = Vec::new();

        // Close request, then Escape, then the loop's `exiting`.
        for _ in 0..3 {
            teardown(&mut entry, &mut scene, |e, s| finalized.push((*e, s)));
        }

        assert_eq!(finalized, [("window", vec![1, 2, 3])]);
        assert!(entry.is_none());
        assert!(scene.is_none());
    }

    #[test]
    fn failed_initialization_skips_finalize() {
        let mut entry = Some(());
        let mut scene: Option<u32> = None;
        let mut calls = 0;

        assert!(!teardown(&mut entry, &mut scene, |_, _| calls += 1));
        assert_eq!(calls, 0);
        assert!(entry.is_none());
    }

    #[test]
    fn teardown_without_window_is_a_noop() {
        let mut entry: Option<()> = None;
        let mut scene = Some(7u32);

        assert!(!teardown(&mut entry, &mut scene, |_, _| unreachable!()));
        assert_eq!(scene, Some(7));
    }
}
