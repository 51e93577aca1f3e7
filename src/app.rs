//! Windowed front-end.
//!
//! [`App`] wires the simulation context to a winit window and the wgpu
//! [`PointRenderer`]. Each redraw is one frame:
//!
//! 1. tick the clock and fire input triggers (advance, explode, cancel)
//! 2. apply any finished shape loads
//! 3. fire due transition events and integrate
//! 4. upload positions if dirty and present
//!
//! The exit transition ends the event loop after handing the destination to
//! the exit handler, which by default only logs it.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::SceneConfig;
use crate::context::SimulationContext;
use crate::error::AppError;
use crate::gpu::PointRenderer;
use crate::input::{Input, Trigger};
use crate::loader::ShapeLoader;
use crate::pointer::Camera;
use crate::sampler::ImageSampler;
use crate::time::FrameClock;
use crate::transition::TransitionEvent;

const INITIAL_SIZE: (u32, u32) = (1280, 720);
const SLOW_FRAME: std::time::Duration = std::time::Duration::from_millis(100);

/// Called with the destination when the exit transition fires.
pub type ExitHandler = Box<dyn FnMut(&str)>;

/// The interactive scene.
pub struct App {
    context: SimulationContext,
    loader: ShapeLoader,
    camera: Camera,
    input: Input,
    clock: FrameClock,
    rng: SmallRng,
    config: SceneConfig,
    window: Option<Arc<Window>>,
    renderer: Option<PointRenderer>,
    on_exit: ExitHandler,
    error: Option<AppError>,
}

impl App {
    /// Sample the first shape and prepare the scene. No window is opened yet.
    pub fn new(config: SceneConfig) -> Result<Self, AppError> {
        config.validate()?;
        let context = SimulationContext::load(&config)?;
        let (w, h) = INITIAL_SIZE;

        Ok(Self {
            context,
            loader: ShapeLoader::new(ImageSampler::new(config.sampler), config.sample_timeout()),
            camera: Camera::new(config.camera, w, h),
            input: Input::new(w, h),
            clock: FrameClock::new(),
            rng: SmallRng::from_entropy(),
            config,
            window: None,
            renderer: None,
            on_exit: Box::new(|destination| log::info!("exit to {}", destination)),
            error: None,
        })
    }

    /// Use a fixed seed for explosion velocities.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Replace the exit handler.
    pub fn on_exit<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&str) + 'static,
    {
        self.on_exit = Box::new(handler);
        self
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Open the window and run until it closes or the exit transition fires.
    pub fn run(mut self) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn handle_triggers(&mut self, now: std::time::Duration) {
        for trigger in self.input.triggers() {
            match trigger {
                Trigger::AdvanceShape => {
                    let Some(request) = self.context.advance_shape() else {
                        continue;
                    };
                    let started = self.loader.request(request.generation, &request.path, now);
                    if let Err(e) = started {
                        log::warn!(
                            "could not start loading {}: {}",
                            request.path.display(),
                            e
                        );
                    }
                }
                Trigger::Explode => {
                    self.context.explode(now, &mut self.rng);
                }
                Trigger::Cancel => {
                    self.context.cancel();
                }
            }
        }
        self.input.begin_frame();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.tick();
        if self.clock.delta() > SLOW_FRAME {
            log::debug!("slow frame {}: {:?}", self.clock.frame(), self.clock.delta());
        }

        self.handle_triggers(now);
        self.context.pointer_moved(self.input.mouse_ndc());

        for sample in self.loader.poll(now) {
            if let Some(outcome) = self.context.apply_sample(sample) {
                log::info!("shape applied: {:?}", outcome);
            }
        }

        for event in self.context.frame(now, &self.camera) {
            match event {
                TransitionEvent::FadeIn { duration } => {
                    log::debug!("fading out over {:?}", duration);
                }
                TransitionEvent::Exit { destination } => {
                    (self.on_exit)(&destination);
                    event_loop.exit();
                    return;
                }
            }
        }

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if self.context.take_dirty() {
            renderer.upload_positions(self.context.buffer().positions());
        }
        match renderer.render(self.camera.view_proj(), self.context.fade_opacity(now)) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = renderer.size();
                renderer.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        if self.clock.frame() % 600 == 0 {
            log::trace!(
                "frame {} at {:.1} fps, {:.1}s elapsed",
                self.clock.frame(),
                self.clock.fps(),
                self.clock.elapsed().as_secs_f32()
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let (w, h) = INITIAL_SIZE;
        let window_attrs = Window::default_attributes()
            .with_title("pmorph")
            .with_inner_size(winit::dpi::PhysicalSize::new(w, h));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let size = window.inner_size();
        self.camera.resize(size.width, size.height);
        self.input.set_window_size(size.width, size.height);

        let renderer = pollster::block_on(PointRenderer::new(
            window.clone(),
            self.context.capacity(),
            self.config.style,
        ));
        match renderer {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.camera.resize(size.width, size.height);
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
