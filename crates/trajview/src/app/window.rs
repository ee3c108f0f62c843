use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use crate::geometry::Vec2;
use crate::StartupError;

use super::config::ViewerConfig;
use super::input::{PointerEvent, ViewerAction};
use super::loop_runner::{LoopError, LoopManager, LoopState};
use super::rendering::Viewport;
use super::simulation::{SimCommand, SimError, Simulation, ViewerLink};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Simulation(#[from] SimError),
    #[error(transparent)]
    Loop(#[from] LoopError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn action_for_key(key: KeyCode) -> Option<ViewerAction> {
    match key {
        KeyCode::Space => Some(ViewerAction::TogglePause),
        KeyCode::F3 => Some(ViewerAction::ToggleOverlay),
        KeyCode::F4 => Some(ViewerAction::SwitchScheme),
        KeyCode::F12 => Some(ViewerAction::ExportImage),
        KeyCode::Escape => Some(ViewerAction::Quit),
        _ => None,
    }
}

/// Maps an action to the command sent to the loop thread. `Quit` is handled
/// by the window itself.
pub fn command_for_action(action: ViewerAction, export_dir: &Path, timestamp_ms: u128) -> Option<SimCommand> {
    match action {
        ViewerAction::TogglePause => Some(SimCommand::TogglePause),
        ViewerAction::ToggleOverlay => Some(SimCommand::ToggleOverlay),
        ViewerAction::SwitchScheme => Some(SimCommand::SwitchScheme),
        ViewerAction::ExportImage => Some(SimCommand::ExportImage(
            export_dir.join(export_file_name(timestamp_ms)),
        )),
        ViewerAction::Quit => None,
    }
}

pub fn export_file_name(timestamp_ms: u128) -> String {
    format!("trajview-{timestamp_ms}.png")
}

/// Opens the viewer window, starts `simulation` on the loop thread and blocks
/// until the window closes or the loop stops on a fatal error.
pub fn run_viewer(
    config: &ViewerConfig,
    simulation: Simulation,
    link: ViewerLink,
    export_dir: PathBuf,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut presenter =
        Presenter::new(Arc::clone(&window), size.width, size.height).map_err(AppError::CreateRenderer)?;
    link.canvas.set(Viewport::new(size.width, size.height));

    let loop_config = config.loop_config();
    let redraw_interval = loop_config.tick_duration();
    info!(
        target_tps = loop_config.target_tps,
        max_elapsed_ms = loop_config.max_elapsed.as_millis() as u64,
        metrics_log_interval_ms = loop_config.metrics_log_interval.as_millis() as u64,
        width = size.width,
        height = size.height,
        export_dir = %export_dir.display(),
        "viewer_config"
    );
    let mut manager = LoopManager::new(loop_config, link.metrics.clone());
    manager.start(simulation)?;

    let run_result = event_loop.run(|event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                window_target.exit();
            }
            WindowEvent::Resized(new_size) => {
                link.canvas.set(Viewport::new(new_size.width, new_size.height));
                if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    window_target.exit();
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                link.canvas.set(Viewport::new(size.width, size.height));
                if let Err(error) = presenter.resize(size.width, size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    window_target.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let event = PointerEvent::Moved(Vec2::new(position.x, position.y));
                link.cursor.apply(event);
                send_command(&link, SimCommand::Pointer(event));
            }
            WindowEvent::CursorLeft { .. } => {
                link.cursor.apply(PointerEvent::Left);
                send_command(&link, SimCommand::Pointer(PointerEvent::Left));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(action) = pressed_action(&event) else {
                    return;
                };
                if action == ViewerAction::Quit {
                    info!(reason = "escape_key", "shutdown_requested");
                    window_target.exit();
                } else if let Some(command) = command_for_action(action, &export_dir, now_ms()) {
                    send_command(&link, command);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = presenter.present(&link) {
                    warn!(error = %error, "renderer_draw_failed");
                    window_target.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            if manager.state() == LoopState::Stopped {
                warn!("loop_halted");
                window_target.exit();
                return;
            }
            window.request_redraw();
            window_target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + redraw_interval));
        }
        Event::LoopExiting => {
            info!("shutdown");
        }
        _ => {}
    });

    let exit = manager.stop()?;
    run_result.map_err(AppError::EventLoopRun)?;
    match exit.fatal {
        Some(error) => Err(AppError::Simulation(error)),
        None => Ok(()),
    }
}

fn pressed_action(event: &KeyEvent) -> Option<ViewerAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(code) => action_for_key(code),
        PhysicalKey::Unidentified(_) => None,
    }
}

fn send_command(link: &ViewerLink, command: SimCommand) {
    if let Err(error) = link.commands.send(command) {
        debug!(command = ?error.0, "command_dropped");
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Window-side pixel buffer. Copies the newest published frame and presents it.
struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    seen_generation: u64,
}

impl Presenter {
    fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, PixelsError> {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = Self::build_pixels(Arc::clone(&window), width, height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport::new(width, height),
            seen_generation: 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), PixelsError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport::new(width, height);
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, PixelsError> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    fn present(&mut self, link: &ViewerLink) -> Result<(), PixelsError> {
        if link
            .frame
            .copy_latest_into(self.pixels.frame_mut(), self.viewport, &mut self.seen_generation)
        {
            self.pixels.render()?;
        }
        Ok(())
    }
}
