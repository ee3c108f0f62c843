use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::atomic_io::write_bytes_atomic;
use crate::trajectory::{SegmentRenderer, SegmentStyle, TrajectorySequence, PATH_TRIM_DISTANCE};

use super::config::ViewerConfig;
use super::entities::{
    AxesEntity, CompassEntity, RobotEntity, TrajectoryEntity, DEFAULT_TAG, ROBOT_TAG, TRAJECTORY_TAG,
};
use super::entity::{EntityId, NewEntity};
use super::frame::SharedFrame;
use super::input::{CursorTracker, PointerEvent, SharedCanvasSize};
use super::loop_runner::LoopBody;
use super::metrics::MetricsHandle;
use super::registry::EntityRegistry;
use super::rendering::{BackgroundLayer, FieldPainter, FieldTransform, Surface, Viewport};
use super::theme::ColorScheme;
use super::tools::{draw_overlay, OverlayData};
use super::z_index::ZIndexManager;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load background image {path}: {message}")]
    BackgroundLoad { path: PathBuf, message: String },
    #[error("no image format matches the extension of {path}")]
    UnsupportedExportFormat { path: PathBuf },
    #[error("failed to encode image for {path}: {source}")]
    ExportEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write image to {path}: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("entity {entity} failed: {message}")]
    Entity { entity: String, message: String },
}

/// Requests from the window thread, applied at the start of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    TogglePause,
    ToggleOverlay,
    SwitchScheme,
    ExportImage(PathBuf),
    Pointer(PointerEvent),
}

/// Window-side ends of the channels shared with a [`Simulation`].
#[derive(Debug, Clone)]
pub struct ViewerLink {
    pub commands: Sender<SimCommand>,
    pub canvas: SharedCanvasSize,
    pub cursor: CursorTracker,
    pub frame: SharedFrame,
    pub metrics: MetricsHandle,
}

/// Owns the entity registry, the field transform and the frame being drawn.
/// Runs on the loop thread as its [`LoopBody`].
pub struct Simulation {
    registry: EntityRegistry,
    transform: FieldTransform,
    surface: Surface,
    background: BackgroundLayer,
    segment_renderer: SegmentRenderer,
    scheme: ColorScheme,
    show_overlay: bool,
    paused: bool,
    target_tps: u32,
    canvas: SharedCanvasSize,
    cursor: CursorTracker,
    frame: SharedFrame,
    metrics: MetricsHandle,
    commands: Receiver<SimCommand>,
}

impl Simulation {
    /// Loads the configured background and injects the default axes and
    /// compass entities.
    pub fn new(config: &ViewerConfig, assets_dir: &Path) -> Result<(Self, ViewerLink), SimError> {
        let scheme = config.color_scheme;
        let background = BackgroundLayer::load(config.background, scheme, assets_dir)?;
        let transform = FieldTransform::new(
            Viewport::new(config.window_width, config.window_height),
            config.field_size,
        );
        let viewport = transform.viewport();
        let (sender, receiver) = mpsc::channel();
        let link = ViewerLink {
            commands: sender,
            canvas: SharedCanvasSize::new(viewport),
            cursor: CursorTracker::default(),
            frame: SharedFrame::default(),
            metrics: MetricsHandle::default(),
        };

        let mut registry = EntityRegistry::new(ZIndexManager::new(config.tag_hierarchy.iter().cloned()));
        let field_size = transform.field_size();
        registry.add(NewEntity::new(AxesEntity::new(field_size, scheme)).with_tag(DEFAULT_TAG));
        registry.add(NewEntity::new(CompassEntity::new(field_size, scheme)).with_tag(DEFAULT_TAG));

        let simulation = Self {
            registry,
            transform,
            surface: Surface::new(viewport.width, viewport.height),
            background,
            segment_renderer: SegmentRenderer::new(
                config.effective_sample_spacing(),
                PATH_TRIM_DISTANCE,
            ),
            scheme,
            show_overlay: config.show_overlay,
            paused: false,
            target_tps: config.target_tps.max(1),
            canvas: link.canvas.clone(),
            cursor: link.cursor.clone(),
            frame: link.frame.clone(),
            metrics: link.metrics.clone(),
            commands: receiver,
        };
        Ok((simulation, link))
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn transform(&self) -> &FieldTransform {
        &self.transform
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn background(&self) -> &BackgroundLayer {
        &self.background
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn overlay_visible(&self) -> bool {
        self.show_overlay
    }

    /// Queues a trajectory entity drawing `sequence`.
    pub fn add_trajectory(&mut self, sequence: Arc<TrajectorySequence>) -> EntityId {
        let entity = TrajectoryEntity::new(self.segment_renderer, self.scheme).with_sequence(sequence);
        self.registry
            .request_add(NewEntity::new(entity).with_tag(TRAJECTORY_TAG))
    }

    /// Queues a robot entity that plays `sequence` back in a loop.
    pub fn add_robot(&mut self, sequence: Arc<TrajectorySequence>) -> EntityId {
        let entity = RobotEntity::new(sequence, self.scheme);
        self.registry
            .request_add(NewEntity::new(entity).with_tag(ROBOT_TAG))
    }

    /// Renders the background and every trajectory-bearing entity's full path
    /// geometry offscreen at the current canvas size, then writes it in the
    /// format implied by the file extension.
    pub fn export_image(&self, path: &Path) -> Result<(), SimError> {
        let format = ImageFormat::from_path(path).map_err(|_| SimError::UnsupportedExportFormat {
            path: path.to_path_buf(),
        })?;

        let viewport = self.transform.viewport();
        let mut surface = Surface::new(viewport.width, viewport.height);
        self.background.draw(&mut surface, &self.transform);
        let style = SegmentStyle::from_palette(self.scheme.palette());
        let mut trajectory_count = 0usize;
        {
            let mut painter = FieldPainter::new(&mut surface, &self.transform);
            for sequence in self.registry.trajectories() {
                self.segment_renderer
                    .draw_sequence(&mut painter, sequence, &style);
                trajectory_count += 1;
            }
        }

        let mut image = DynamicImage::ImageRgba8(surface.to_rgba_image());
        if format == ImageFormat::Jpeg {
            image = DynamicImage::ImageRgb8(image.to_rgb8());
        }
        let mut encoded = Cursor::new(Vec::new());
        image
            .write_to(&mut encoded, format)
            .map_err(|source| SimError::ExportEncode {
                path: path.to_path_buf(),
                source,
            })?;
        write_bytes_atomic(path, encoded.get_ref()).map_err(|source| SimError::ExportWrite {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            width = viewport.width,
            height = viewport.height,
            trajectories = trajectory_count,
            "image_exported"
        );
        Ok(())
    }

    fn apply_command(&mut self, command: SimCommand) {
        match command {
            SimCommand::TogglePause => {
                self.paused = !self.paused;
                info!(paused = self.paused, "pause_toggled");
            }
            SimCommand::ToggleOverlay => {
                self.show_overlay = !self.show_overlay;
                info!(overlay_visible = self.show_overlay, "overlay_toggled");
            }
            SimCommand::SwitchScheme => {
                self.scheme = self.scheme.toggled();
                self.background.switch_scheme(self.scheme);
                self.registry.switch_scheme_all(self.scheme);
                info!(scheme = ?self.scheme, "scheme_switched");
            }
            SimCommand::ExportImage(path) => {
                if let Err(error) = self.export_image(&path) {
                    warn!(error = %error, "image_export_failed");
                }
            }
            SimCommand::Pointer(event) => {
                self.registry.dispatch_pointer(event, &self.transform);
            }
        }
    }

    fn apply_canvas_size(&mut self) {
        let viewport = self.canvas.get();
        if self.transform.resize(viewport) {
            self.surface.resize(viewport.width, viewport.height);
            debug!(
                width = viewport.width,
                height = viewport.height,
                pixels_per_unit = self.transform.pixels_per_unit(),
                "canvas_resized"
            );
        }
    }
}

impl LoopBody for Simulation {
    /// Picks up a pending canvas resize before commands so pointer hits and
    /// exports see the current transform.
    fn update(&mut self, elapsed: Duration) -> Result<(), SimError> {
        self.apply_canvas_size();
        while let Ok(command) = self.commands.try_recv() {
            self.apply_command(command);
        }
        self.registry.reconcile();
        if self.paused {
            return Ok(());
        }
        self.registry.update_all(elapsed)
    }

    fn render(&mut self) -> Result<(), SimError> {
        self.apply_canvas_size();
        self.background.draw(&mut self.surface, &self.transform);
        {
            let mut painter = FieldPainter::new(&mut self.surface, &self.transform);
            self.registry.render_all(&mut painter);
        }
        if self.show_overlay {
            let overlay = OverlayData {
                metrics: self.metrics.snapshot(),
                target_tps: self.target_tps,
                entity_count: self.registry.len(),
                cursor_field: self
                    .cursor
                    .position()
                    .map(|screen| self.transform.screen_to_field(screen)),
                scheme: self.scheme,
                paused: self.paused,
            };
            draw_overlay(&mut self.surface, &overlay);
        }
        self.frame.publish(&self.surface);
        Ok(())
    }
}
