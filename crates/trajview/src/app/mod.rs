mod config;
mod entities;
mod entity;
mod frame;
mod input;
mod loop_runner;
mod metrics;
mod registry;
mod rendering;
mod simulation;
mod theme;
mod tools;
mod window;
mod z_index;

pub use config::ViewerConfig;
pub use entities::{
    AxesEntity, CompassEntity, RobotEntity, TrajectoryEntity, DEFAULT_TAG, HOVER_RADIUS,
    ROBOT_SIZE, ROBOT_TAG, TRAJECTORY_TAG,
};
pub use entity::{
    Entity, EntityBehavior, EntityId, NewEntity, PointerInteractive, RegistryAware, Renderable,
    Themed, Updatable,
};
pub use frame::SharedFrame;
pub use input::{CursorTracker, PointerEvent, SharedCanvasSize, ViewerAction};
pub use loop_runner::{
    FailureHandler, FailurePolicy, LoopBody, LoopConfig, LoopError, LoopExit, LoopManager,
    LoopState,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle, PhaseStats, TickTimings};
pub use registry::{EntityCommands, EntityRegistry};
pub use rendering::{
    arc_points, Background, BackgroundLayer, FieldPainter, FieldTransform, Rgba, Surface,
    Viewport, DEFAULT_FIELD_SIZE,
};
pub use simulation::{SimCommand, SimError, Simulation, ViewerLink};
pub use theme::{ColorScheme, Palette};
pub use window::{action_for_key, command_for_action, export_file_name, run_viewer, AppError};
pub use z_index::{ZIndexManager, DEFAULT_TAG_HIERARCHY, UNRANKED};
