mod axes;
mod compass;
mod robot;
mod trajectory;

pub use axes::AxesEntity;
pub use compass::CompassEntity;
pub use robot::{RobotEntity, ROBOT_SIZE};
pub use trajectory::{TrajectoryEntity, HOVER_RADIUS};

pub const DEFAULT_TAG: &str = "default";
pub const TRAJECTORY_TAG: &str = "trajectory";
pub const ROBOT_TAG: &str = "robot";
