mod path;
mod renderer;
mod sampler;
mod segment;

pub use path::{CubicBezierPath, LinePath, ParametricPath};
pub use renderer::{
    draw_geometry, Arrowhead, PathGeometry, SegmentGeometry, SegmentRenderer, SegmentStyle,
    TurnGeometry, WaitGeometry, ARROW_HALF_ANGLE, ARROW_LENGTH, DEFAULT_SAMPLE_SPACING,
    PATH_TRIM_DISTANCE, TURN_ARC_RADIUS,
};
pub use sampler::{trailing_heading, PathSample, PathSampler, Samples};
pub use segment::{
    line_segment, HeadingProfile, PathSegment, Segment, TrajectorySequence,
    TurnSegment, WaitSegment,
};
