use std::iter::FusedIterator;

use crate::geometry::Vec2;

use super::path::ParametricPath;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub distance: f64,
    pub position: Vec2,
}

/// Evenly spaced arc-length samples of a path with `trim` removed at both
/// ends.
///
/// With `N = max(1, ceil(length / spacing))` the candidate distances are
/// `i * length / N` for `i in 0..=N`; any distance within `trim` of either
/// endpoint (inclusive) is skipped. Iteration is lazy and can be restarted by
/// calling [`PathSampler::iter`] again.
#[derive(Debug, Clone, Copy)]
pub struct PathSampler<'p> {
    path: &'p dyn ParametricPath,
    length: f64,
    trim: f64,
    steps: usize,
}

impl<'p> PathSampler<'p> {
    pub fn new(path: &'p dyn ParametricPath, spacing: f64, trim: f64) -> Self {
        let length = path.length().max(0.0);
        Self {
            path,
            length,
            trim: trim.max(0.0),
            steps: step_count(length, spacing),
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// True when trimming leaves nothing to sample.
    pub fn is_degenerate(&self) -> bool {
        self.length <= 2.0 * self.trim
    }

    pub fn iter(&self) -> Samples<'p> {
        Samples {
            path: self.path,
            length: self.length,
            trim: self.trim,
            steps: self.steps,
            next_index: 0,
        }
    }
}

impl<'p> IntoIterator for &PathSampler<'p> {
    type Item = PathSample;
    type IntoIter = Samples<'p>;

    fn into_iter(self) -> Samples<'p> {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Samples<'p> {
    path: &'p dyn ParametricPath,
    length: f64,
    trim: f64,
    steps: usize,
    next_index: usize,
}

impl Iterator for Samples<'_> {
    type Item = PathSample;

    fn next(&mut self) -> Option<PathSample> {
        while self.next_index <= self.steps {
            let index = self.next_index;
            self.next_index += 1;
            let distance = index as f64 * self.length / self.steps as f64;
            if distance <= self.trim || distance >= self.length - self.trim {
                continue;
            }
            return Some(PathSample {
                distance,
                position: self.path.point_at(distance),
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps + 1).saturating_sub(self.next_index);
        (0, Some(remaining))
    }
}

impl FusedIterator for Samples<'_> {}

/// Slack for lengths that are whole multiples of the spacing up to rounding.
const STEP_EPSILON: f64 = 1e-9;

fn step_count(length: f64, spacing: f64) -> usize {
    if !spacing.is_finite() || spacing <= 0.0 || !length.is_finite() {
        return 1;
    }
    ((length / spacing - STEP_EPSILON).ceil() as usize).max(1)
}

/// Direction of travel between the last two points, if there are two.
pub fn trailing_heading(points: &[Vec2]) -> Option<f64> {
    match points {
        [.., prev, last] => Some((*last - *prev).angle()),
        _ => None,
    }
}
