use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

/// Number of recent ticks the phase timings cover.
const TIMING_WINDOW_TICKS: usize = 120;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Last, mean and worst duration of one tick phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseStats {
    pub last_ms: f32,
    pub avg_ms: f32,
    pub max_ms: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickTimings {
    pub update: PhaseStats,
    pub render: PhaseStats,
    /// How far each tick finished past its deadline; on-time ticks count as
    /// zero.
    pub overrun: PhaseStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    /// Exponentially smoothed tick rate.
    pub measured_tps: f32,
    /// Ticks per second over the last completed metrics interval.
    pub interval_tps: f32,
    pub timings: TickTimings,
    /// Ticks whose update and render finished at or after their deadline.
    pub late_ticks: u64,
    pub total_ticks: u64,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// One finished tick as observed by the loop thread.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickRecord {
    pub(crate) started: Instant,
    pub(crate) update: Duration,
    pub(crate) render: Duration,
    pub(crate) finished: Instant,
    pub(crate) deadline: Instant,
}

impl TickRecord {
    pub(crate) fn is_late(&self) -> bool {
        self.finished >= self.deadline
    }

    fn overrun(&self) -> Duration {
        self.finished.saturating_duration_since(self.deadline)
    }
}

/// Sliding window of phase durations. Sums stay in integer nanoseconds so
/// eviction never drifts the mean.
#[derive(Debug, Default)]
struct PhaseWindow {
    samples: VecDeque<Duration>,
    total: Duration,
}

impl PhaseWindow {
    fn push(&mut self, sample: Duration) {
        if self.samples.len() == TIMING_WINDOW_TICKS {
            if let Some(evicted) = self.samples.pop_front() {
                self.total = self.total.saturating_sub(evicted);
            }
        }
        self.samples.push_back(sample);
        self.total = self.total.saturating_add(sample);
    }

    fn stats(&self) -> PhaseStats {
        let Some(&last) = self.samples.back() else {
            return PhaseStats::default();
        };
        let worst = self.samples.iter().copied().max().unwrap_or_default();
        PhaseStats {
            last_ms: millis(last),
            avg_ms: millis(self.total) / self.samples.len() as f32,
            max_ms: millis(worst),
        }
    }
}

fn millis(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}

/// Tick-rate and phase-timing bookkeeping owned by the loop thread.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    interval_ticks: u32,
    interval_tps: f32,
    smoothing: f32,
    smoothed_tick_secs: Option<f32>,
    last_tick: Option<Instant>,
    late_ticks: u64,
    total_ticks: u64,
    update_window: PhaseWindow,
    render_window: PhaseWindow,
    overrun_window: PhaseWindow,
}

impl MetricsAccumulator {
    pub(crate) fn starting_at(now: Instant, interval: Duration, smoothing: f32) -> Self {
        Self {
            interval_start: now,
            interval,
            interval_ticks: 0,
            interval_tps: 0.0,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            smoothed_tick_secs: None,
            last_tick: None,
            late_ticks: 0,
            total_ticks: 0,
            update_window: PhaseWindow::default(),
            render_window: PhaseWindow::default(),
            overrun_window: PhaseWindow::default(),
        }
    }

    /// Records a finished tick and reports whether it was late.
    ///
    /// Smoothing is applied to the tick interval rather than the rate so a
    /// jittery interval does not bias the reported rate upward.
    pub(crate) fn record_tick(&mut self, tick: TickRecord) -> bool {
        let late = tick.is_late();
        self.total_ticks = self.total_ticks.saturating_add(1);
        self.interval_ticks = self.interval_ticks.saturating_add(1);
        if late {
            self.late_ticks = self.late_ticks.saturating_add(1);
        }
        self.update_window.push(tick.update);
        self.render_window.push(tick.render);
        self.overrun_window.push(tick.overrun());

        if let Some(previous) = self.last_tick.replace(tick.started) {
            let tick_secs = tick.started.saturating_duration_since(previous).as_secs_f32();
            self.smoothed_tick_secs = Some(match self.smoothed_tick_secs {
                Some(smoothed) => smoothed + self.smoothing * (tick_secs - smoothed),
                None => tick_secs,
            });
        }
        late
    }

    pub(crate) fn measured_tps(&self) -> f32 {
        match self.smoothed_tick_secs {
            Some(secs) if secs > f32::EPSILON => 1.0 / secs,
            _ => 0.0,
        }
    }

    /// Closes the current interval once it has elapsed and returns its rate.
    pub(crate) fn maybe_close_interval(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        self.interval_tps = self.interval_ticks as f32 / elapsed_seconds;
        self.interval_start = now;
        self.interval_ticks = 0;
        Some(self.interval_tps)
    }

    pub(crate) fn snapshot(&self) -> LoopMetricsSnapshot {
        LoopMetricsSnapshot {
            measured_tps: self.measured_tps(),
            interval_tps: self.interval_tps,
            timings: TickTimings {
                update: self.update_window.stats(),
                render: self.render_window.stats(),
                overrun: self.overrun_window.stats(),
            },
            late_ticks: self.late_ticks,
            total_ticks: self.total_ticks,
        }
    }
}
