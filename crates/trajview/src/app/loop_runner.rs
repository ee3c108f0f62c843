use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use super::metrics::{MetricsAccumulator, MetricsHandle, TickRecord};
use super::simulation::SimError;

const LOOP_THREAD_NAME: &str = "trajview-loop";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Upper bound on the elapsed time handed to a single update.
    pub max_elapsed: Duration,
    pub metrics_log_interval: Duration,
    /// Weight of the newest tick interval in the smoothed rate, in `(0, 1]`.
    pub rate_smoothing: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_elapsed: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            rate_smoothing: 0.1,
        }
    }
}

impl LoopConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

/// Work performed once per tick: update first, then render.
pub trait LoopBody: Send + 'static {
    fn update(&mut self, elapsed: Duration) -> Result<(), SimError>;
    fn render(&mut self) -> Result<(), SimError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Stop,
    Continue,
}

pub type FailureHandler = Arc<dyn Fn(&SimError) -> FailurePolicy + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("loop is already running")]
    AlreadyRunning,
    #[error("loop is not running")]
    NotRunning,
    #[error("failed to spawn loop thread: {0}")]
    SpawnWorker(#[source] io::Error),
    #[error("loop thread panicked")]
    WorkerPanicked,
}

/// Returned when the loop thread finishes: the body back to its owner plus
/// the error that stopped scheduling, if any.
#[derive(Debug)]
pub struct LoopExit<B> {
    pub body: B,
    pub fatal: Option<SimError>,
}

/// Drives a [`LoopBody`] at a fixed tick rate on a dedicated thread.
///
/// `Stopped -> Running` on [`LoopManager::start`]; back to `Stopped` on
/// [`LoopManager::stop`] or when the failure handler returns
/// [`FailurePolicy::Stop`]. A stop request takes effect at the next tick
/// boundary.
pub struct LoopManager<B: LoopBody> {
    config: LoopConfig,
    running: Arc<AtomicBool>,
    metrics: MetricsHandle,
    failure_handler: FailureHandler,
    worker: Option<JoinHandle<LoopExit<B>>>,
}

impl<B: LoopBody> LoopManager<B> {
    pub fn new(config: LoopConfig, metrics: MetricsHandle) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            metrics,
            failure_handler: Arc::new(|_: &SimError| FailurePolicy::Stop),
            worker: None,
        }
    }

    pub fn with_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SimError) -> FailurePolicy + Send + Sync + 'static,
    {
        self.failure_handler = Arc::new(handler);
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    pub fn state(&self) -> LoopState {
        if self.worker.is_some() && self.running.load(Ordering::Acquire) {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    /// Starts ticking `body`. A loop that already stopped on its own after a
    /// fatal error is joined and discarded first; use [`LoopManager::stop`]
    /// beforehand to get its body and error back.
    pub fn start(&mut self, body: B) -> Result<(), LoopError> {
        if self.worker.is_some() {
            if self.running.load(Ordering::Acquire) {
                return Err(LoopError::AlreadyRunning);
            }
            let exit = self.stop()?;
            warn!(fatal = exit.fatal.is_some(), "stopped_loop_discarded");
        }
        self.running.store(true, Ordering::Release);
        let worker = LoopWorker {
            config: self.config.clone(),
            running: Arc::clone(&self.running),
            metrics: self.metrics.clone(),
            failure_handler: Arc::clone(&self.failure_handler),
        };
        let handle = thread::Builder::new()
            .name(LOOP_THREAD_NAME.to_string())
            .spawn(move || worker.run(body))
            .map_err(|source| {
                self.running.store(false, Ordering::Release);
                LoopError::SpawnWorker(source)
            })?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Requests a stop and joins the loop thread. Also collects a loop that
    /// already stopped on its own after a fatal error.
    pub fn stop(&mut self) -> Result<LoopExit<B>, LoopError> {
        let worker = self.worker.take().ok_or(LoopError::NotRunning)?;
        self.running.store(false, Ordering::Release);
        worker.thread().unpark();
        worker.join().map_err(|_| LoopError::WorkerPanicked)
    }
}

impl<B: LoopBody> Drop for LoopManager<B> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(error) = self.stop() {
                warn!(error = %error, "loop_stop_on_drop_failed");
            }
        }
    }
}

struct LoopWorker {
    config: LoopConfig,
    running: Arc<AtomicBool>,
    metrics: MetricsHandle,
    failure_handler: FailureHandler,
}

impl LoopWorker {
    fn run<B: LoopBody>(self, mut body: B) -> LoopExit<B> {
        let tick = self.config.tick_duration();
        let max_elapsed = normalize_non_zero_duration(self.config.max_elapsed, Duration::from_millis(250));
        let metrics_log_interval =
            normalize_non_zero_duration(self.config.metrics_log_interval, Duration::from_secs(1));
        info!(
            target_tps = self.config.target_tps.max(1),
            max_elapsed_ms = max_elapsed.as_millis() as u64,
            metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
            rate_smoothing = self.config.rate_smoothing,
            "loop_started"
        );

        let started = Instant::now();
        let mut accumulator =
            MetricsAccumulator::starting_at(started, metrics_log_interval, self.config.rate_smoothing);
        let mut previous_tick = started;
        let mut deadline = started + tick;
        let mut fatal = None;

        while self.running.load(Ordering::Acquire) {
            let tick_start = Instant::now();
            let elapsed = tick_start
                .saturating_duration_since(previous_tick)
                .min(max_elapsed);
            previous_tick = tick_start;

            if let Err(error) = self.check_step(body.update(elapsed), "update") {
                fatal = Some(error);
                break;
            }
            let update_done = Instant::now();
            if let Err(error) = self.check_step(body.render(), "render") {
                fatal = Some(error);
                break;
            }
            let render_done = Instant::now();
            let late = accumulator.record_tick(TickRecord {
                started: tick_start,
                update: update_done.saturating_duration_since(tick_start),
                render: render_done.saturating_duration_since(update_done),
                finished: render_done,
                deadline,
            });
            if let Some(interval_tps) = accumulator.maybe_close_interval(render_done) {
                let snapshot = accumulator.snapshot();
                info!(
                    measured_tps = snapshot.measured_tps,
                    interval_tps,
                    late_ticks = snapshot.late_ticks,
                    total_ticks = snapshot.total_ticks,
                    update_avg_ms = snapshot.timings.update.avg_ms,
                    render_avg_ms = snapshot.timings.render.avg_ms,
                    overrun_max_ms = snapshot.timings.overrun.max_ms,
                    "loop_metrics"
                );
            }
            self.metrics.publish(accumulator.snapshot());

            if late {
                deadline = render_done + tick;
            } else {
                self.sleep_until(deadline);
                deadline += tick;
            }
        }

        self.running.store(false, Ordering::Release);
        let snapshot = accumulator.snapshot();
        info!(
            total_ticks = snapshot.total_ticks,
            late_ticks = snapshot.late_ticks,
            fatal = fatal.is_some(),
            "loop_stopped"
        );
        LoopExit { body, fatal }
    }

    fn check_step(&self, result: Result<(), SimError>, phase: &'static str) -> Result<(), SimError> {
        let Err(failure) = result else {
            return Ok(());
        };
        match (self.failure_handler)(&failure) {
            FailurePolicy::Continue => {
                warn!(phase, error = %failure, "loop_tick_failed");
                Ok(())
            }
            FailurePolicy::Stop => {
                error!(phase, error = %failure, "loop_fatal_error");
                Err(failure)
            }
        }
    }

    /// Parks until the deadline; `stop` unparks so a long tick does not delay
    /// shutdown.
    fn sleep_until(&self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline || !self.running.load(Ordering::Acquire) {
                return;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingBody {
        updates: Arc<AtomicUsize>,
        renders: usize,
        fail_update_at: Option<usize>,
        fail_render_always: bool,
        render_cost: Duration,
        order: Vec<&'static str>,
    }

    impl LoopBody for CountingBody {
        fn update(&mut self, _elapsed: Duration) -> Result<(), SimError> {
            let count = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
            if self.order.len() < 4 {
                self.order.push("update");
            }
            if self.fail_update_at == Some(count) {
                return Err(SimError::Entity {
                    entity: "counting".to_string(),
                    message: format!("failed at tick {count}"),
                });
            }
            Ok(())
        }

        fn render(&mut self) -> Result<(), SimError> {
            self.renders += 1;
            if self.order.len() < 4 {
                self.order.push("render");
            }
            if !self.render_cost.is_zero() {
                thread::sleep(self.render_cost);
            }
            if self.fail_render_always {
                return Err(SimError::Entity {
                    entity: "counting".to_string(),
                    message: "render failed".to_string(),
                });
            }
            Ok(())
        }
    }

    fn fast_config() -> LoopConfig {
        LoopConfig {
            target_tps: 200,
            ..LoopConfig::default()
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn start_then_stop_returns_body_and_alternates_phases() {
        let mut manager = LoopManager::new(fast_config(), MetricsHandle::default());
        assert_eq!(manager.state(), LoopState::Stopped);

        let updates = Arc::new(AtomicUsize::new(0));
        let body = CountingBody {
            updates: Arc::clone(&updates),
            ..CountingBody::default()
        };
        manager.start(body).expect("start");
        assert_eq!(manager.state(), LoopState::Running);
        assert!(wait_for(|| updates.load(Ordering::SeqCst) >= 3, Duration::from_secs(5)));

        let exit = manager.stop().expect("stop");
        assert_eq!(manager.state(), LoopState::Stopped);
        assert!(exit.fatal.is_none());
        assert_eq!(exit.body.order, vec!["update", "render", "update", "render"]);
        assert_eq!(exit.body.renders, updates.load(Ordering::SeqCst));
    }

    #[test]
    fn double_start_and_stop_without_start_are_rejected() {
        let mut manager = LoopManager::new(fast_config(), MetricsHandle::default());
        assert!(matches!(manager.stop(), Err(LoopError::NotRunning)));

        manager.start(CountingBody::default()).expect("start");
        assert!(matches!(
            manager.start(CountingBody::default()),
            Err(LoopError::AlreadyRunning)
        ));
        manager.stop().expect("stop");
    }

    #[test]
    fn default_failure_policy_stops_scheduling() {
        let mut manager = LoopManager::new(fast_config(), MetricsHandle::default());
        let updates = Arc::new(AtomicUsize::new(0));
        manager
            .start(CountingBody {
                updates: Arc::clone(&updates),
                fail_update_at: Some(3),
                ..CountingBody::default()
            })
            .expect("start");

        assert!(wait_for(
            || manager.state() == LoopState::Stopped,
            Duration::from_secs(5)
        ));
        let exit = manager.stop().expect("collect stopped loop");
        assert!(matches!(exit.fatal, Some(SimError::Entity { .. })));
        assert_eq!(updates.load(Ordering::SeqCst), 3);
        // the failing tick never reaches render
        assert_eq!(exit.body.renders, 2);
    }

    #[test]
    fn loop_restarts_after_stopping_on_a_fatal_error() {
        let mut manager = LoopManager::new(fast_config(), MetricsHandle::default());
        manager
            .start(CountingBody {
                fail_update_at: Some(1),
                ..CountingBody::default()
            })
            .expect("start");
        assert!(wait_for(
            || manager.state() == LoopState::Stopped,
            Duration::from_secs(5)
        ));

        let updates = Arc::new(AtomicUsize::new(0));
        manager
            .start(CountingBody {
                updates: Arc::clone(&updates),
                ..CountingBody::default()
            })
            .expect("restart from stopped");
        assert_eq!(manager.state(), LoopState::Running);
        assert!(wait_for(|| updates.load(Ordering::SeqCst) >= 3, Duration::from_secs(5)));

        let exit = manager.stop().expect("stop");
        assert!(exit.fatal.is_none());
        assert!(exit.body.renders >= 3);
    }

    #[test]
    fn overlong_ticks_run_back_to_back_without_sleeping() {
        let metrics = MetricsHandle::default();
        let config = LoopConfig {
            target_tps: 100,
            rate_smoothing: 0.5,
            ..LoopConfig::default()
        };
        let mut manager = LoopManager::new(config, metrics.clone());
        manager
            .start(CountingBody {
                render_cost: Duration::from_millis(30),
                ..CountingBody::default()
            })
            .expect("start");

        assert!(wait_for(
            || metrics.snapshot().total_ticks >= 8,
            Duration::from_secs(5)
        ));
        let snapshot = metrics.snapshot();
        manager.stop().expect("stop");

        assert_eq!(snapshot.late_ticks, snapshot.total_ticks);
        // paced by the 30ms body rather than the 10ms tick budget
        assert!(
            snapshot.measured_tps > 15.0 && snapshot.measured_tps < 40.0,
            "measured_tps={}",
            snapshot.measured_tps
        );
        assert!(snapshot.timings.render.avg_ms >= 30.0);
        assert!(snapshot.timings.overrun.max_ms >= 20.0);
    }

    #[test]
    fn continue_policy_keeps_ticking_and_sees_every_failure() {
        let failures = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&failures);
        let mut manager = LoopManager::new(fast_config(), MetricsHandle::default())
            .with_failure_handler(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                FailurePolicy::Continue
            });
        manager
            .start(CountingBody {
                fail_render_always: true,
                ..CountingBody::default()
            })
            .expect("start");

        assert!(wait_for(
            || failures.load(Ordering::SeqCst) >= 5,
            Duration::from_secs(5)
        ));
        assert_eq!(manager.state(), LoopState::Running);
        let exit = manager.stop().expect("stop");
        assert!(exit.fatal.is_none());
        assert!(exit.body.renders >= 5);
    }

    #[test]
    fn measured_rate_converges_to_target() {
        let metrics = MetricsHandle::default();
        let config = LoopConfig {
            target_tps: 50,
            rate_smoothing: 0.1,
            ..LoopConfig::default()
        };
        let mut manager = LoopManager::new(config, metrics.clone());
        manager.start(CountingBody::default()).expect("start");

        // let the smoothed value settle before judging it
        thread::sleep(Duration::from_millis(500));
        let converged = wait_for(
            || {
                let measured = metrics.snapshot().measured_tps;
                (measured - 50.0).abs() <= 50.0 * 0.05
            },
            Duration::from_secs(5),
        );
        let snapshot = metrics.snapshot();
        manager.stop().expect("stop");
        assert!(converged, "measured_tps={}", snapshot.measured_tps);
        assert!(snapshot.total_ticks > 20);
    }

    #[test]
    fn stop_interrupts_long_tick_sleep() {
        let config = LoopConfig {
            target_tps: 1,
            ..LoopConfig::default()
        };
        let updates = Arc::new(AtomicUsize::new(0));
        let mut manager = LoopManager::new(config, MetricsHandle::default());
        manager
            .start(CountingBody {
                updates: Arc::clone(&updates),
                ..CountingBody::default()
            })
            .expect("start");
        assert!(wait_for(|| updates.load(Ordering::SeqCst) >= 1, Duration::from_secs(5)));

        let requested = Instant::now();
        manager.stop().expect("stop");
        assert!(requested.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn tick_duration_guards_zero_rate() {
        let config = LoopConfig {
            target_tps: 0,
            ..LoopConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
        assert_eq!(
            LoopConfig::default().tick_duration(),
            Duration::from_secs_f64(1.0 / 60.0)
        );
    }

    #[test]
    fn normalize_non_zero_duration_replaces_zero() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }
}
