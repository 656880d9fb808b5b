//! The core engine that keeps the metric clock, timer and alarm current.

use crate::components::alarm::AlarmState;
use crate::components::timer::{TimerOutcome, TimerState};
use crate::config::{DayMode, MetricClockConfig};
use crate::events::{ClockEvent, SystemEvent};
use crate::metric::compute_in_zone;
use crate::snapshot::ClockSnapshot;
use crate::time::{SystemTimeSource, TimeSource};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// The main metric clock engine.
///
/// This struct is the central point of control. It owns the published
/// `ClockSnapshot`, the event channels and the countdown task, and drives the
/// state loop. The engine is designed to be cloned and shared across tasks,
/// providing a handle to the running instance.
///
/// Every write to the snapshot goes through `watch::Sender::send_modify`, so
/// the state loop, the countdown and the control operations each replace the
/// snapshot as a whole and never interleave partial updates.
#[derive(Clone)]
pub struct MetricClockEngine {
    config: Arc<MetricClockConfig>,
    time_source: Arc<dyn TimeSource>,
    snapshot_sender: Arc<watch::Sender<ClockSnapshot>>,
    event_sender: broadcast::Sender<ClockEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
    shutdown_sender: broadcast::Sender<()>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
}

// Core implementation block for internal logic.
impl MetricClockEngine {
    /// Creates a new `MetricClockEngine` reading the host's wall clock.
    pub fn new(config: MetricClockConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Creates a new `MetricClockEngine` that asks `time_source` for the current instant.
    pub fn with_time_source(config: MetricClockConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let capacity = config.event_capacity.max(1);
        let (snapshot_sender, _) = watch::channel(ClockSnapshot::initial(config.day_mode));
        let (event_sender, _) = broadcast::channel(capacity);
        let (system_event_sender, _) = broadcast::channel(capacity);
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config: Arc::new(config),
            time_source,
            snapshot_sender: Arc::new(snapshot_sender),
            event_sender,
            system_event_sender,
            shutdown_sender,
            countdown: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawns the state loop and returns its handle.
    ///
    /// The loop refreshes the snapshot every `refresh_interval` until
    /// `shutdown` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let state_loop = self.clone();
        let shutdown_rx = self.shutdown_sender.subscribe();
        tokio::spawn(async move { state_loop.state_loop(shutdown_rx).await })
    }

    /// Runs the engine until a Ctrl+C signal is received.
    ///
    /// This method will:
    /// 1. Spawn the state loop.
    /// 2. Wait for a Ctrl+C signal.
    /// 3. Stop the state loop and any running countdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("MetricClockEngine starting up...");
        let state_loop = self.start();

        info!(
            "Engine refreshing every {:?} in {} mode. Press Ctrl+C to shut down.",
            self.config.refresh_interval(),
            self.day_mode()
        );
        let signal = tokio::signal::ctrl_c().await;

        self.shutdown().await;
        state_loop.await.ok();
        signal.context("failed to listen for the shutdown signal")?;
        info!("MetricClockEngine has shut down.");
        Ok(())
    }

    /// Stops the state loop and cancels any running countdown.
    ///
    /// A cancelled countdown leaves the timer `Idle` without sending
    /// `TimerFinished`. The snapshot stays readable.
    pub async fn shutdown(&self) {
        info!("Shutdown requested. Broadcasting to all tasks...");
        self.shutdown_sender.send(()).ok();
        let mut countdown = self.countdown.lock().await;
        if let Some(handle) = countdown.take() {
            // The countdown exits on the shutdown broadcast; an error here only means it was aborted.
            handle.await.ok();
        }
        self.snapshot_sender.send_modify(|snapshot| {
            *snapshot = ClockSnapshot {
                timer: TimerState::Idle,
                ..*snapshot
            };
        });
        self.system_event_sender
            .send(SystemEvent::EngineShutdown)
            .ok();
    }

    /// Performs one state loop iteration.
    ///
    /// Recomputes the clock reading, evaluates the alarm against it and
    /// publishes the merged snapshot, in that order. Timer fields are carried
    /// over untouched. An `AlarmTriggered` event is sent only after the
    /// snapshot that latched the alarm is visible.
    pub fn refresh(&self) {
        self.publish_reading(None);
    }

    /// Recomputes the reading, optionally under a new day mode, in a single
    /// snapshot replacement. Returns whether the day mode changed.
    fn publish_reading(&self, mode: Option<DayMode>) -> bool {
        let now = self.time_source.now();
        let zone = self.config.zone();
        let mut fired = None;
        let mut changed = false;

        self.snapshot_sender.send_modify(|snapshot| {
            let day_mode = mode.unwrap_or(snapshot.day_mode);
            changed = day_mode != snapshot.day_mode;
            let reading = compute_in_zone(now, zone, day_mode.units());
            let mut alarm = snapshot.alarm;
            if alarm.evaluate(&reading) {
                fired = alarm.target();
            }
            *snapshot = ClockSnapshot {
                reading,
                alarm,
                day_mode,
                ..*snapshot
            };
        });

        if let Some(target) = fired {
            info!("Alarm triggered at {}:{:02}.", target.hour, target.minute);
            self.event_sender
                .send(ClockEvent::AlarmTriggered {
                    hour: target.hour,
                    minute: target.minute,
                })
                .ok();
        }
        changed
    }

    async fn state_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: Instant::now(),
            })
            .ok();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    self.refresh();
                    trace!("Clock refreshed: {}", self.snapshot().reading);
                }
            }
        }
        debug!("State loop stopped.");
    }

    async fn countdown_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let tick = self.config.timer_tick();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(tick) => {
                    let mut outcome = TimerOutcome::Pending;
                    let mut running = false;
                    self.snapshot_sender.send_modify(|snapshot| {
                        let mut timer = snapshot.timer;
                        outcome = timer.tick();
                        running = timer.is_running();
                        *snapshot = ClockSnapshot { timer, ..*snapshot };
                    });
                    trace!("Countdown tick, {:?}.", outcome);
                    if outcome == TimerOutcome::Finished {
                        self.finish_timer();
                    }
                    if !running {
                        break;
                    }
                }
            }
        }
    }

    fn finish_timer(&self) {
        info!("Timer finished.");
        self.event_sender.send(ClockEvent::TimerFinished).ok();
    }

    /// Aborts the countdown task, if any, and waits for it to terminate.
    async fn cancel_countdown(countdown: &mut Option<JoinHandle<()>>) {
        if let Some(previous) = countdown.take() {
            previous.abort();
            // Cancellation is a normal way for the countdown to end.
            previous.await.ok();
        }
    }
}

// Public API implementation block.
impl MetricClockEngine {
    /// Starts a countdown of `seconds`.
    ///
    /// Any countdown already in flight is cancelled and awaited first, so the
    /// superseded run can never decrement the new one or report completion.
    /// A zero duration completes at once and sends `TimerFinished`.
    pub async fn start_timer(&self, seconds: u64) {
        let mut countdown = self.countdown.lock().await;
        Self::cancel_countdown(&mut countdown).await;

        let mut outcome = TimerOutcome::Pending;
        self.snapshot_sender.send_modify(|snapshot| {
            let (timer, result) = TimerState::start(seconds);
            outcome = result;
            *snapshot = ClockSnapshot { timer, ..*snapshot };
        });
        info!("Timer started for {} seconds.", seconds);

        match outcome {
            TimerOutcome::Finished => self.finish_timer(),
            TimerOutcome::Pending => {
                let timer = self.clone();
                let shutdown_rx = self.shutdown_sender.subscribe();
                *countdown = Some(tokio::spawn(async move {
                    timer.countdown_loop(shutdown_rx).await
                }));
            }
        }
    }

    /// Cancels the countdown without sending `TimerFinished`.
    pub async fn stop_timer(&self) {
        let mut countdown = self.countdown.lock().await;
        Self::cancel_countdown(&mut countdown).await;
        self.snapshot_sender.send_modify(|snapshot| {
            *snapshot = ClockSnapshot {
                timer: TimerState::Idle,
                ..*snapshot
            };
        });
        info!("Timer stopped.");
    }

    /// Arms the daily alarm for `hour`:`minute` in the active clock units.
    ///
    /// Re-arming, even with the same target, clears the fired latch. Values
    /// are not range checked; a target the clock never reaches never fires.
    pub fn set_alarm(&self, hour: u32, minute: u32) {
        self.snapshot_sender.send_modify(|snapshot| {
            *snapshot = ClockSnapshot {
                alarm: AlarmState::armed(hour, minute),
                ..*snapshot
            };
        });
        info!("Alarm set for {}:{:02}.", hour, minute);
    }

    /// Removes the alarm.
    pub fn clear_alarm(&self) {
        self.snapshot_sender.send_modify(|snapshot| {
            *snapshot = ClockSnapshot {
                alarm: AlarmState::Unset,
                ..*snapshot
            };
        });
        info!("Alarm cleared.");
    }

    /// Broadcasts a `ClockEvent::Test` to all event subscribers.
    pub fn emit_test_event(&self, title: impl Into<String>, message: impl Into<String>) {
        self.event_sender
            .send(ClockEvent::Test {
                title: title.into(),
                message: message.into(),
            })
            .ok();
    }

    /// Switches the day partition and recomputes the reading in the same update.
    ///
    /// The alarm target is kept as is; it is interpreted in the new units.
    pub fn set_day_mode(&self, mode: DayMode) {
        if self.publish_reading(Some(mode)) {
            info!("Day mode switched to {}.", mode);
            self.system_event_sender
                .send(SystemEvent::DayModeChanged { mode })
                .ok();
        }
    }

    /// The day partition currently in use.
    pub fn day_mode(&self) -> DayMode {
        self.snapshot_sender.borrow().day_mode
    }

    /// A copy of the latest published snapshot.
    pub fn snapshot(&self) -> ClockSnapshot {
        *self.snapshot_sender.borrow()
    }

    pub fn config(&self) -> &MetricClockConfig {
        &self.config
    }

    /// Subscribes to the snapshot stream. Slow readers only see the latest value.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<ClockSnapshot> {
        self.snapshot_sender.subscribe()
    }

    /// Subscribes to the `ClockEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClockEvent> {
        self.event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }
}
