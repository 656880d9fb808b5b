use anyhow::Result;
use metricclock::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "metricclock";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load metricclock.toml if present; defaults otherwise.
    let config = MetricClockConfig::load(CONFIG_PATH)?;

    // 3. Create the engine.
    let engine = MetricClockEngine::new(config);

    // 4. Spawn concurrent tasks to listen to the engine's streams.
    spawn_event_listeners(&engine);

    // 5. Arm a short timer and an alarm one metric minute ahead.
    engine.refresh();
    let now = engine.snapshot().reading;
    let units = engine.day_mode().units();
    let (hour, minute) = next_minute(now.metric_hour, now.metric_minute, units);
    engine.set_alarm(hour, minute);
    engine.start_timer(5).await;

    // 6. Run the engine.
    engine.run().await?;

    Ok(())
}

/// The hour/minute one clock minute after the given one.
fn next_minute(hour: u32, minute: u32, units: ClockUnits) -> (u32, u32) {
    if minute + 1 < units.units_per_hour {
        (hour, minute + 1)
    } else {
        ((hour + 1) % units.hours_per_day, 0)
    }
}

/// Spawns several tasks, each subscribing to a different stream from the engine.
fn spawn_event_listeners(engine: &MetricClockEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut event_rx = engine.subscribe_events();
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => info!("[NOTIFY] => {}: {}", event.title(), event.message()),
                Err(RecvError::Lagged(missed)) => warn!("[NOTIFY] => missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut snapshot_rx = engine.subscribe_snapshots();
    tokio::spawn(async move {
        let mut last_second = None;
        while snapshot_rx.changed().await.is_ok() {
            let snapshot = *snapshot_rx.borrow_and_update();
            if last_second != Some(snapshot.reading.metric_second) {
                last_second = Some(snapshot.reading.metric_second);
                info!(
                    "[CLOCK] => {} | milliday {} | timer {}",
                    snapshot.reading,
                    snapshot.reading.milliday_progress,
                    snapshot.timer_display()
                );
            }
        }
    });
}
