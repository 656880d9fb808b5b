//! # Metricclock
//!
//! A live metric-time clock engine for Rust.
//!
//! Metricclock converts wall-clock time into an alternative day partition
//! (10 hours of 100 minutes of 100 seconds, or the familiar 24/60/60) and
//! keeps that reading current, together with a one-shot countdown timer and a
//! single daily alarm expressed in the same units.
//!
//! ## Core Concepts
//!
//! - **Metric reading**: a pure function of an instant, the local midnight of
//!   its day, and the active `DayMode`. See [`metric::compute`].
//! - **Snapshot**: the engine publishes one immutable `ClockSnapshot` per
//!   update, merging the reading with the timer and alarm state. Readers
//!   never observe a partial update.
//! - **Event-Driven**: discrete occurrences (timer finished, alarm triggered,
//!   test notifications) travel on a broadcast channel with best-effort
//!   delivery. Producers never block on slow consumers.
//! - **Configuration-Driven**: cadence, day partition and time zone come from
//!   a `MetricClockConfig`, often loaded from a file.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use metricclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create a configuration for a 10-hour day.
//!     let config = MetricClockConfig {
//!         day_mode: DayMode::Metric,
//!         ..Default::default()
//!     };
//!
//!     // 2. Create the engine.
//!     let engine = MetricClockEngine::new(config);
//!
//!     // 3. Subscribe to the event stream before starting the engine.
//!     let mut events = engine.subscribe_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{}: {}", event.title(), event.message());
//!         }
//!     });
//!
//!     // 4. Arm the alarm and a timer.
//!     engine.set_alarm(7, 50);
//!     engine.start_timer(90).await;
//!
//!     // 5. Run the engine. It will shut down on Ctrl+C.
//!     engine.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Metric Clock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod metric;
pub mod snapshot;
pub mod time;

/// A prelude module for easy importing of the most common metricclock types.
pub mod prelude {
    pub use crate::components::alarm::{AlarmState, AlarmTarget};
    pub use crate::components::timer::TimerState;
    pub use crate::config::{ClockZone, DayMode, MetricClockConfig};
    pub use crate::engine::MetricClockEngine;
    pub use crate::events::{ClockEvent, SystemEvent};
    pub use crate::metric::{ClockUnits, MetricReading};
    pub use crate::snapshot::{format_countdown, ClockSnapshot};
    pub use crate::time::{ManualTimeSource, SystemTimeSource, TimeSource};
}
