//! Defines all configuration structures for the metric clock engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`. This allows the engine's cadence, day
//! partition and time zone to be defined externally from the application code.

use crate::metric::ClockUnits;
use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `METRICCLOCK__DAY_MODE=metric`.
pub const ENV_PREFIX: &str = "METRICCLOCK";

/// The top-level configuration for the `MetricClockEngine`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricClockConfig {
    /// How the day is partitioned into hours, minutes and seconds.
    #[serde(default)]
    pub day_mode: DayMode,

    /// Cadence of the state loop that recomputes the clock reading.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Cadence of the countdown timer's decrements.
    #[serde(default = "default_timer_tick_ms")]
    pub timer_tick_ms: u64,

    /// An IANA zone name (e.g., "Europe/Paris"). When absent the host's
    /// local time zone is used.
    #[serde(default)]
    pub timezone: Option<Tz>,

    /// Buffer size of the event channels. Slow consumers lose the oldest events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl MetricClockConfig {
    /// Loads configuration from an optional file at `path`, layered under
    /// `METRICCLOCK__*` environment variables. A missing file is not an error.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration from '{}'", path))?;
        settings
            .try_deserialize()
            .context("invalid metricclock configuration")
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn timer_tick(&self) -> Duration {
        Duration::from_millis(self.timer_tick_ms.max(1))
    }

    /// The zone the clock reads local midnight in.
    pub fn zone(&self) -> ClockZone {
        match self.timezone {
            Some(tz) => ClockZone::Named(tz),
            None => ClockZone::Local,
        }
    }
}

impl Default for MetricClockConfig {
    fn default() -> Self {
        Self {
            day_mode: DayMode::default(),
            refresh_interval_ms: default_refresh_interval_ms(),
            timer_tick_ms: default_timer_tick_ms(),
            timezone: None,
            event_capacity: default_event_capacity(),
        }
    }
}

/// Selects the day partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayMode {
    /// 24 hours of 60 minutes of 60 seconds.
    #[default]
    Standard,
    /// 10 hours of 100 minutes of 100 seconds.
    Metric,
}

impl DayMode {
    pub fn units(self) -> ClockUnits {
        match self {
            DayMode::Standard => ClockUnits::STANDARD,
            DayMode::Metric => ClockUnits::METRIC,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DayMode::Standard => DayMode::Metric,
            DayMode::Metric => DayMode::Standard,
        }
    }
}

impl fmt::Display for DayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayMode::Standard => f.write_str("standard"),
            DayMode::Metric => f.write_str("metric"),
        }
    }
}

/// The time zone used to resolve the local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    /// The host's local time zone.
    Local,
    Named(Tz),
}

// --- Default value functions for serde ---

fn default_refresh_interval_ms() -> u64 {
    100
}

fn default_timer_tick_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_live_clock_cadence() {
        let config = MetricClockConfig::default();
        assert_eq!(config.day_mode, DayMode::Standard);
        assert_eq!(config.refresh_interval(), Duration::from_millis(100));
        assert_eq!(config.timer_tick(), Duration::from_secs(1));
        assert_eq!(config.zone(), ClockZone::Local);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn day_mode_selects_units() {
        assert_eq!(DayMode::Standard.units().hours_per_day, 24);
        assert_eq!(DayMode::Standard.units().units_per_hour, 60);
        assert_eq!(DayMode::Metric.units().hours_per_day, 10);
        assert_eq!(DayMode::Metric.units().units_per_minute, 100);
        assert_eq!(DayMode::Metric.toggled(), DayMode::Standard);
    }

    #[test]
    fn deserializes_partial_toml() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "day_mode = \"metric\"\ntimezone = \"Europe/Paris\"\nrefresh_interval_ms = 50\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let parsed: MetricClockConfig = settings.try_deserialize().unwrap();
        assert_eq!(parsed.day_mode, DayMode::Metric);
        assert_eq!(parsed.zone(), ClockZone::Named(chrono_tz::Europe::Paris));
        assert_eq!(parsed.refresh_interval_ms, 50);
        assert_eq!(parsed.timer_tick_ms, 1000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = MetricClockConfig::load("definitely-not-here-metricclock").unwrap();
        assert_eq!(config.day_mode, DayMode::Standard);
    }
}
