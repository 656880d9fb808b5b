//! The externally visible state of the engine.
//!
//! A `ClockSnapshot` is published whole on every tick and every control
//! operation. Readers never see a clock reading from one update paired with
//! timer or alarm fields from another.

use crate::components::alarm::AlarmState;
use crate::components::timer::TimerState;
use crate::config::DayMode;
use crate::metric::MetricReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub reading: MetricReading,
    pub timer: TimerState,
    pub alarm: AlarmState,
    pub day_mode: DayMode,
}

impl ClockSnapshot {
    /// The snapshot published before the first tick: zeroed clock, idle timer, no alarm.
    pub fn initial(day_mode: DayMode) -> Self {
        Self {
            reading: MetricReading::epoch(),
            timer: TimerState::Idle,
            alarm: AlarmState::Unset,
            day_mode,
        }
    }

    /// Remaining timer time formatted for display.
    pub fn timer_display(&self) -> String {
        format_countdown(self.timer.seconds_left())
    }
}

impl Default for ClockSnapshot {
    fn default() -> Self {
        Self::initial(DayMode::default())
    }
}

/// Formats a countdown as `MM:SS`, or `H:MM:SS` once it spans an hour.
pub fn format_countdown(seconds: u64) -> String {
    if seconds == 0 {
        return "00:00".to_string();
    }
    let s = seconds % 60;
    let m = (seconds / 60) % 60;
    let h = seconds / 3600;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
