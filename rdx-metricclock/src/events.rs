//! Defines all public event types broadcast by the metric clock engine.
//!
//! Listeners subscribe to these strongly-typed events to notify the user.
//! Delivery is best effort: a receiver that falls behind loses the oldest
//! events instead of slowing the engine down.

use crate::config::DayMode;
use tokio::time::Instant;

/// Discrete, user-facing occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// The countdown reached zero.
    TimerFinished,
    /// The clock reached the alarm's target hour and minute.
    AlarmTriggered { hour: u32, minute: u32 },
    /// An application-defined notification, used to check the delivery path.
    Test { title: String, message: String },
}

impl ClockEvent {
    /// Headline for a notification about this event.
    pub fn title(&self) -> &str {
        match self {
            ClockEvent::TimerFinished => "Timer finished",
            ClockEvent::AlarmTriggered { .. } => "Alarm",
            ClockEvent::Test { title, .. } => title,
        }
    }

    /// Body text for a notification about this event.
    pub fn message(&self) -> &str {
        match self {
            ClockEvent::TimerFinished => "Your timer has completed.",
            ClockEvent::AlarmTriggered { .. } => "Alarm time reached",
            ClockEvent::Test { message, .. } => message,
        }
    }
}

/// Events related to the lifecycle and configuration of the engine itself.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once when the state loop begins.
    EngineStarted { timestamp: Instant },
    /// Fired once when the engine has been told to stop.
    EngineShutdown,
    /// Fired when the day partition is switched at runtime.
    DayModeChanged { mode: DayMode },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_text() {
        assert_eq!(ClockEvent::TimerFinished.title(), "Timer finished");
        assert_eq!(ClockEvent::TimerFinished.message(), "Your timer has completed.");
        let alarm = ClockEvent::AlarmTriggered { hour: 1, minute: 2 };
        assert_eq!(alarm.title(), "Alarm");
        assert_eq!(alarm.message(), "Alarm time reached");
        let test = ClockEvent::Test {
            title: "Ping".into(),
            message: "hello".into(),
        };
        assert_eq!((test.title(), test.message()), ("Ping", "hello"));
    }
}
