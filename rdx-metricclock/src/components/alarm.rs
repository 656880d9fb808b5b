//! The single daily alarm.
//!
//! The alarm is edge-triggered: it fires the first time the clock reading
//! matches its target hour and minute, then stays latched in `Fired` until it
//! is armed again or cleared.

use crate::metric::MetricReading;

/// An hour/minute target in the active clock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTarget {
    pub hour: u32,
    pub minute: u32,
}

impl AlarmTarget {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Seconds are ignored.
    pub fn matches(&self, reading: &MetricReading) -> bool {
        reading.metric_hour == self.hour && reading.metric_minute == self.minute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmState {
    #[default]
    Unset,
    Armed(AlarmTarget),
    Fired(AlarmTarget),
}

impl AlarmState {
    /// Arms the alarm. Re-arming an already fired alarm clears the latch.
    pub fn armed(hour: u32, minute: u32) -> Self {
        AlarmState::Armed(AlarmTarget::new(hour, minute))
    }

    /// Checks the alarm against a fresh reading.
    ///
    /// Returns `true` exactly on the transition from `Armed` to `Fired`.
    pub fn evaluate(&mut self, reading: &MetricReading) -> bool {
        match *self {
            AlarmState::Armed(target) if target.matches(reading) => {
                *self = AlarmState::Fired(target);
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, AlarmState::Unset)
    }

    pub fn has_fired(&self) -> bool {
        matches!(self, AlarmState::Fired(_))
    }

    pub fn target(&self) -> Option<AlarmTarget> {
        match self {
            AlarmState::Unset => None,
            AlarmState::Armed(target) | AlarmState::Fired(target) => Some(*target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(hour: u32, minute: u32, second: u32) -> MetricReading {
        MetricReading {
            metric_hour: hour,
            metric_minute: minute,
            metric_second: second,
            ..MetricReading::epoch()
        }
    }

    #[test]
    fn unset_alarm_never_fires() {
        let mut alarm = AlarmState::Unset;
        assert!(!alarm.evaluate(&reading(0, 0, 0)));
        assert!(!alarm.is_armed());
        assert_eq!(alarm.target(), None);
    }

    #[test]
    fn fires_once_per_arming() {
        let mut alarm = AlarmState::armed(7, 30);
        assert!(!alarm.evaluate(&reading(7, 29, 99)));
        assert!(alarm.evaluate(&reading(7, 30, 0)));
        assert!(alarm.has_fired());
        // Same minute, later seconds, and later days: latched.
        assert!(!alarm.evaluate(&reading(7, 30, 50)));
        assert!(!alarm.evaluate(&reading(7, 31, 0)));
        assert!(!alarm.evaluate(&reading(7, 30, 0)));
        assert_eq!(alarm.target(), Some(AlarmTarget::new(7, 30)));
    }

    #[test]
    fn rearming_clears_the_latch() {
        let mut alarm = AlarmState::armed(1, 2);
        assert!(alarm.evaluate(&reading(1, 2, 3)));
        alarm = AlarmState::armed(1, 2);
        assert!(!alarm.has_fired());
        assert!(alarm.evaluate(&reading(1, 2, 4)));
    }

    #[test]
    fn match_ignores_seconds() {
        let target = AlarmTarget::new(3, 45);
        assert!(target.matches(&reading(3, 45, 0)));
        assert!(target.matches(&reading(3, 45, 99)));
        assert!(!target.matches(&reading(3, 46, 0)));
    }
}
