//! The single countdown timer.

/// State of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running { seconds_left: u64 },
}

/// What a transition produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The countdown is still going (or nothing happened).
    Pending,
    /// The countdown reached zero on this transition.
    Finished,
}

impl TimerState {
    /// Arms a countdown of `seconds`, superseding any previous one.
    ///
    /// A zero duration completes immediately: the state stays `Idle` and
    /// the outcome is `Finished`.
    pub fn start(seconds: u64) -> (Self, TimerOutcome) {
        if seconds == 0 {
            (TimerState::Idle, TimerOutcome::Finished)
        } else {
            (
                TimerState::Running {
                    seconds_left: seconds,
                },
                TimerOutcome::Pending,
            )
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TimerOutcome {
        match *self {
            TimerState::Running { seconds_left } if seconds_left > 1 => {
                *self = TimerState::Running {
                    seconds_left: seconds_left - 1,
                };
                TimerOutcome::Pending
            }
            TimerState::Running { .. } => {
                *self = TimerState::Idle;
                TimerOutcome::Finished
            }
            TimerState::Idle => TimerOutcome::Pending,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    pub fn seconds_left(&self) -> u64 {
        match self {
            TimerState::Running { seconds_left } => *seconds_left,
            TimerState::Idle => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_finishes_immediately() {
        let (state, outcome) = TimerState::start(0);
        assert_eq!(state, TimerState::Idle);
        assert_eq!(outcome, TimerOutcome::Finished);
        assert!(!state.is_running());
    }

    #[test]
    fn counts_down_and_finishes_once() {
        let (mut state, outcome) = TimerState::start(3);
        assert_eq!(outcome, TimerOutcome::Pending);
        assert_eq!(state.seconds_left(), 3);

        assert_eq!(state.tick(), TimerOutcome::Pending);
        assert_eq!(state.seconds_left(), 2);
        assert_eq!(state.tick(), TimerOutcome::Pending);
        assert_eq!(state.seconds_left(), 1);
        assert_eq!(state.tick(), TimerOutcome::Finished);
        assert_eq!(state, TimerState::Idle);
        assert_eq!(state.seconds_left(), 0);

        // Further ticks are inert.
        assert_eq!(state.tick(), TimerOutcome::Pending);
        assert_eq!(state, TimerState::Idle);
    }
}
