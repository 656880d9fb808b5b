//! Contains the state machines layered on top of the live clock.
//!
//! Both machines are plain values. The `MetricClockEngine` stores them inside
//! the published snapshot and drives their transitions, so every change is
//! part of one atomic snapshot replacement.

pub mod alarm;
pub mod timer;
