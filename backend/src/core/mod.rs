//! Core infrastructure: time management.

pub mod time;

pub use time::{SimClock, Timestamp};
