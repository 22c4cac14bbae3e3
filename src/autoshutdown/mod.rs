//! Idle shutdown: turn the game server off when its CPU alarm fires.

pub mod alarm;
mod handler;

pub use alarm::{AlarmAction, CloudWatchAlarm, Notification, parse_notifications};
pub use handler::{AlarmHandler, AlarmReport};
