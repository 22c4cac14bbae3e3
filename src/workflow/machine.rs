//! Pure transition function for one interaction run.
//!
//! ```text
//! Start ──Received──▶ Acknowledging(path)
//!   Describe: ─Acknowledged─▶ Describing ─Described─▶ Updating ─Updated─▶ Success
//!   Start:    ─Acknowledged─▶ Scaling(1) ─Scaled─▶ Describing ─Described─▶ Updating ─Updated─▶ Success
//!   Stop:     ─Acknowledged─▶ Scaling(0) ─Scaled─▶ Describing ─Described─▶ Updating ─Updated─▶ Success
//!   Fallback: ─Acknowledged─▶ Success
//! ```
//!
//! A service failure in `Scaling`/`Describing` moves to `Updating` with
//! `Outcome::Error`; that update ends in `Failed` whether or not it is
//! delivered. A notify failure ends in `Failed` directly. There are no
//! cycles and nothing is retried.

use std::fmt;

use crate::error::WorkflowError;

use super::types::{ServiceStatus, SubCommand};

/// Branch chosen by the command router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Path {
    Describe,
    Start,
    Stop,
    Fallback,
}

impl Path {
    /// Total routing: every sub-command lands on exactly one path.
    pub fn route(sub_command: &SubCommand) -> Self {
        match sub_command {
            SubCommand::Status => Self::Describe,
            SubCommand::Start => Self::Start,
            SubCommand::Stop => Self::Stop,
            SubCommand::Other(_) => Self::Fallback,
        }
    }

    /// Final outcome reported after the post-action describe.
    pub fn outcome_for(self, status: ServiceStatus) -> Outcome {
        match (self, status.is_running()) {
            (_, true) => Outcome::Up,
            (Self::Start, false) => Outcome::Starting,
            (_, false) => Outcome::Down,
        }
    }

    fn scale_target(self) -> Option<u32> {
        match self {
            Self::Start => Some(1),
            Self::Stop => Some(0),
            Self::Describe | Self::Fallback => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Up,
    Down,
    Starting,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    Acknowledging(Path),
    Scaling { path: Path, desired: u32 },
    Describing(Path),
    Updating { path: Path, outcome: Outcome },
    Success,
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Acknowledging(path) => write!(f, "Acknowledging({path:?})"),
            Self::Scaling { path, desired } => write!(f, "Scaling({path:?}, {desired})"),
            Self::Describing(path) => write!(f, "Describing({path:?})"),
            Self::Updating { path, outcome } => write!(f, "Updating({path:?}, {outcome:?})"),
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Result of the previous effect, fed back into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Received(SubCommand),
    Acknowledged,
    Scaled,
    Described(ServiceStatus),
    Updated,
    ServiceFailed,
    NotifyFailed,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received(sub) => write!(f, "Received({})", sub.as_str()),
            Self::Described(status) => write!(
                f,
                "Described(running={}, desired={})",
                status.running_count, status.desired_count
            ),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Side effect the runner must perform before feeding the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    PostInitial(Path),
    ScaleTo(u32),
    DescribeService,
    PatchOriginal(Outcome),
    None,
}

pub fn transition(state: State, event: Event) -> Result<(State, Effect), WorkflowError> {
    let next = match (state, &event) {
        (State::Start, Event::Received(sub_command)) => {
            let path = Path::route(sub_command);
            (State::Acknowledging(path), Effect::PostInitial(path))
        }

        (State::Acknowledging(Path::Fallback), Event::Acknowledged) => {
            (State::Success, Effect::None)
        }
        (State::Acknowledging(path), Event::Acknowledged) => match path.scale_target() {
            Some(desired) => (State::Scaling { path, desired }, Effect::ScaleTo(desired)),
            None => (State::Describing(path), Effect::DescribeService),
        },

        (State::Scaling { path, .. }, Event::Scaled) => {
            (State::Describing(path), Effect::DescribeService)
        }

        (State::Describing(path), Event::Described(status)) => {
            let outcome = path.outcome_for(*status);
            (
                State::Updating { path, outcome },
                Effect::PatchOriginal(outcome),
            )
        }

        (State::Scaling { path, .. } | State::Describing(path), Event::ServiceFailed) => (
            State::Updating {
                path,
                outcome: Outcome::Error,
            },
            Effect::PatchOriginal(Outcome::Error),
        ),

        (
            State::Updating {
                outcome: Outcome::Error,
                ..
            },
            Event::Updated | Event::NotifyFailed,
        )
        | (State::Acknowledging(_) | State::Updating { .. }, Event::NotifyFailed) => {
            (State::Failed, Effect::None)
        }
        (State::Updating { .. }, Event::Updated) => (State::Success, Effect::None),

        (state, event) => {
            return Err(WorkflowError::InvalidTransition {
                state: state.to_string(),
                event: event.to_string(),
            });
        }
    };
    Ok(next)
}
