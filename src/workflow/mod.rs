//! Interaction workflow: route a slash command, acknowledge it, drive the
//! managed service, and patch the final status back.

pub mod machine;
pub mod messages;
pub mod runner;
pub mod traits;
pub mod types;

pub use machine::{Effect, Event, Outcome, Path, State, transition};
pub use messages::Messages;
pub use runner::{RunReport, WorkflowRunner};
pub use traits::{Notifier, ServiceControl};
pub use types::{Interaction, ResponseMessage, ResponseMode, ServiceStatus, SubCommand};
