use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::{DiscordError, ServiceError, WorkflowError};

use super::machine::{Effect, Event, Outcome, Path, State, transition};
use super::messages::Messages;
use super::traits::{Notifier, ServiceControl};
use super::types::{Interaction, ResponseMessage, SubCommand};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub path: Path,
    pub acknowledgement: ResponseMessage,
    pub outcome: Option<Outcome>,
    pub update: Option<ResponseMessage>,
}

/// Executes the interaction workflow against real (or fake) collaborators.
///
/// Every effect completes before the next event is fed to the machine.
pub struct WorkflowRunner {
    service: Arc<dyn ServiceControl>,
    notifier: Arc<dyn Notifier>,
    messages: Arc<Messages>,
}

#[derive(Default)]
struct RunFailure {
    service: Option<ServiceError>,
    notify: Option<DiscordError>,
}

impl WorkflowRunner {
    pub fn new(
        service: Arc<dyn ServiceControl>,
        notifier: Arc<dyn Notifier>,
        messages: Messages,
    ) -> Self {
        Self {
            service,
            notifier,
            messages: Arc::new(messages),
        }
    }

    pub async fn run(&self, interaction: &Interaction) -> Result<RunReport, WorkflowError> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "workflow",
            run_id = %run_id,
            interaction_id = %interaction.interaction_id,
            sub_command = %interaction.sub_command,
        );
        self.execute(run_id, interaction).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: String,
        interaction: &Interaction,
    ) -> Result<RunReport, WorkflowError> {
        let sub_command = SubCommand::parse(&interaction.sub_command);
        let path = Path::route(&sub_command);
        tracing::info!(?path, "routing interaction");

        let mut failure = RunFailure::default();
        let mut acknowledgement = None;
        let mut update = None;
        let mut outcome = None;

        let mut state = State::Start;
        let mut event = Event::Received(sub_command);
        loop {
            let (next, effect) = transition(state, event)?;
            tracing::debug!(from = %state, to = %next, ?effect, "transition");
            state = next;

            event = match effect {
                Effect::PostInitial(path) => {
                    let message = ResponseMessage::initial(self.messages.acknowledgement(path));
                    let result = self
                        .notifier
                        .post_initial(interaction, &message.content)
                        .await;
                    acknowledgement = Some(message);
                    match result {
                        Ok(()) => Event::Acknowledged,
                        Err(e) => {
                            tracing::warn!(error = %e, "initial acknowledgement failed");
                            failure.notify = Some(e);
                            Event::NotifyFailed
                        }
                    }
                }
                Effect::ScaleTo(desired) => match self.service.set_desired_count(desired).await {
                    Ok(status) => {
                        tracing::info!(
                            desired,
                            running_count = status.running_count,
                            desired_count = status.desired_count,
                            "scale requested"
                        );
                        Event::Scaled
                    }
                    Err(e) => {
                        tracing::warn!(desired, error = %e, "scale request failed");
                        failure.service = Some(e);
                        Event::ServiceFailed
                    }
                },
                Effect::DescribeService => match self.service.describe().await {
                    Ok(status) => {
                        tracing::info!(
                            running_count = status.running_count,
                            desired_count = status.desired_count,
                            "service described"
                        );
                        Event::Described(status)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "describe failed");
                        failure.service = Some(e);
                        Event::ServiceFailed
                    }
                },
                Effect::PatchOriginal(result) => {
                    outcome = Some(result);
                    let message = ResponseMessage::update(self.messages.outcome(result));
                    let sent = self
                        .notifier
                        .patch_original(interaction, &message.content)
                        .await;
                    update = Some(message);
                    match sent {
                        Ok(()) => Event::Updated,
                        Err(e) => {
                            tracing::warn!(error = %e, "final update failed");
                            failure.notify = Some(e);
                            Event::NotifyFailed
                        }
                    }
                }
                Effect::None => break,
            };
        }

        match state {
            State::Success => {
                tracing::info!(?outcome, "run succeeded");
                Ok(RunReport {
                    run_id,
                    path,
                    acknowledgement: acknowledgement
                        .unwrap_or_else(|| ResponseMessage::initial(String::new())),
                    outcome,
                    update,
                })
            }
            _ => {
                let err = match failure {
                    RunFailure {
                        service: Some(e), ..
                    } => WorkflowError::Service(e),
                    RunFailure {
                        notify: Some(e), ..
                    } => WorkflowError::Notify(e),
                    RunFailure { .. } => WorkflowError::InvalidTransition {
                        state: state.to_string(),
                        event: "end of run".into(),
                    },
                };
                tracing::error!(error = %err, "run failed");
                Err(err)
            }
        }
    }
}
