//! Session engine - the turn loop that mediates between the planner and the
//! local machine.

use crate::interrupt::Interrupt;
use crate::types::*;
use crate::vocabulary::{self, ClassifyError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use sysaidmin_providers::{ChatMessage, Planner};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Planner error: {0}")]
    Planner(String),
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ClassifyError),
    #[error("Transcript error: {0}")]
    Transcript(#[from] std::io::Error),
}

/// Runs one confirmed shell command. Infallible by contract: a command that
/// fails to start still yields an ExecutionResult whose output describes the
/// failure, so the planner sees it like any other command output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_command(&self, command: &str) -> ExecutionResult;
}

/// The human side of the session: sectioned display, the confirmation gate,
/// and the reply prompt.
#[async_trait]
pub trait Operator: Send + Sync {
    async fn show_assistant(&self, text: &str);
    async fn show_output(&self, text: &str);
    async fn show_notice(&self, text: &str);
    /// Present a pending command and block until the operator decides.
    async fn confirm_command(&self, command: &str) -> Decision;
    /// Block for one line of input. None means the input stream closed.
    async fn prompt_reply(&self) -> Option<String>;
}

/// Durable append-only transcript. Each record must be persisted before the
/// call returns.
pub trait TranscriptSink: Send + Sync {
    fn record_problem(&self, text: &str) -> std::io::Result<()>;
    fn record_turn(&self, section: Section, text: &str) -> std::io::Result<()>;
    fn record_termination(&self, reason: &TerminationReason) -> std::io::Result<()>;
}

pub struct SessionEngine {
    planner: Arc<dyn Planner>,
    runner: Arc<dyn CommandRunner>,
    operator: Arc<dyn Operator>,
    transcript: Arc<dyn TranscriptSink>,
    interrupt: Interrupt,
}

impl SessionEngine {
    pub fn new(
        planner: Arc<dyn Planner>,
        runner: Arc<dyn CommandRunner>,
        operator: Arc<dyn Operator>,
        transcript: Arc<dyn TranscriptSink>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            planner,
            runner,
            operator,
            transcript,
            interrupt,
        }
    }

    /// Wait on one blocking step, bailing out if the session is interrupted.
    /// The confirmation gate is not routed through here; the operator races
    /// the same signal there and answers with a Decision.
    async fn interruptible<T>(&self, step: &str, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            value = fut => Some(value),
            _ = self.interrupt.triggered() => {
                info!("Interrupted while {}", step);
                None
            }
        }
    }

    /// Run one session to completion.
    ///
    /// The termination marker is written to the transcript exactly once, on
    /// every exit path.
    pub async fn run(&self, problem: &str) -> TerminationReason {
        info!("Starting session via {}", self.planner.name());

        let reason = match self.run_inner(problem).await {
            Ok(reason) => reason,
            Err(e) => {
                error!("Session failed: {}", e);
                TerminationReason::Failed {
                    cause: e.to_string(),
                }
            }
        };

        if let Err(e) = self.transcript.record_termination(&reason) {
            warn!("Failed to record session termination: {}", e);
        }

        reason
    }

    async fn run_inner(&self, problem: &str) -> Result<TerminationReason, SessionError> {
        self.transcript.record_problem(problem)?;

        let mut state = ConversationState::new();
        state.push(Turn::new(Role::System, framing_instructions(problem)));

        let schemas = vocabulary::tool_schemas();

        loop {
            debug!("Sending {} turns to planner", state.len());

            let Some(outcome) = self
                .interruptible(
                    "waiting on the planner",
                    self.planner.generate(&to_chat_messages(&state), &schemas),
                )
                .await
            else {
                return Ok(TerminationReason::UserAborted);
            };
            let reply = outcome.map_err(|e| SessionError::Planner(e.to_string()))?;

            let action = vocabulary::classify(&reply)?;

            // Prose accompanying a structured action is shown and recorded
            // before the action itself is dispatched.
            if !matches!(action, Action::Message { .. }) {
                if let Some(text) = reply.content.as_deref().filter(|t| !t.trim().is_empty()) {
                    self.operator.show_assistant(text).await;
                    state.push(Turn::new(Role::Assistant, text));
                    self.transcript.record_turn(Section::AiResponse, text)?;
                }
            }

            match action {
                Action::Message { text } => {
                    self.operator.show_assistant(&text).await;
                    state.push(Turn::new(Role::Assistant, text.clone()));
                    self.transcript.record_turn(Section::AiResponse, &text)?;

                    // None covers both a closed input stream and an interrupt.
                    let Some(answer) = self
                        .interruptible("awaiting a reply", self.operator.prompt_reply())
                        .await
                        .flatten()
                    else {
                        return Ok(TerminationReason::UserAborted);
                    };
                    state.push(Turn::new(Role::User, answer.clone()));
                    self.transcript.record_turn(Section::UserResponse, &answer)?;
                }
                Action::AskUser { question } => {
                    self.operator.show_assistant(&question).await;
                    state.push(Turn::new(Role::Assistant, question.clone()));
                    self.transcript.record_turn(Section::AiResponse, &question)?;

                    let Some(answer) = self
                        .interruptible("awaiting a reply", self.operator.prompt_reply())
                        .await
                        .flatten()
                    else {
                        return Ok(TerminationReason::UserAborted);
                    };
                    state.push(Turn::new(Role::User, answer.clone()));
                    self.transcript.record_turn(Section::UserResponse, &answer)?;
                }
                Action::RunCommand { command } => {
                    // Classification guarantees the call exists here.
                    let call_id = reply
                        .tool_calls
                        .first()
                        .map(|c| c.id.clone())
                        .unwrap_or_default();

                    state.push(Turn::with_metadata(
                        Role::Assistant,
                        format!("Calling tool: {}", vocabulary::RUN_TERMINAL_COMMAND),
                        serde_json::json!({
                            "tool_call": true,
                            "id": call_id,
                            "name": vocabulary::RUN_TERMINAL_COMMAND,
                            "arguments": {"command": command.clone()},
                        }),
                    ));
                    self.transcript.record_turn(Section::AiCommand, &command)?;

                    match self.operator.confirm_command(&command).await {
                        Decision::Abort => {
                            info!("User aborted pending command");
                            return Ok(TerminationReason::UserAborted);
                        }
                        Decision::Proceed => {
                            let Some(result) = self
                                .interruptible(
                                    "running the command",
                                    self.runner.run_command(&command),
                                )
                                .await
                            else {
                                return Ok(TerminationReason::UserAborted);
                            };
                            info!(
                                "Command finished with exit code {:?} ({} bytes captured)",
                                result.exit_code,
                                result.output.len()
                            );

                            self.operator.show_output(&result.output).await;
                            state.push(Turn::with_metadata(
                                Role::ToolResult,
                                result.output.clone(),
                                serde_json::json!({"tool_call_id": call_id}),
                            ));
                            self.transcript
                                .record_turn(Section::CommandOutput, &result.output)?;
                        }
                    }
                }
                Action::EndSession => {
                    info!("Planner signaled end of session");
                    return Ok(TerminationReason::Completed);
                }
            }
        }
    }
}

/// Build the system framing turn that opens every conversation.
fn framing_instructions(problem: &str) -> String {
    format!(
        "You are a helpful system administrator and Linux expert, debugging the \
following issue the user is facing on their machine:\n\n{problem}\n\n\
The run_terminal_command tool runs a shell command directly on the user's \
machine and replies with its output. Run commands yourself through it rather \
than asking or telling the user to run them. Only request one action at a \
time, and explain each step in plain language as you go.\n\n\
Don't run commands that require interactive input; you can't provide it and \
they will freeze. Instead, use ask_for_info to ask the user to run them and \
report the output back to you.\n\n\
When there is nothing more you can do, or the user is satisfied that the \
matter is solved, call end_session."
    )
}

/// Convert conversation turns into the planner's wire format.
fn to_chat_messages(state: &ConversationState) -> Vec<ChatMessage> {
    state
        .turns()
        .iter()
        .map(|turn| match turn.role {
            Role::System => ChatMessage::text("system", &turn.content),
            Role::User => ChatMessage::text("user", &turn.content),
            Role::Assistant => {
                let tool_call_meta = turn.metadata.as_ref().filter(|m| {
                    m.get("tool_call")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false)
                });
                match tool_call_meta {
                    Some(meta) => {
                        let arguments = serde_json::to_string(&meta["arguments"])
                            .unwrap_or_else(|_| "{}".to_string());
                        ChatMessage {
                            role: "assistant".to_string(),
                            content: None,
                            tool_calls: Some(serde_json::json!([{
                                "id": meta["id"],
                                "type": "function",
                                "function": {
                                    "name": meta["name"],
                                    "arguments": arguments,
                                },
                            }])),
                            tool_call_id: None,
                        }
                    }
                    None => ChatMessage::text("assistant", &turn.content),
                }
            }
            Role::ToolResult => ChatMessage {
                role: "tool".to_string(),
                content: Some(turn.content.clone()),
                tool_calls: None,
                tool_call_id: turn
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("tool_call_id"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
            },
        })
        .collect()
}
