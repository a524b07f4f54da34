//! The closed action vocabulary declared to the planner, and the single
//! classification function that turns a planner response into one Action.

use crate::types::Action;
use serde_json::json;
use sysaidmin_providers::PlannerReply;
use thiserror::Error;

pub const RUN_TERMINAL_COMMAND: &str = "run_terminal_command";
pub const ASK_FOR_INFO: &str = "ask_for_info";
pub const END_SESSION: &str = "end_session";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Planner requested {0} with an empty command")]
    EmptyCommand(&'static str),
    #[error("Planner requested {0} with an empty question")]
    EmptyQuestion(&'static str),
    #[error("Planner requested unknown action: {0}")]
    UnknownAction(String),
    #[error("Planner response carried neither text nor an action")]
    EmptyReply,
}

/// Tool schemas declared to the planner, in OpenAI function format.
pub fn tool_schemas() -> Vec<serde_json::Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": RUN_TERMINAL_COMMAND,
                "description": "Run a shell command on the user's machine and return its output. Do not use commands that require interactive input.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The shell command to run, as one string"
                        }
                    },
                    "required": ["command"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": ASK_FOR_INFO,
                "description": "Ask the user for information or clarification.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question to ask the user"
                        }
                    },
                    "required": ["question"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": END_SESSION,
                "description": "End the session when the problem is solved or nothing more can be done.",
                "parameters": {
                    "type": "object",
                    "properties": {}
                }
            }
        }),
    ]
}

/// Classify one planner response into exactly one Action.
///
/// Pure function: a structured tool call always wins over accompanying text,
/// and an action is never inferred from prose — only from an explicit
/// declaration. If the planner violates the one-action-per-step instruction,
/// the first declared call is taken.
pub fn classify(reply: &PlannerReply) -> Result<Action, ClassifyError> {
    if let Some(call) = reply.tool_calls.first() {
        if reply.tool_calls.len() > 1 {
            tracing::warn!(
                "Planner requested {} actions in one step; taking the first",
                reply.tool_calls.len()
            );
        }

        return match call.name.as_str() {
            RUN_TERMINAL_COMMAND => {
                let command = call.arguments["command"].as_str().unwrap_or("").trim();
                if command.is_empty() {
                    Err(ClassifyError::EmptyCommand(RUN_TERMINAL_COMMAND))
                } else {
                    Ok(Action::RunCommand {
                        command: command.to_string(),
                    })
                }
            }
            ASK_FOR_INFO => {
                let question = call.arguments["question"].as_str().unwrap_or("").trim();
                if question.is_empty() {
                    Err(ClassifyError::EmptyQuestion(ASK_FOR_INFO))
                } else {
                    Ok(Action::AskUser {
                        question: question.to_string(),
                    })
                }
            }
            END_SESSION => Ok(Action::EndSession),
            other => Err(ClassifyError::UnknownAction(other.to_string())),
        };
    }

    match reply.content.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(Action::Message {
            text: text.to_string(),
        }),
        _ => Err(ClassifyError::EmptyReply),
    }
}
