use serde::{Deserialize, Serialize};

/// Role tag of one conversation turn.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[serde(rename = "tool")]
    ToolResult,
}

/// One exchange unit in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp(),
            metadata: None,
        }
    }

    pub fn with_metadata(
        role: Role,
        content: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp(),
            metadata: Some(metadata),
        }
    }
}

/// Ordered, append-only conversation history for one session.
///
/// Owned exclusively by the session engine; turns are never reordered or
/// removed once appended.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// The classified intent extracted from one planner response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Message { text: String },
    RunCommand { command: String },
    AskUser { question: String },
    EndSession,
}

/// Outcome of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

/// Captured output of one confirmed command.
///
/// `output` is stdout and stderr merged into one blob, which is what flows
/// back to the planner and into the transcript. The exit code is kept as a
/// separate field and never folded into the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: String,
    pub output: String,
    pub exit_code: Option<i32>,
    pub timestamp: i64,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    Completed,
    UserAborted,
    Failed { cause: String },
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Completed => write!(f, "Session ended."),
            TerminationReason::UserAborted => write!(f, "Session aborted by user."),
            TerminationReason::Failed { cause } => write!(f, "Session failed: {}", cause),
        }
    }
}

/// Transcript section labels, matching the on-disk log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    AiResponse,
    AiCommand,
    CommandOutput,
    UserResponse,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::AiResponse => "AI response",
            Section::AiCommand => "AI command",
            Section::CommandOutput => "Command output",
            Section::UserResponse => "User response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::new(Role::User, "hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hello");
        assert!(turn.metadata.is_none());
        assert!(turn.timestamp > 0);
    }

    #[test]
    fn test_turn_with_metadata() {
        let meta = json!({"tool_call_id": "call_1"});
        let turn = Turn::with_metadata(Role::ToolResult, "out", meta.clone());
        assert_eq!(turn.metadata, Some(meta));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::ToolResult).unwrap(),
            r#""tool""#
        );
    }

    #[test]
    fn test_conversation_state_append_order() {
        let mut state = ConversationState::new();
        assert!(state.is_empty());
        state.push(Turn::new(Role::System, "framing"));
        state.push(Turn::new(Role::Assistant, "reply"));
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[0].role, Role::System);
        assert_eq!(state.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(Section::AiResponse.label(), "AI response");
        assert_eq!(Section::AiCommand.label(), "AI command");
        assert_eq!(Section::CommandOutput.label(), "Command output");
        assert_eq!(Section::UserResponse.label(), "User response");
    }

    #[test]
    fn test_termination_reason_display() {
        assert_eq!(TerminationReason::Completed.to_string(), "Session ended.");
        assert_eq!(
            TerminationReason::Failed {
                cause: "boom".to_string()
            }
            .to_string(),
            "Session failed: boom"
        );
    }
}
