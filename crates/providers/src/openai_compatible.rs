use crate::traits::*;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Planner backed by any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAICompatiblePlanner {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAICompatiblePlanner {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Planner for OpenAICompatiblePlanner {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<PlannerReply, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        tracing::debug!("Calling planner endpoint: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, text)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_reply(&payload)
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

/// Parse an OpenAI-compatible chat-completions payload into a PlannerReply.
pub fn parse_reply(payload: &serde_json::Value) -> Result<PlannerReply, ProviderError> {
    let choice = payload["choices"]
        .get(0)
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let message = &choice["message"];
    let content = message["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let finish_reason = choice["finish_reason"]
        .as_str()
        .unwrap_or("stop")
        .to_string();

    let tool_calls = if let Some(calls) = message["tool_calls"].as_array() {
        calls
            .iter()
            .enumerate()
            .map(|(index, call)| {
                let id = call["id"]
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("call_{}", index));
                let name = call["function"]["name"]
                    .as_str()
                    .ok_or_else(|| {
                        ProviderError::Parse("Tool call without a function name".to_string())
                    })?
                    .to_string();
                // Arguments arrive as a JSON-encoded string per the wire format.
                let arguments = match call["function"]["arguments"].as_str() {
                    Some(raw) => serde_json::from_str(raw)
                        .map_err(|e| ProviderError::Parse(format!("Bad tool arguments: {}", e)))?,
                    None => call["function"]["arguments"].clone(),
                };
                Ok(ToolCall {
                    id,
                    name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?
    } else {
        Vec::new()
    };

    if content.is_none() && tool_calls.is_empty() {
        return Err(ProviderError::Parse(
            "Planner returned neither text nor a tool call".to_string(),
        ));
    }

    Ok(PlannerReply {
        content,
        tool_calls,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_reply() {
        let payload = json!({
            "choices": [{
                "message": {"content": "Checking disk usage next."},
                "finish_reason": "stop"
            }]
        });

        let reply = parse_reply(&payload).unwrap();
        assert_eq!(reply.content.as_deref(), Some("Checking disk usage next."));
        assert!(reply.tool_calls.is_empty());
        assert_eq!(reply.finish_reason, "stop");
    }

    #[test]
    fn test_parse_tool_call_reply() {
        let payload = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "function": {
                            "name": "run_terminal_command",
                            "arguments": "{\"command\": \"df -h\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let reply = parse_reply(&payload).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.tool_calls[0].name, "run_terminal_command");
        assert_eq!(reply.tool_calls[0].arguments["command"], "df -h");
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        let payload = json!({
            "choices": [{
                "message": {"content": null},
                "finish_reason": "stop"
            }]
        });

        assert!(matches!(
            parse_reply(&payload),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_choices() {
        let payload = json!({"error": "overloaded"});
        assert!(matches!(
            parse_reply(&payload),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_tool_call_without_id_gets_synthetic_id() {
        let payload = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {
                            "name": "end_session",
                            "arguments": "{}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let reply = parse_reply(&payload).unwrap();
        assert_eq!(reply.tool_calls[0].id, "call_0");
    }

    #[test]
    fn test_chat_message_serialization_skips_empty_fields() {
        let msg = ChatMessage::text("user", "hello");
        let serialized = serde_json::to_value(&msg).unwrap();
        assert_eq!(serialized["role"], "user");
        assert_eq!(serialized["content"], "hello");
        assert!(serialized.get("tool_calls").is_none());
        assert!(serialized.get("tool_call_id").is_none());
    }
}
