//! Wire and conversation types for the chat-completion endpoint.
//!
//! Serde-serializable to the OpenAI-compatible JSON shape.

use serde::{Deserialize, Serialize};

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Output token cap used when nothing else is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Sampling temperature for every request. Pinned so reruns are as
/// reproducible as the endpoint allows.
pub const TEMPERATURE: f32 = 0.0;

/// Speaker of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered conversation: exactly one leading system message, then at
/// least one user message, then optional prior turns.
///
/// The only way to build one is [`Conversation::new`], so the shape holds
/// for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation from a system prompt and the first user turn.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    /// Append prior turns, alternating assistant and user starting with
    /// the assistant.
    pub fn with_turns<I, S>(mut self, turns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut role = Role::Assistant;
        for turn in turns {
            self.messages.push(Message {
                role,
                content: turn.into(),
            });
            role = match role {
                Role::Assistant => Role::User,
                _ => Role::Assistant,
            };
        }
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Content of the system message.
    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    /// Content of the first user message.
    pub fn user_prompt(&self) -> &str {
        &self.messages[1].content
    }
}

/// Fixed generation parameters applied to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> ChatRequest<'a> {
    pub fn new(params: &'a GenerationParams, conversation: &'a Conversation) -> Self {
        Self {
            model: &params.model,
            messages: conversation.messages(),
            max_tokens: params.max_tokens,
            temperature: TEMPERATURE,
        }
    }
}

/// Response body from the chat-completion endpoint. Only the fields the
/// pipeline reads are modelled.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_starts_with_system_then_user() {
        let conv = Conversation::new("sys", "usr");
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(conv.system_prompt(), "sys");
        assert_eq!(conv.user_prompt(), "usr");
    }

    #[test]
    fn prior_turns_alternate_assistant_and_user() {
        let conv = Conversation::new("sys", "usr").with_turns(["a1", "u2", "a3"]);
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }

    #[test]
    fn request_serializes_to_openai_shape() {
        let params = GenerationParams {
            model: "gpt-4".into(),
            max_tokens: 123,
        };
        let conv = Conversation::new("be terse", "hello");
        let json = serde_json::to_value(ChatRequest::new(&params, &conv)).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 123);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be terse");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn response_text_reads_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text(), Some("first"));
    }

    #[test]
    fn response_without_choices_has_no_text() {
        let resp: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(resp.text(), None);
    }

    #[test]
    fn default_params() {
        let params = GenerationParams::default();
        assert_eq!(params.model, DEFAULT_MODEL);
        assert_eq!(params.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
