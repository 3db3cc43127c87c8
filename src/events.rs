use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Who authored a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    /// Replies and ingestion notices. The chat server expects `llm` on the wire.
    #[serde(rename = "llm", alias = "assistant")]
    Assistant,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

/// Individual transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            from: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            from: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// Settled result of one outbound request, delivered back to the controller
#[derive(Debug)]
pub enum Outcome {
    /// Chat turn finished
    Chat(Result<String, ApiError>),
    /// URL ingestion finished
    Url(Result<String, ApiError>),
    /// File upload finished
    Upload(Result<String, ApiError>),
}

/// TUI-specific events (keyboard, paste, etc.)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Nothing happened during the last poll window
    Tick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_wire_names() {
        let json = serde_json::to_value(vec![Message::user("Hello"), Message::assistant("Hi")]).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "from": "user", "text": "Hello" },
                { "from": "llm", "text": "Hi" },
            ])
        );
    }

    #[test]
    fn assistant_alias_is_accepted() {
        let message: Message = serde_json::from_str(r#"{"from":"assistant","text":"ok"}"#).unwrap();
        assert_eq!(message, Message::assistant("ok"));
    }
}
