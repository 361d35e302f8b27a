//! Uplink Messages
//!
//! Entries of the session's message log plus the wire events exchanged
//! over the uplink channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who authored a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
            Role::System => "SYSTEM",
        };
        f.write_str(label)
    }
}

/// Send mode selected by the caller's toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    Fast,
    Reasoning,
}

/// One entry of the session's append-only message log.
///
/// Insertion order is the only meaningful order; the timestamp is
/// wall-clock capture time used for display formatting, not for ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// Unique within the session
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Capture a new log entry.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self::with_image(role, text, None)
    }

    /// Capture a new log entry carrying a visual payload.
    pub fn with_image(role: Role, text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            image,
            timestamp: Utc::now(),
        }
    }
}

/// Events sent to the node over the uplink channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Operator input. Fire-and-forget: no delivery confirmation, no
    /// request/response correlation.
    Input {
        text: String,
        user: String,
        mode: SendMode,
    },
}

/// Events delivered by the node over the uplink channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Assistant response, optionally carrying a visual payload.
    Response {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique() {
        let a = ChatMessage::new(Role::User, "one");
        let b = ChatMessage::new(Role::User, "one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn client_event_serializes_with_the_input_tag() {
        let event = ClientEvent::Input {
            text: "status report".to_string(),
            user: "Guest Operator".to_string(),
            mode: SendMode::Fast,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"input""#));
        assert!(json.contains(r#""text":"status report""#));
        assert!(json.contains(r#""user":"Guest Operator""#));
        assert!(json.contains(r#""mode":"fast""#));
    }

    #[test]
    fn reasoning_mode_serializes_lowercase() {
        let json = serde_json::to_string(&SendMode::Reasoning).unwrap();
        assert_eq!(json, r#""reasoning""#);
    }

    #[test]
    fn server_event_deserializes_without_image() {
        let json = r#"{"event": "response", "text": "Acknowledged."}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Response { text, image } => {
                assert_eq!(text, "Acknowledged.");
                assert!(image.is_none());
            }
        }
    }

    #[test]
    fn server_event_deserializes_with_image() {
        let json = r#"{"event": "response", "text": "Visual.", "image": "https://cdn.test/x.png"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Response { image, .. } => {
                assert_eq!(image.as_deref(), Some("https://cdn.test/x.png"));
            }
        }
    }

    #[test]
    fn unknown_events_fail_to_parse() {
        let json = r#"{"event": "telemetry", "text": "nope"}"#;
        assert!(serde_json::from_str::<ServerEvent>(json).is_err());
    }

    #[test]
    fn role_labels_are_uppercase() {
        assert_eq!(Role::Assistant.to_string(), "ASSISTANT");
        assert_eq!(Role::System.to_string(), "SYSTEM");
    }
}
