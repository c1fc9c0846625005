//! JSON text frames exchanged over `/api/v1/ws`.
//!
//! Every frame is an object tagged by `type`; field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        track_id: String,
    },
    Leave {
        track_id: String,
    },
    Comment {
        track_id: String,
        body: String,
        // Playback position the comment is pinned to.
        #[serde(default)]
        at_seconds: Option<f64>,
    },
    Whoami,
}

/// A comment as fanned out to everyone in the track room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub track_id: String,
    pub author: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_seconds: Option<f64>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Ready { connection_id: String, user: Value },
    Joined { track_id: String },
    Left { track_id: String },
    Comment(CommentEvent),
    Identity { user: Value },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
