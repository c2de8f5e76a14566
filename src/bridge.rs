//! Message contracts between the web view and the shell. Commands carry the
//! requests; the event names below carry the asynchronous replies.

use serde::{Deserialize, Serialize};

pub const EVENT_NOTE_SAVED: &str = "note-saved";
pub const EVENT_PREVIEW_UPDATED: &str = "preview-updated";
pub const EVENT_EDITOR_LOG: &str = "editor-log";

/// Body of a save request. `time` is the session key of the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    pub time: String,
    pub content: String,
}

/// Reply to a save request. Always echoes the session key so the editor can
/// tell which draft to clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAck {
    #[serde(alias = "success")]
    pub is_success: bool,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveAck {
    pub fn success(key: impl Into<String>) -> Self {
        Self {
            is_success: true,
            key: key.into(),
            error: None,
        }
    }

    pub fn failure(key: impl Into<String>, error: impl ToString) -> Self {
        Self {
            is_success: false,
            key: key.into(),
            error: Some(error.to_string()),
        }
    }
}

/// The only configuration the view is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub save_interval_in_seconds: u64,
    pub is_preview_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewUpdate {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub message: String,
    pub is_error: bool,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Everything the view needs to paint itself after (re)loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub session_key: String,
    pub text: String,
    pub preview_html: Option<String>,
    pub preview_visible: bool,
    pub restored: bool,
}
