use serde::{Deserialize, Serialize};

use crate::domain::{frame::FrameSize, stream::CapabilityStatus};

pub const ALERT_TITLE: &str = "Person Detected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub color: String,
    pub title: String,
    pub description: String,
}

/// Cuerpo JSON del webhook (formato compatible con Discord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub username: String,
    pub content: String,
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    pub fn person_detected(username: &str, color: &str, object_url: &str) -> Self {
        Self {
            username: username.to_string(),
            content: object_url.to_string(),
            embeds: vec![Embed {
                color: color.to_string(),
                title: ALERT_TITLE.to_string(),
                description: format!("[View Image]({object_url})"),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub detecting: bool,
    pub capability: CapabilityStatus,
    pub objects: Vec<String>,
    pub video: Option<FrameSize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub detecting: bool,
}
