// ABOUTME: Wire protocol between the sandbox host and the render guest
// ABOUTME: JSON-lines messages tagged by `type`, each optionally carrying a correlation id

use serde::{Deserialize, Serialize};

use adapt_core::RuntimeReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub code: String,
    pub props: serde_json::Value,
}

/// Messages written to the guest's stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
    },
    Render {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        payload: RenderPayload,
    },
}

/// Messages read from the guest's stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GuestMessage {
    #[serde(rename = "pong")]
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
    },
    #[serde(rename = "render:ok")]
    RenderOk {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Headless markup of the mounted tree, when the guest produces one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        markup: Option<String>,
    },
    #[serde(rename = "render:error")]
    RenderError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        message: String,
    },
}

impl GuestMessage {
    pub fn id(&self) -> Option<u64> {
        match self {
            GuestMessage::Pong { id }
            | GuestMessage::RenderOk { id, .. }
            | GuestMessage::RenderError { id, .. } => *id,
        }
    }

    /// Whether this message answers the request `expected`.
    ///
    /// Id-less messages come from guests that predate correlation and are
    /// attributed to the single outstanding request.
    pub fn answers(&self, expected: u64) -> bool {
        self.id().map_or(true, |id| id == expected)
    }

    /// Runtime report for render results, `None` for anything else
    pub fn into_report(self) -> Option<(RuntimeReport, Option<String>)> {
        match self {
            GuestMessage::RenderOk { markup, .. } => Some((RuntimeReport::ok(), markup)),
            GuestMessage::RenderError { message, .. } => Some((RuntimeReport::error(message), None)),
            GuestMessage::Pong { .. } => None,
        }
    }
}
