//! Project records: one per configured Slack workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project lifecycle status.
///
/// Created as `Active`. Reconciliation may flip `Active → Archived` (dead
/// credential, or no live channels left) but never the reverse — only a
/// fresh provisioning run revives a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// Outcome of the last reconciliation attempt. Informational only — it does
/// not gate any operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "invalid-token")]
    InvalidToken,
    #[serde(rename = "no-token")]
    NoToken,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::InvalidToken => "invalid-token",
            SyncStatus::NoToken => "no-token",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(SyncStatus::Success),
            "error" => Some(SyncStatus::Error),
            "invalid-token" => Some(SyncStatus::InvalidToken),
            "no-token" => Some(SyncStatus::NoToken),
            _ => None,
        }
    }
}

/// A configured workspace, as persisted and as returned over the API.
///
/// The bearer token is stored opaquely and must never appear in logs or
/// tracing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Stable identifier, assigned once at creation.
    pub id: String,
    pub name: String,
    /// Workspace display name reported by `auth.test`, refreshed on sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub slack_token: String,
    /// Channel names the service believes exist and are active.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub channel_count: u32,
    #[serde(default)]
    pub member_count: u32,
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
    /// Channels dropped by the last reconciliation pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_channels: Option<u32>,
    /// Raw remote error message from the last failed reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// Fresh record from a provisioning run.
    pub fn new(
        name: impl Into<String>,
        slack_token: impl Into<String>,
        channels: Vec<String>,
        member_count: u32,
    ) -> Self {
        let channel_count = channels.len() as u32;
        Self {
            id: new_id(),
            name: name.into(),
            team_name: None,
            slack_token: slack_token.into(),
            channels,
            channel_count,
            member_count,
            status: ProjectStatus::Active,
            sync_status: None,
            last_synced: None,
            archived_channels: None,
            sync_error: None,
            created_at: Utc::now(),
        }
    }
}

/// Random URL-safe identifier.
pub fn new_id() -> String {
    use base64::Engine;
    use rand::RngCore;
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
