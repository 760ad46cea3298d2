//! Typed reqwest client for the Slack Web API.
//!
//! All methods POST JSON to `{base}/api/{method}` with a bearer token and
//! decode Slack's `{ "ok": bool, ... }` envelope. The base URL is
//! overridable so acceptance tests can point the client at an in-process
//! fake server.

use serde::{Deserialize, Serialize};

use crate::error::{SlackError, SlackResult};

const DEFAULT_BASE_URL: &str = "https://slack.com";

/// Identity attached to a bearer token, from `auth.test`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A workspace member, from `users.list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub email: Option<String>,
}

/// A conversation, from `conversations.list` / `conversations.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// Parameters for `conversations.list`.
#[derive(Debug, Clone)]
pub struct ChannelQuery {
    /// Comma-separated conversation types.
    pub types: String,
    pub exclude_archived: bool,
    pub limit: u32,
}

impl Default for ChannelQuery {
    /// Public and private channels, archived included, up to Slack's page
    /// limit. Reconciliation needs the archived ones to detect removals.
    fn default() -> Self {
        Self {
            types: "public_channel,private_channel".to_string(),
            exclude_archived: false,
            limit: 1000,
        }
    }
}

// ── Response envelopes ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Value,
}

/// Slack Web API client.
///
/// Holds only an HTTP connection pool and the API base URL. The bearer
/// token is a per-call argument: one client serves any number of
/// workspaces, and no session state is reused across calls.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackClient {
    /// Client against the real Slack API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an arbitrary base URL (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST `{base}/api/{method}`, check the HTTP status, decode the
    /// `ok`/`error` envelope and hand back the remaining fields.
    async fn call(
        &self,
        token: &str,
        method: &str,
        payload: serde_json::Value,
    ) -> SlackResult<serde_json::Value> {
        let url = format!("{}/api/{method}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response.json().await?;
        if !envelope.ok {
            let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            tracing::debug!(method, %code, "Slack API call failed");
            return Err(SlackError::api(code));
        }
        Ok(envelope.rest)
    }

    /// `auth.test` — validate a token and identify its workspace.
    pub async fn auth_test(&self, token: &str) -> SlackResult<AuthInfo> {
        let rest = self.call(token, "auth.test", serde_json::json!({})).await?;
        Ok(serde_json::from_value(rest)?)
    }

    /// `users.list` — all members of the workspace.
    pub async fn users_list(&self, token: &str) -> SlackResult<Vec<Member>> {
        let rest = self.call(token, "users.list", serde_json::json!({})).await?;
        let members = rest.get("members").cloned().unwrap_or_default();
        Ok(serde_json::from_value(members)?)
    }

    /// `conversations.list` — channels matching the query.
    pub async fn conversations_list(
        &self,
        token: &str,
        query: &ChannelQuery,
    ) -> SlackResult<Vec<Channel>> {
        let payload = serde_json::json!({
            "types": query.types,
            "exclude_archived": query.exclude_archived,
            "limit": query.limit,
        });
        let rest = self.call(token, "conversations.list", payload).await?;
        let channels = rest.get("channels").cloned().unwrap_or_default();
        Ok(serde_json::from_value(channels)?)
    }

    /// `conversations.create` — create a channel.
    pub async fn conversations_create(
        &self,
        token: &str,
        name: &str,
        is_private: bool,
    ) -> SlackResult<Channel> {
        let payload = serde_json::json!({ "name": name, "is_private": is_private });
        let rest = self.call(token, "conversations.create", payload).await?;
        let channel = rest
            .get("channel")
            .cloned()
            .ok_or_else(|| SlackError::Json("conversations.create: missing channel".into()))?;
        Ok(serde_json::from_value(channel)?)
    }

    /// `conversations.setPurpose`.
    pub async fn conversations_set_purpose(
        &self,
        token: &str,
        channel_id: &str,
        purpose: &str,
    ) -> SlackResult<()> {
        let payload = serde_json::json!({ "channel": channel_id, "purpose": purpose });
        self.call(token, "conversations.setPurpose", payload).await?;
        Ok(())
    }

    /// `conversations.setTopic`.
    pub async fn conversations_set_topic(
        &self,
        token: &str,
        channel_id: &str,
        topic: &str,
    ) -> SlackResult<()> {
        let payload = serde_json::json!({ "channel": channel_id, "topic": topic });
        self.call(token, "conversations.setTopic", payload).await?;
        Ok(())
    }

    /// `conversations.archive`.
    pub async fn conversations_archive(&self, token: &str, channel_id: &str) -> SlackResult<()> {
        let payload = serde_json::json!({ "channel": channel_id });
        self.call(token, "conversations.archive", payload).await?;
        Ok(())
    }

    /// `conversations.invite` — invite one user into a channel.
    pub async fn conversations_invite(
        &self,
        token: &str,
        channel_id: &str,
        user_id: &str,
    ) -> SlackResult<()> {
        let payload = serde_json::json!({ "channel": channel_id, "users": user_id });
        self.call(token, "conversations.invite", payload).await?;
        Ok(())
    }

    /// `chat.postMessage` — returns the message timestamp used for pinning.
    pub async fn chat_post_message(
        &self,
        token: &str,
        channel_id: &str,
        text: &str,
    ) -> SlackResult<String> {
        let payload = serde_json::json!({ "channel": channel_id, "text": text });
        let rest = self.call(token, "chat.postMessage", payload).await?;
        let ts = rest
            .get("ts")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SlackError::Json("chat.postMessage: missing ts".into()))?;
        Ok(ts.to_string())
    }

    /// `pins.add` — pin a message by timestamp.
    pub async fn pins_add(&self, token: &str, channel_id: &str, ts: &str) -> SlackResult<()> {
        let payload = serde_json::json!({ "channel": channel_id, "timestamp": ts });
        self.call(token, "pins.add", payload).await?;
        Ok(())
    }
}
