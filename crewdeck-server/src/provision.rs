//! Channel provisioning: create a channel and apply its metadata.
//!
//! Every step after creation is best-effort and individually recorded —
//! a failed topic never rolls back a created channel, it just shows up as
//! a failed step in the result.

use serde::{Deserialize, Serialize};

use crewdeck_slack::{Directory, SlackError};

/// A channel to provision, as requested by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<String>,
}

/// What happened to the channel itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// Freshly created.
    Created,
    /// `name_taken` — the desired end-state already held. Metadata steps
    /// are skipped for pre-existing channels.
    AlreadyExisted,
    Failed { error: String },
}

/// Result of one metadata step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepStatus {
    /// Not requested, or the channel was not freshly created.
    Skipped,
    Applied,
    Failed { error: String },
}

/// Full per-channel provisioning result, one entry per requested channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelProvision {
    pub name: String,
    #[serde(flatten)]
    pub outcome: ChannelOutcome,
    pub purpose: StepStatus,
    pub topic: StepStatus,
    pub pinned: StepStatus,
}

impl ChannelProvision {
    /// The channel exists remotely (created now or before) and can be used
    /// as an invite target.
    pub fn usable(&self) -> bool {
        !matches!(self.outcome, ChannelOutcome::Failed { .. })
    }
}

/// Create one channel and apply its optional metadata, sequentially.
pub async fn provision_channel<D: Directory + ?Sized>(
    dir: &D,
    token: &str,
    spec: &ChannelSpec,
) -> ChannelProvision {
    let mut result = ChannelProvision {
        name: spec.name.clone(),
        outcome: ChannelOutcome::Created,
        purpose: StepStatus::Skipped,
        topic: StepStatus::Skipped,
        pinned: StepStatus::Skipped,
    };

    let channel = match dir.create_channel(token, &spec.name, spec.is_private).await {
        Ok(channel) => channel,
        Err(e) if e.is_name_taken() => {
            tracing::debug!(channel = %spec.name, "channel already exists, skipping metadata");
            result.outcome = ChannelOutcome::AlreadyExisted;
            return result;
        }
        Err(e) => {
            tracing::warn!(channel = %spec.name, error = %e, "channel creation failed");
            result.outcome = ChannelOutcome::Failed {
                error: e.to_string(),
            };
            return result;
        }
    };

    if let Some(purpose) = spec.description.as_deref().filter(|s| !s.is_empty()) {
        result.purpose = step(dir.set_purpose(token, &channel.id, purpose).await);
    }
    if let Some(topic) = spec.topic.as_deref().filter(|s| !s.is_empty()) {
        result.topic = step(dir.set_topic(token, &channel.id, topic).await);
    }
    if let Some(text) = spec.pinned_message.as_deref().filter(|s| !s.is_empty()) {
        result.pinned = match dir.post_message(token, &channel.id, text).await {
            Ok(ts) => step(dir.pin_message(token, &channel.id, &ts).await),
            Err(e) => StepStatus::Failed {
                error: e.to_string(),
            },
        };
    }

    if result.purpose != StepStatus::Skipped
        || result.topic != StepStatus::Skipped
        || result.pinned != StepStatus::Skipped
    {
        tracing::debug!(channel = %spec.name, ?result.purpose, ?result.topic, ?result.pinned,
            "channel metadata applied");
    }
    result
}

fn step(outcome: Result<(), SlackError>) -> StepStatus {
    match outcome {
        Ok(()) => StepStatus::Applied,
        Err(e) => StepStatus::Failed {
            error: e.to_string(),
        },
    }
}
