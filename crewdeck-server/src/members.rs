//! Member resolution and channel membership.
//!
//! Emails are matched exactly (case-sensitive) against the live user list;
//! bots and deleted accounts never match. A resolved user is invited into
//! each target channel in order — `already_in_channel` counts as success,
//! any other failure is recorded for that channel and the remaining
//! channels are still attempted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crewdeck_slack::{ChannelQuery, Directory, Member, SlackResult};

/// Exact email match, excluding bots and deleted accounts.
pub fn resolve_member<'a>(members: &'a [Member], email: &str) -> Option<&'a Member> {
    members
        .iter()
        .find(|m| !m.is_bot && !m.deleted && m.profile.email.as_deref() == Some(email))
}

/// A per-channel invite failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: String,
}

/// What happened to one email across all target channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipOutcome {
    pub email: String,
    /// The user existed in the workspace directory.
    pub resolved: bool,
    /// Channels the user is now in (invited, or already a member).
    pub invited: Vec<String>,
    pub failed: Vec<ChannelFailure>,
}

impl MembershipOutcome {
    /// A user counts as successfully added iff they ended up in at least
    /// one channel.
    pub fn succeeded(&self) -> bool {
        !self.invited.is_empty()
    }

    fn unresolved(email: &str) -> Self {
        Self {
            email: email.to_string(),
            resolved: false,
            invited: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Invite one resolved user into each target channel, in order.
///
/// `live_channels` maps channel name → id, fetched once by the caller. A
/// name with no live channel is a per-channel failure with no remote call.
pub async fn apply_membership<D: Directory + ?Sized>(
    dir: &D,
    token: &str,
    email: &str,
    user_id: &str,
    targets: &[String],
    live_channels: &HashMap<String, String>,
) -> MembershipOutcome {
    let mut outcome = MembershipOutcome {
        email: email.to_string(),
        resolved: true,
        invited: Vec::new(),
        failed: Vec::new(),
    };

    for name in targets {
        let Some(channel_id) = live_channels.get(name) else {
            outcome.failed.push(ChannelFailure {
                channel: name.clone(),
                error: "channel_not_found".to_string(),
            });
            continue;
        };
        match dir.invite_user(token, channel_id, user_id).await {
            Ok(()) => outcome.invited.push(name.clone()),
            Err(e) if e.is_already_in_channel() => outcome.invited.push(name.clone()),
            Err(e) => {
                tracing::debug!(channel = %name, error = %e, "invite failed");
                outcome.failed.push(ChannelFailure {
                    channel: name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    outcome
}

/// Batch result of adding a set of emails to a set of channels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddUsersReport {
    /// Emails that ended up in at least one channel.
    pub success: Vec<String>,
    /// Emails not found in the workspace, or added to zero channels.
    pub failed: Vec<String>,
    /// Per-email detail.
    pub outcomes: Vec<MembershipOutcome>,
}

/// Resolve each email against the live user list and invite into the
/// target channels. User and channel lists are fetched once per call, not
/// cached across calls.
pub async fn add_users<D: Directory + ?Sized>(
    dir: &D,
    token: &str,
    emails: &[String],
    channels: &[String],
) -> SlackResult<AddUsersReport> {
    let users = dir.list_users(token).await?;
    let live = dir.list_channels(token, &ChannelQuery::default()).await?;
    let live_map: HashMap<String, String> = live
        .into_iter()
        .filter(|c| !c.is_archived)
        .map(|c| (c.name, c.id))
        .collect();

    let mut report = AddUsersReport::default();
    for email in emails {
        let outcome = match resolve_member(&users, email) {
            Some(user) => {
                let user_id = user.id.clone();
                apply_membership(dir, token, email, &user_id, channels, &live_map).await
            }
            None => MembershipOutcome::unresolved(email),
        };
        if outcome.succeeded() {
            report.success.push(email.clone());
        } else {
            report.failed.push(email.clone());
        }
        report.outcomes.push(outcome);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockDirectory, channel, member};

    #[test]
    fn resolver_is_exact_and_excludes_bots_and_deleted() {
        let members = vec![
            member("U1", "a@x.com", false, false),
            member("U2", "b@x.com", true, false),  // bot
            member("U3", "c@x.com", false, true),  // deleted
        ];
        assert_eq!(resolve_member(&members, "a@x.com").unwrap().id, "U1");
        assert!(resolve_member(&members, "A@X.COM").is_none()); // case-sensitive
        assert!(resolve_member(&members, "b@x.com").is_none());
        assert!(resolve_member(&members, "c@x.com").is_none());
        assert!(resolve_member(&members, "d@x.com").is_none());
    }

    #[tokio::test]
    async fn already_in_channel_everywhere_is_success() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_users("xoxb-1", vec![member("U1", "a@x.com", false, false)])
            .with_channels(
                "xoxb-1",
                vec![channel("C1", "general", false), channel("C2", "dev", false)],
            )
            .with_invite_error("C1", "already_in_channel")
            .with_invite_error("C2", "already_in_channel");

        let report = add_users(
            &dir,
            "xoxb-1",
            &["a@x.com".into()],
            &["general".into(), "dev".into()],
        )
        .await
        .unwrap();

        assert_eq!(report.success, vec!["a@x.com"]);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn unresolved_user_makes_zero_invite_calls() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_users("xoxb-1", vec![])
            .with_channels("xoxb-1", vec![channel("C1", "general", false)]);

        let report = add_users(&dir, "xoxb-1", &["ghost@x.com".into()], &["general".into()])
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["ghost@x.com"]);
        assert!(report.success.is_empty());
        assert_eq!(dir.calls.invite.get(), 0);
        assert!(!report.outcomes[0].resolved);
    }

    #[tokio::test]
    async fn partial_channel_failure_still_counts_as_success() {
        // a@x.com resolves, succeeds on c1, fails on c2 with a non-benign
        // error; b@x.com does not resolve.
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_users("xoxb-1", vec![member("U1", "a@x.com", false, false)])
            .with_channels(
                "xoxb-1",
                vec![channel("C1", "c1", false), channel("C2", "c2", false)],
            )
            .with_invite_error("C2", "cant_invite");

        let report = add_users(
            &dir,
            "xoxb-1",
            &["a@x.com".into(), "b@x.com".into()],
            &["c1".into(), "c2".into()],
        )
        .await
        .unwrap();

        assert_eq!(report.success, vec!["a@x.com"]);
        assert_eq!(report.failed, vec!["b@x.com"]);
        let a = &report.outcomes[0];
        assert_eq!(a.invited, vec!["c1"]);
        assert_eq!(a.failed.len(), 1);
        assert_eq!(a.failed[0].channel, "c2");
    }

    #[tokio::test]
    async fn user_added_to_zero_channels_is_a_failure() {
        // Resolves fine, but every target name misses the live channel
        // list — benign lookups, yet the user ends up nowhere.
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_users("xoxb-1", vec![member("U1", "a@x.com", false, false)])
            .with_channels("xoxb-1", vec![]);

        let report = add_users(&dir, "xoxb-1", &["a@x.com".into()], &["gone".into()])
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["a@x.com"]);
        assert_eq!(dir.calls.invite.get(), 0);
        assert!(report.outcomes[0].resolved);
    }

    #[tokio::test]
    async fn no_short_circuit_across_channels() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_users("xoxb-1", vec![member("U1", "a@x.com", false, false)])
            .with_channels(
                "xoxb-1",
                vec![
                    channel("C1", "c1", false),
                    channel("C2", "c2", false),
                    channel("C3", "c3", false),
                ],
            )
            .with_invite_error("C1", "cant_invite");

        let report = add_users(
            &dir,
            "xoxb-1",
            &["a@x.com".into()],
            &["c1".into(), "c2".into(), "c3".into()],
        )
        .await
        .unwrap();

        // All three channels attempted despite the first failing.
        assert_eq!(dir.calls.invite.get(), 3);
        assert_eq!(report.outcomes[0].invited, vec!["c2", "c3"]);
    }
}
