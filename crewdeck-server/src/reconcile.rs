//! Workspace reconciliation: re-derive each cached project record from
//! live Slack state.
//!
//! Records are reconciled independently and concurrently — one fan-out
//! branch per record, joined before the combined result is returned. A
//! dead credential or a hung call in one branch never affects another:
//! projects are independent workspaces, and serializing them would only
//! slow the pass down with no correctness benefit.
//!
//! Per record, the steps are strictly ordered: validate the credential,
//! list live channels (archived included), intersect the remembered
//! channel list with the live active ones, and refresh the status fields.
//! Channels are only ever removed by reconciliation, never invented, and
//! `archived → active` never happens here — that transition belongs to
//! provisioning alone.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crewdeck_slack::{ChannelQuery, Directory, SlackError};

use crate::project::{ProjectRecord, ProjectStatus, SyncStatus};

/// Aggregate result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total: usize,
    pub active: usize,
    pub archived: usize,
    pub errors: usize,
}

/// Reconcile every record against live remote state and return the full
/// updated set plus a summary. The caller persists the returned set
/// wholesale.
pub async fn reconcile_all<D: Directory + ?Sized>(
    dir: &D,
    projects: Vec<ProjectRecord>,
) -> (Vec<ProjectRecord>, SyncSummary) {
    let reconciled =
        futures::future::join_all(projects.into_iter().map(|p| reconcile_one(dir, p))).await;

    let summary = SyncSummary {
        total: reconciled.len(),
        active: reconciled
            .iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .count(),
        archived: reconciled
            .iter()
            .filter(|p| p.status == ProjectStatus::Archived)
            .count(),
        errors: reconciled
            .iter()
            .filter(|p| p.sync_status == Some(SyncStatus::Error))
            .count(),
    };
    tracing::info!(
        total = summary.total,
        active = summary.active,
        archived = summary.archived,
        errors = summary.errors,
        "reconciliation pass complete"
    );
    (reconciled, summary)
}

/// Reconcile a single record. Never fails — every error degrades to a
/// reported `sync_status` on the record itself.
async fn reconcile_one<D: Directory + ?Sized>(dir: &D, mut project: ProjectRecord) -> ProjectRecord {
    // No stored credential: report and make no remote calls at all.
    if project.slack_token.is_empty() {
        project.sync_status = Some(SyncStatus::NoToken);
        return project;
    }

    match check_live_state(dir, &project).await {
        Ok(live) => {
            let before = project.channels.len();
            let active: Vec<String> = project
                .channels
                .iter()
                .filter(|name| {
                    live.channels
                        .iter()
                        .any(|c| c.name == **name && !c.is_archived)
                })
                .cloned()
                .collect();

            project.archived_channels = Some((before - active.len()) as u32);
            project.channel_count = active.len() as u32;
            // Archived is terminal for reconciliation; only a fresh
            // provisioning run moves a project back to active.
            if active.is_empty() {
                project.status = ProjectStatus::Archived;
            }
            project.channels = active;
            project.sync_status = Some(SyncStatus::Success);
            project.sync_error = None;
            project.last_synced = Some(Utc::now());
            if let Some(team) = live.team.filter(|t| !t.is_empty()) {
                project.team_name = Some(team);
            }
        }
        Err(e) if e.is_invalid_token() => {
            // The credential itself is the point of failure: the channel
            // list is left untouched rather than rechecked.
            tracing::warn!(project = %project.name, "credential no longer valid");
            project.sync_status = Some(SyncStatus::InvalidToken);
            project.status = ProjectStatus::Archived;
            project.last_synced = Some(Utc::now());
        }
        Err(e) => {
            tracing::warn!(project = %project.name, error = %e, "reconciliation failed");
            project.sync_status = Some(SyncStatus::Error);
            project.sync_error = Some(e.to_string());
        }
    }
    project
}

struct LiveState {
    team: Option<String>,
    channels: Vec<crewdeck_slack::Channel>,
}

/// Steps 2 and 5: validate the credential, then list all channels —
/// public and private, archived included so removals are detectable.
async fn check_live_state<D: Directory + ?Sized>(
    dir: &D,
    project: &ProjectRecord,
) -> Result<LiveState, SlackError> {
    let auth = dir.auth_test(&project.slack_token).await?;
    let channels = dir
        .list_channels(&project.slack_token, &ChannelQuery::default())
        .await?;
    Ok(LiveState {
        team: auth.team,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockDirectory, channel};

    fn project(name: &str, token: &str, channels: &[&str]) -> ProjectRecord {
        ProjectRecord::new(
            name,
            token,
            channels.iter().map(|s| s.to_string()).collect(),
            0,
        )
    }

    #[tokio::test]
    async fn no_token_short_circuits_with_zero_remote_calls() {
        let dir = MockDirectory::new();
        let records = vec![project("acme", "", &["general"])];

        let (out, summary) = reconcile_all(&dir, records).await;

        assert_eq!(out[0].sync_status, Some(SyncStatus::NoToken));
        assert_eq!(out[0].channels, vec!["general"]);
        assert_eq!(out[0].status, ProjectStatus::Active);
        assert!(out[0].last_synced.is_none());
        assert_eq!(dir.calls.total(), 0);
        assert_eq!(summary.total, 1);
    }

    #[tokio::test]
    async fn invalid_token_archives_and_leaves_channels_untouched() {
        for code in ["invalid_auth", "account_inactive", "token_revoked"] {
            let dir = MockDirectory::new().with_auth_error("xoxb-dead", code);
            let records = vec![project("acme", "xoxb-dead", &["general", "dev"])];

            let (out, _) = reconcile_all(&dir, records).await;

            assert_eq!(out[0].sync_status, Some(SyncStatus::InvalidToken), "{code}");
            assert_eq!(out[0].status, ProjectStatus::Archived);
            assert_eq!(out[0].channels, vec!["general", "dev"]);
            assert!(out[0].last_synced.is_some());
            // Auth failed, so the channel list was never requested.
            assert_eq!(dir.calls.list_channels.get(), 0);
        }
    }

    #[tokio::test]
    async fn other_errors_leave_status_untouched() {
        let dir = MockDirectory::new().with_auth_error("xoxb-1", "fatal_error");
        let records = vec![project("acme", "xoxb-1", &["general"])];

        let (out, summary) = reconcile_all(&dir, records).await;

        assert_eq!(out[0].sync_status, Some(SyncStatus::Error));
        assert_eq!(out[0].status, ProjectStatus::Active);
        assert_eq!(
            out[0].sync_error.as_deref(),
            Some("Slack API error: fatal_error")
        );
        assert!(out[0].last_synced.is_none());
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn channel_list_failure_is_classified_like_auth_failure() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_channels_error("xoxb-1", "token_revoked");
        let records = vec![project("acme", "xoxb-1", &["general"])];

        let (out, _) = reconcile_all(&dir, records).await;

        assert_eq!(out[0].sync_status, Some(SyncStatus::InvalidToken));
        assert_eq!(out[0].status, ProjectStatus::Archived);
        assert_eq!(out[0].channels, vec!["general"]);
    }

    #[tokio::test]
    async fn channels_never_grow_and_archived_are_dropped() {
        let dir = MockDirectory::new().with_token("xoxb-1", "Acme").with_channels(
            "xoxb-1",
            vec![
                channel("C1", "general", false),
                channel("C2", "dev", true),       // archived remotely
                channel("C3", "unrelated", false), // live but never remembered
            ],
        );
        let records = vec![project("acme", "xoxb-1", &["general", "dev", "gone"])];

        let (out, _) = reconcile_all(&dir, records).await;

        let p = &out[0];
        assert_eq!(p.channels, vec!["general"]); // subset of the remembered list
        assert_eq!(p.channel_count, 1);
        assert_eq!(p.archived_channels, Some(2));
        assert_eq!(p.status, ProjectStatus::Active);
        assert_eq!(p.sync_status, Some(SyncStatus::Success));
        assert_eq!(p.team_name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn zero_live_channels_archives_the_project() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_channels("xoxb-1", vec![channel("C1", "general", true)]);
        let records = vec![project("acme", "xoxb-1", &["general"])];

        let (out, summary) = reconcile_all(&dir, records).await;

        assert_eq!(out[0].status, ProjectStatus::Archived);
        assert_eq!(out[0].sync_status, Some(SyncStatus::Success));
        assert!(out[0].channels.is_empty());
        assert_eq!(summary.archived, 1);
        assert_eq!(summary.active, 0);
    }

    #[tokio::test]
    async fn one_failing_record_does_not_affect_the_others() {
        let dir = MockDirectory::new()
            .with_token("xoxb-a", "TeamA")
            .with_channels("xoxb-a", vec![channel("C1", "general", false)])
            .with_auth_error("xoxb-b", "invalid_auth")
            .with_token("xoxb-c", "TeamC")
            .with_channels("xoxb-c", vec![channel("C9", "ops", false)]);

        let records = vec![
            project("a", "xoxb-a", &["general"]),
            project("b", "xoxb-b", &["b-chan"]),
            project("c", "xoxb-c", &["ops"]),
        ];

        let (out, summary) = reconcile_all(&dir, records).await;

        assert_eq!(out[0].sync_status, Some(SyncStatus::Success));
        assert_eq!(out[0].channels, vec!["general"]);
        assert_eq!(out[1].sync_status, Some(SyncStatus::InvalidToken));
        assert_eq!(out[1].channels, vec!["b-chan"]);
        assert_eq!(out[2].sync_status, Some(SyncStatus::Success));
        assert_eq!(out[2].channels, vec!["ops"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.archived, 1);
        assert_eq!(summary.errors, 0);
    }

    #[tokio::test]
    async fn two_record_scenario() {
        // A: valid credential, 3 remembered channels, live state shows one
        // archived and two active. B: revoked credential.
        let dir = MockDirectory::new()
            .with_token("xoxb-a", "TeamA")
            .with_channels(
                "xoxb-a",
                vec![
                    channel("C1", "general", false),
                    channel("C2", "dev", false),
                    channel("C3", "old", true),
                ],
            )
            .with_auth_error("xoxb-b", "token_revoked");

        let records = vec![
            project("a", "xoxb-a", &["general", "dev", "old"]),
            project("b", "xoxb-b", &["keep-me"]),
        ];

        let (out, summary) = reconcile_all(&dir, records).await;

        let a = &out[0];
        assert_eq!(a.status, ProjectStatus::Active);
        assert_eq!(a.channels.len(), 2);
        assert_eq!(a.archived_channels, Some(1));
        assert_eq!(a.sync_status, Some(SyncStatus::Success));

        let b = &out[1];
        assert_eq!(b.status, ProjectStatus::Archived);
        assert_eq!(b.sync_status, Some(SyncStatus::InvalidToken));
        assert_eq!(b.channels, vec!["keep-me"]);

        assert_eq!(
            summary,
            SyncSummary {
                total: 2,
                active: 1,
                archived: 1,
                errors: 0
            }
        );
    }

    #[tokio::test]
    async fn reconciliation_never_revives_an_archived_project() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_channels("xoxb-1", vec![channel("C1", "general", false)]);
        let mut record = project("acme", "xoxb-1", &["general"]);
        record.status = ProjectStatus::Archived;

        let (out, _) = reconcile_all(&dir, vec![record]).await;

        // Live channels exist, but archived → active is reserved for
        // provisioning.
        assert_eq!(out[0].status, ProjectStatus::Archived);
        assert_eq!(out[0].sync_status, Some(SyncStatus::Success));
        assert_eq!(out[0].channels, vec!["general"]);
    }

    #[tokio::test]
    async fn success_clears_stale_sync_error() {
        let dir = MockDirectory::new()
            .with_token("xoxb-1", "Acme")
            .with_channels("xoxb-1", vec![channel("C1", "general", false)]);
        let mut record = project("acme", "xoxb-1", &["general"]);
        record.sync_status = Some(SyncStatus::Error);
        record.sync_error = Some("old failure".into());

        let (out, _) = reconcile_all(&dir, vec![record]).await;

        assert_eq!(out[0].sync_status, Some(SyncStatus::Success));
        assert!(out[0].sync_error.is_none());
    }
}
