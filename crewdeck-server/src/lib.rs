//! Slack workspace provisioning and reconciliation service.
//!
//! crewdeck bootstraps Slack workspaces — creates channels, applies their
//! purpose/topic/pinned message, invites known members — and keeps a local
//! catalog of configured "projects" honest by periodically reconciling each
//! record against live Slack state.
//!
//! The HTTP surface ([`web`]) is a small JSON API; all Slack traffic goes
//! through the `Directory` seam from `crewdeck-slack`; project records live
//! in a SQLite store ([`db`]).

pub mod config;
pub mod db;
pub mod members;
pub mod project;
pub mod provision;
pub mod reconcile;
pub mod templates;
pub mod web;

#[cfg(test)]
pub mod testutil;
