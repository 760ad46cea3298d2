//! Slack Web API client for crewdeck.
//!
//! A thin typed wrapper over the handful of Slack methods the provisioning
//! service needs: `auth.test`, `users.list`, the `conversations.*` family,
//! `chat.postMessage` and `pins.add`. Every call is authenticated with a
//! caller-supplied bearer token — there is no session state, no retry and no
//! rate-limit handling. Errors carry Slack's named error codes so callers
//! can treat "already satisfied" conditions (`name_taken`,
//! `already_in_channel`, `already_archived`) as success.
//!
//! The [`Directory`] trait abstracts the remote workspace directory so that
//! service logic can be exercised against a scripted double in tests.

pub mod client;
pub mod directory;
pub mod error;

pub use client::{AuthInfo, Channel, ChannelQuery, Member, Profile, SlackClient};
pub use directory::Directory;
pub use error::{SlackError, SlackResult};
