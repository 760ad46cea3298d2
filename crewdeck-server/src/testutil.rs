//! Scripted `Directory` double for unit tests.
//!
//! Behavior is keyed by token (auth outcome, user list, channel list) and
//! by channel (per-call error codes). Every operation bumps a counter so
//! tests can assert exactly which remote calls happened.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crewdeck_slack::{
    AuthInfo, Channel, ChannelQuery, Directory, Member, Profile, SlackError, SlackResult,
};

#[derive(Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct Calls {
    pub auth: Counter,
    pub list_users: Counter,
    pub list_channels: Counter,
    pub create: Counter,
    pub set_purpose: Counter,
    pub set_topic: Counter,
    pub post_message: Counter,
    pub pin: Counter,
    pub invite: Counter,
    pub archive: Counter,
}

impl Calls {
    /// Total remote calls of any kind.
    pub fn total(&self) -> usize {
        self.auth.get()
            + self.list_users.get()
            + self.list_channels.get()
            + self.create.get()
            + self.set_purpose.get()
            + self.set_topic.get()
            + self.post_message.get()
            + self.pin.get()
            + self.invite.get()
            + self.archive.get()
    }
}

#[derive(Default)]
pub struct MockDirectory {
    /// token → team name for valid tokens.
    teams: HashMap<String, String>,
    /// token → error code overriding auth.test.
    auth_errors: HashMap<String, String>,
    users: HashMap<String, Vec<Member>>,
    channels: HashMap<String, Vec<Channel>>,
    /// token → error code for conversations.list.
    channels_errors: HashMap<String, String>,
    /// channel name → error code for conversations.create.
    create_errors: HashMap<String, String>,
    /// channel id → error code for conversations.invite.
    invite_errors: HashMap<String, String>,
    /// channel id → error code for conversations.archive.
    archive_errors: HashMap<String, String>,
    topic_error: Option<String>,
    purpose_error: Option<String>,
    pub calls: Calls,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, team: &str) -> Self {
        self.teams.insert(token.into(), team.into());
        self
    }

    pub fn with_auth_error(mut self, token: &str, code: &str) -> Self {
        self.auth_errors.insert(token.into(), code.into());
        self
    }

    pub fn with_users(mut self, token: &str, users: Vec<Member>) -> Self {
        self.users.insert(token.into(), users);
        self
    }

    pub fn with_channels(mut self, token: &str, channels: Vec<Channel>) -> Self {
        self.channels.insert(token.into(), channels);
        self
    }

    pub fn with_channels_error(mut self, token: &str, code: &str) -> Self {
        self.channels_errors.insert(token.into(), code.into());
        self
    }

    pub fn with_create_error(mut self, name: &str, code: &str) -> Self {
        self.create_errors.insert(name.into(), code.into());
        self
    }

    pub fn with_invite_error(mut self, channel_id: &str, code: &str) -> Self {
        self.invite_errors.insert(channel_id.into(), code.into());
        self
    }

    pub fn with_archive_error(mut self, channel_id: &str, code: &str) -> Self {
        self.archive_errors.insert(channel_id.into(), code.into());
        self
    }

    pub fn with_topic_error(mut self, code: &str) -> Self {
        self.topic_error = Some(code.into());
        self
    }

    pub fn with_purpose_error(mut self, code: &str) -> Self {
        self.purpose_error = Some(code.into());
        self
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn auth_test(&self, token: &str) -> SlackResult<AuthInfo> {
        self.calls.auth.bump();
        if let Some(code) = self.auth_errors.get(token) {
            return Err(SlackError::api(code.clone()));
        }
        match self.teams.get(token) {
            Some(team) => Ok(AuthInfo {
                team: Some(team.clone()),
                team_id: Some("T1".into()),
                user: Some("provisioner".into()),
                user_id: Some("U0".into()),
            }),
            None => Err(SlackError::api("invalid_auth")),
        }
    }

    async fn list_users(&self, token: &str) -> SlackResult<Vec<Member>> {
        self.calls.list_users.bump();
        Ok(self.users.get(token).cloned().unwrap_or_default())
    }

    async fn list_channels(&self, token: &str, _query: &ChannelQuery) -> SlackResult<Vec<Channel>> {
        self.calls.list_channels.bump();
        if let Some(code) = self.channels_errors.get(token) {
            return Err(SlackError::api(code.clone()));
        }
        Ok(self.channels.get(token).cloned().unwrap_or_default())
    }

    async fn create_channel(
        &self,
        _token: &str,
        name: &str,
        _is_private: bool,
    ) -> SlackResult<Channel> {
        self.calls.create.bump();
        if let Some(code) = self.create_errors.get(name) {
            return Err(SlackError::api(code.clone()));
        }
        Ok(channel(&format!("C-{name}"), name, false))
    }

    async fn set_purpose(&self, _token: &str, _channel_id: &str, _purpose: &str) -> SlackResult<()> {
        self.calls.set_purpose.bump();
        match &self.purpose_error {
            Some(code) => Err(SlackError::api(code.clone())),
            None => Ok(()),
        }
    }

    async fn set_topic(&self, _token: &str, _channel_id: &str, _topic: &str) -> SlackResult<()> {
        self.calls.set_topic.bump();
        match &self.topic_error {
            Some(code) => Err(SlackError::api(code.clone())),
            None => Ok(()),
        }
    }

    async fn post_message(&self, _token: &str, _channel_id: &str, _text: &str) -> SlackResult<String> {
        self.calls.post_message.bump();
        Ok("1700000000.000100".to_string())
    }

    async fn pin_message(&self, _token: &str, _channel_id: &str, _ts: &str) -> SlackResult<()> {
        self.calls.pin.bump();
        Ok(())
    }

    async fn invite_user(&self, _token: &str, channel_id: &str, _user_id: &str) -> SlackResult<()> {
        self.calls.invite.bump();
        match self.invite_errors.get(channel_id) {
            Some(code) => Err(SlackError::api(code.clone())),
            None => Ok(()),
        }
    }

    async fn archive_channel(&self, _token: &str, channel_id: &str) -> SlackResult<()> {
        self.calls.archive.bump();
        match self.archive_errors.get(channel_id) {
            Some(code) => Err(SlackError::api(code.clone())),
            None => Ok(()),
        }
    }
}

pub fn member(id: &str, email: &str, is_bot: bool, deleted: bool) -> Member {
    Member {
        id: id.into(),
        profile: Profile {
            email: Some(email.into()),
        },
        is_bot,
        deleted,
    }
}

pub fn channel(id: &str, name: &str, is_archived: bool) -> Channel {
    Channel {
        id: id.into(),
        name: name.into(),
        is_archived,
    }
}
