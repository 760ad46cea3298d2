//! The remote directory seam.
//!
//! Provisioning, membership and reconciliation logic only ever see this
//! trait; [`SlackClient`] is the production implementation and tests
//! substitute a scripted double to assert exactly which remote calls were
//! made (including that none were).

use async_trait::async_trait;

use crate::client::{AuthInfo, Channel, ChannelQuery, Member, SlackClient};
use crate::error::SlackResult;

/// Remote workspace directory, authenticated per call with a bearer token.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn auth_test(&self, token: &str) -> SlackResult<AuthInfo>;
    async fn list_users(&self, token: &str) -> SlackResult<Vec<Member>>;
    async fn list_channels(&self, token: &str, query: &ChannelQuery) -> SlackResult<Vec<Channel>>;
    async fn create_channel(&self, token: &str, name: &str, is_private: bool)
    -> SlackResult<Channel>;
    async fn set_purpose(&self, token: &str, channel_id: &str, purpose: &str) -> SlackResult<()>;
    async fn set_topic(&self, token: &str, channel_id: &str, topic: &str) -> SlackResult<()>;
    async fn post_message(&self, token: &str, channel_id: &str, text: &str) -> SlackResult<String>;
    async fn pin_message(&self, token: &str, channel_id: &str, ts: &str) -> SlackResult<()>;
    async fn invite_user(&self, token: &str, channel_id: &str, user_id: &str) -> SlackResult<()>;
    async fn archive_channel(&self, token: &str, channel_id: &str) -> SlackResult<()>;
}

#[async_trait]
impl Directory for SlackClient {
    async fn auth_test(&self, token: &str) -> SlackResult<AuthInfo> {
        SlackClient::auth_test(self, token).await
    }

    async fn list_users(&self, token: &str) -> SlackResult<Vec<Member>> {
        self.users_list(token).await
    }

    async fn list_channels(&self, token: &str, query: &ChannelQuery) -> SlackResult<Vec<Channel>> {
        self.conversations_list(token, query).await
    }

    async fn create_channel(
        &self,
        token: &str,
        name: &str,
        is_private: bool,
    ) -> SlackResult<Channel> {
        self.conversations_create(token, name, is_private).await
    }

    async fn set_purpose(&self, token: &str, channel_id: &str, purpose: &str) -> SlackResult<()> {
        self.conversations_set_purpose(token, channel_id, purpose).await
    }

    async fn set_topic(&self, token: &str, channel_id: &str, topic: &str) -> SlackResult<()> {
        self.conversations_set_topic(token, channel_id, topic).await
    }

    async fn post_message(&self, token: &str, channel_id: &str, text: &str) -> SlackResult<String> {
        self.chat_post_message(token, channel_id, text).await
    }

    async fn pin_message(&self, token: &str, channel_id: &str, ts: &str) -> SlackResult<()> {
        self.pins_add(token, channel_id, ts).await
    }

    async fn invite_user(&self, token: &str, channel_id: &str, user_id: &str) -> SlackResult<()> {
        self.conversations_invite(token, channel_id, user_id).await
    }

    async fn archive_channel(&self, token: &str, channel_id: &str) -> SlackResult<()> {
        self.conversations_archive(token, channel_id).await
    }
}
