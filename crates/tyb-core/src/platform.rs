//! Port over the messaging platform (Telegram Bot API today).
//!
//! Every component talks to Telegram through this trait so the bot logic can
//! be exercised against an in-memory fake.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChatAdmin, ChatId, MemberPermissions, MemberStatus, MessageId, MessageRef, UserId},
    Result,
};

/// Outgoing "chat action" (upload indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadDocument,
    UploadVoice,
}

/// A local file to send, with the name the recipient sees.
#[derive(Clone, Copy, Debug)]
pub struct Upload<'a> {
    pub path: &'a Path,
    pub file_name: Option<&'a str>,
    pub caption: Option<&'a str>,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    // Queries
    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus>;
    async fn administrators(&self, chat_id: ChatId) -> Result<Vec<ChatAdmin>>;

    // Member mutations
    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()>;
    async fn unban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()>;
    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<()>;

    // Message mutations
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
    async fn pin_message(&self, msg: MessageRef) -> Result<()>;
    /// Unpin `message_id`, or the most recent pinned message when `None`.
    async fn unpin_message(&self, chat_id: ChatId, message_id: Option<MessageId>) -> Result<()>;
    async fn unpin_all(&self, chat_id: ChatId) -> Result<()>;

    // Sending
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef>;
    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
    async fn send_document(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef>;
    async fn send_voice(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef>;

    // Files
    async fn download_file(&self, file_id: &str, dst: &Path) -> Result<()>;
}
