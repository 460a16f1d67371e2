//! Telegram adapter (teloxide).
//!
//! Implements the `tyb-core` ChatPlatform port over the Telegram Bot API.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::{
    net::Download,
    prelude::*,
    types::{ChatMemberKind, ChatPermissions, InputFile, ParseMode},
    RequestError,
};

pub mod handlers;
pub mod router;

use tyb_core::{
    domain::{ChatAdmin, ChatId, MemberPermissions, MemberStatus, MessageId, MessageRef, UserId},
    errors::{Error, PlatformError, PlatformErrorKind},
    platform::{ChatAction, ChatPlatform, Upload},
    Result,
};

use handlers::convert::actor;

#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_user(user_id: UserId) -> teloxide::types::UserId {
        teloxide::types::UserId(user_id.0 as u64)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    /// Every failed Bot API call goes through here; the description text is
    /// classified once.
    fn map_err(e: RequestError) -> Error {
        let platform = match &e {
            RequestError::Api(api) => PlatformError::from_description(api.to_string()),
            RequestError::Network(net) if net.is_timeout() => {
                PlatformError::new(PlatformErrorKind::Timeout, e.to_string())
            }
            RequestError::Network(_) | RequestError::Io(_) => {
                PlatformError::new(PlatformErrorKind::Network, e.to_string())
            }
            _ => PlatformError::new(PlatformErrorKind::Other, e.to_string()),
        };
        platform.into()
    }
}

pub(crate) fn member_status(kind: &ChatMemberKind) -> MemberStatus {
    match kind {
        ChatMemberKind::Owner(_) => MemberStatus::Owner,
        ChatMemberKind::Administrator(_) => MemberStatus::Administrator,
        ChatMemberKind::Member => MemberStatus::Member,
        ChatMemberKind::Restricted(_) => MemberStatus::Restricted,
        ChatMemberKind::Left => MemberStatus::Left,
        ChatMemberKind::Banned(_) => MemberStatus::Banned,
    }
}

fn tg_permissions(p: MemberPermissions) -> ChatPermissions {
    let mut out = ChatPermissions::empty();
    out.set(ChatPermissions::SEND_MESSAGES, p.send_messages);
    out.set(ChatPermissions::SEND_MEDIA_MESSAGES, p.send_media);
    out.set(ChatPermissions::SEND_POLLS, p.send_polls);
    out.set(ChatPermissions::SEND_OTHER_MESSAGES, p.send_other);
    out.set(ChatPermissions::ADD_WEB_PAGE_PREVIEWS, p.add_web_page_previews);
    out.set(ChatPermissions::CHANGE_INFO, p.change_info);
    out.set(ChatPermissions::INVITE_USERS, p.invite_users);
    out.set(ChatPermissions::PIN_MESSAGES, p.pin_messages);
    out
}

fn input_file(upload: &Upload<'_>) -> InputFile {
    let file = InputFile::file(upload.path);
    match upload.file_name {
        Some(name) => file.file_name(name.to_string()),
        None => file,
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus> {
        let member = self
            .bot
            .get_chat_member(Self::tg_chat(chat_id), Self::tg_user(user_id))
            .await
            .map_err(Self::map_err)?;
        Ok(member_status(&member.kind))
    }

    async fn administrators(&self, chat_id: ChatId) -> Result<Vec<ChatAdmin>> {
        let admins = self
            .bot
            .get_chat_administrators(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        Ok(admins
            .iter()
            .map(|m| ChatAdmin {
                user: actor(&m.user),
                status: member_status(&m.kind),
            })
            .collect())
    }

    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.bot
            .ban_chat_member(Self::tg_chat(chat_id), Self::tg_user(user_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn unban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.bot
            .unban_chat_member(Self::tg_chat(chat_id), Self::tg_user(user_id))
            .only_if_banned(true)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let req = self.bot.restrict_chat_member(
            Self::tg_chat(chat_id),
            Self::tg_user(user_id),
            tg_permissions(permissions),
        );
        match until {
            Some(until) => req.until_date(until).await,
            None => req.await,
        }
        .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.bot
            .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn pin_message(&self, msg: MessageRef) -> Result<()> {
        self.bot
            .pin_chat_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn unpin_message(&self, chat_id: ChatId, message_id: Option<MessageId>) -> Result<()> {
        let req = self.bot.unpin_chat_message(Self::tg_chat(chat_id));
        match message_id {
            Some(id) => req.message_id(Self::tg_msg_id(id)).await,
            None => req.await,
        }
        .map_err(Self::map_err)?;
        Ok(())
    }

    async fn unpin_all(&self, chat_id: ChatId) -> Result<()> {
        self.bot
            .unpin_all_chat_messages(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(to.chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .reply_to_message_id(Self::tg_msg_id(to.message_id))
            .allow_sending_without_reply(true)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::msg_ref(to.chat_id, &msg))
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
            ChatAction::UploadDocument => teloxide::types::ChatAction::UploadDocument,
            ChatAction::UploadVoice => teloxide::types::ChatAction::UploadVoice,
        };
        self.bot
            .send_chat_action(Self::tg_chat(chat_id), tg_action)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_document(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_document(Self::tg_chat(chat_id), input_file(&upload))
            .parse_mode(ParseMode::Html);
        if let Some(caption) = upload.caption {
            req = req.caption(caption.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_voice(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_voice(Self::tg_chat(chat_id), input_file(&upload))
            .parse_mode(ParseMode::Html);
        if let Some(caption) = upload.caption {
            req = req.caption(caption.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn download_file(&self, file_id: &str, dst: &Path) -> Result<()> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(Self::map_err)?;

        let mut out = tokio::fs::File::create(dst).await?;
        self.bot
            .download_file(&file.path, &mut out)
            .await
            .map_err(|e| PlatformError::new(PlatformErrorKind::Network, e.to_string()))?;
        Ok(())
    }
}
