//! Informational commands, `/chat`, and membership greetings.

use std::sync::Arc;

use crate::{
    domain::{Actor, BotIdentity, IncomingMessage, MemberStatus, MembershipChange},
    formatting::{escape_html, truncate_chars},
    gate::PermissionGate,
    platform::{ChatAction, ChatPlatform},
    ports::ChatModel,
    texts,
};

/// Bot API text limit is 4096; leave room for escaping.
const MAX_CHAT_REPLY_CHARS: usize = 3500;

pub struct GeneralCommands {
    platform: Arc<dyn ChatPlatform>,
    gate: Arc<PermissionGate>,
    chat_model: Option<Arc<dyn ChatModel>>,
    bot: BotIdentity,
}

impl GeneralCommands {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        gate: Arc<PermissionGate>,
        chat_model: Option<Arc<dyn ChatModel>>,
        bot: BotIdentity,
    ) -> Self {
        Self {
            platform,
            gate,
            chat_model,
            bot,
        }
    }

    pub async fn start(&self, msg: &IncomingMessage) {
        self.reply(msg, texts::START).await;
    }

    pub async fn help(&self, msg: &IncomingMessage) {
        let name = msg.from.as_ref().map(|a| a.full_name.as_str()).unwrap_or("");
        let mut html = texts::help(name);
        if !self.gate.is_allowed_group(msg.chat.id) {
            html.push_str("\n\n");
            html.push_str(texts::HELP_NOT_OUR_GROUP);
        }
        self.reply(msg, &html).await;
    }

    pub async fn info(&self, msg: &IncomingMessage) {
        let Some(user) = msg.from.as_ref() else {
            return;
        };
        let html = texts::user_info(
            &user.full_name,
            user.id.0,
            user.language_code.as_deref(),
            user.username.as_deref(),
        );
        self.reply(msg, &html).await;
    }

    pub async fn chat_info(&self, msg: &IncomingMessage) {
        let html = texts::chat_info(
            msg.chat.title.as_deref(),
            msg.chat.id.0,
            msg.chat.kind.as_str(),
        );
        self.reply(msg, &html).await;
    }

    pub async fn chat(&self, msg: &IncomingMessage, prompt: &str) {
        if !self.gate.is_allowed_group(msg.chat.id) {
            self.reply(msg, texts::NOT_OUR_GROUP).await;
            return;
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.reply(msg, texts::CHAT_EMPTY).await;
            return;
        }
        let Some(model) = self.chat_model.as_ref() else {
            self.reply(msg, texts::CHAT_UNAVAILABLE).await;
            return;
        };

        if let Err(e) = self.platform.send_chat_action(msg.chat.id, ChatAction::Typing).await {
            tracing::debug!("chat action failed: {e}");
        }

        match model.reply(prompt).await {
            Ok(answer) => {
                let answer = truncate_chars(answer.trim(), MAX_CHAT_REPLY_CHARS);
                self.reply(msg, &escape_html(&answer)).await;
            }
            Err(e) => {
                tracing::error!(chat_id = msg.chat.id.0, "chat model failed: {e}");
                self.reply(msg, texts::CHAT_FAILED).await;
            }
        }
    }

    pub async fn new_members(&self, msg: &IncomingMessage, members: &[Actor]) {
        if members.iter().any(|m| m.id == self.bot.id) {
            self.reply(msg, texts::BOT_JOINED).await;
            return;
        }
        let title = msg.chat.title.as_deref().unwrap_or("");
        for member in members {
            self.reply(msg, &texts::welcome(&member.full_name, title)).await;
        }
    }

    pub async fn member_left(&self, msg: &IncomingMessage, member: &Actor) {
        if member.id == self.bot.id {
            return;
        }
        self.reply(msg, &texts::farewell(&member.full_name)).await;
    }

    pub fn membership_changed(&self, change: &MembershipChange) {
        let by = change.by.as_ref().map(|a| a.id.0);
        match change.new_status {
            MemberStatus::Left | MemberStatus::Banned => tracing::info!(
                chat_id = change.chat.id.0,
                by,
                "bot removed from chat"
            ),
            MemberStatus::Member | MemberStatus::Administrator | MemberStatus::Owner
                if matches!(change.old_status, MemberStatus::Left | MemberStatus::Banned) =>
            {
                tracing::info!(
                    chat_id = change.chat.id.0,
                    title = change.chat.title.as_deref().unwrap_or(""),
                    allowed = self.gate.is_allowed_group(change.chat.id),
                    by,
                    "bot added to chat"
                )
            }
            status => tracing::info!(
                chat_id = change.chat.id.0,
                ?status,
                "bot membership changed"
            ),
        }
    }

    async fn reply(&self, msg: &IncomingMessage, html: &str) {
        if let Err(e) = self.platform.reply_html(msg.message_ref(), html).await {
            tracing::warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
        }
    }
}
