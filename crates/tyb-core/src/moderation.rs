//! Moderation commands: every command runs the same gate sequence
//! (allowed chat → reply target → admin rank → self guard) before a single
//! platform call, then reports the outcome.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    domain::{
        Actor, BotIdentity, IncomingMessage, MemberPermissions, MemberStatus, MessageId,
        MessageRef,
    },
    formatting::{escape_html, mention, silent_mention},
    gate::PermissionGate,
    platform::ChatPlatform,
    texts, Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModerationCommand {
    Ban { reason: String },
    Unban,
    /// Raw duration argument (minutes), if any.
    Mute { duration: Option<String> },
    Unmute,
    Delete,
    Pin,
    Unpin,
    UnpinAll,
    Report,
    Admins,
}

struct Requirements {
    reply: bool,
    admin: bool,
    /// Refusal text when the replied-to user is the bot itself.
    self_guard: Option<&'static str>,
}

impl ModerationCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ModerationCommand::Ban { .. } => "ban",
            ModerationCommand::Unban => "unban",
            ModerationCommand::Mute { .. } => "mute",
            ModerationCommand::Unmute => "unmute",
            ModerationCommand::Delete => "del",
            ModerationCommand::Pin => "pin",
            ModerationCommand::Unpin => "unpin",
            ModerationCommand::UnpinAll => "unpin_all",
            ModerationCommand::Report => "report",
            ModerationCommand::Admins => "admins",
        }
    }

    fn requirements(&self) -> Requirements {
        let (reply, admin, self_guard) = match self {
            ModerationCommand::Ban { .. } => (true, true, Some(texts::BAN_SELF)),
            ModerationCommand::Unban => (true, true, Some(texts::UNBAN_SELF)),
            ModerationCommand::Mute { .. } => (true, true, Some(texts::MUTE_SELF)),
            ModerationCommand::Unmute => (true, true, Some(texts::UNMUTE_SELF)),
            ModerationCommand::Delete | ModerationCommand::Pin => (true, true, None),
            ModerationCommand::Unpin | ModerationCommand::UnpinAll => (false, true, None),
            ModerationCommand::Report => (true, false, None),
            ModerationCommand::Admins => (false, false, None),
        };
        Requirements {
            reply,
            admin,
            self_guard,
        }
    }
}

/// Parse the optional mute duration: a positive number of minutes.
fn parse_mute_minutes(arg: Option<&str>) -> std::result::Result<Option<u32>, ()> {
    let Some(first) = arg.and_then(|a| a.split_whitespace().next()) else {
        return Ok(None);
    };
    match first.parse::<u32>() {
        Ok(m) if m > 0 => Ok(Some(m)),
        _ => Err(()),
    }
}

/// The replied-to message and its author.
struct Target<'a> {
    message: MessageRef,
    user: &'a Actor,
}

/// Per-command reply texts for the outcome of the platform call.
struct Outcome<'a> {
    success: String,
    target_is_admin: Option<&'a str>,
    failed: &'a str,
}

pub struct ModerationExecutor {
    platform: Arc<dyn ChatPlatform>,
    gate: Arc<PermissionGate>,
    bot: BotIdentity,
}

impl ModerationExecutor {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        gate: Arc<PermissionGate>,
        bot: BotIdentity,
    ) -> Self {
        Self {
            platform,
            gate,
            bot,
        }
    }

    pub async fn execute(&self, msg: &IncomingMessage, cmd: ModerationCommand) {
        let Some(actor) = msg.from.as_ref() else {
            return;
        };
        let chat_id = msg.chat.id;

        if !self.gate.is_allowed_group(chat_id) {
            self.reply(msg, texts::NOT_OUR_GROUP).await;
            return;
        }

        let req = cmd.requirements();
        let target = msg.reply_to.as_ref().and_then(|r| {
            r.from.as_ref().map(|user| Target {
                message: MessageRef {
                    chat_id,
                    message_id: r.message_id,
                },
                user,
            })
        });

        if req.reply && target.is_none() {
            self.reply(msg, texts::REPLY_REQUIRED).await;
            return;
        }

        if req.admin && !self.gate.is_user_admin(chat_id, actor.id).await {
            self.reply(msg, texts::ADMINS_ONLY).await;
            return;
        }

        if let (Some(refusal), Some(t)) = (req.self_guard, target.as_ref()) {
            if t.user.id == self.bot.id {
                self.reply(msg, refusal).await;
                return;
            }
        }

        tracing::info!(
            chat_id = chat_id.0,
            user_id = actor.id.0,
            command = cmd.name(),
            "moderation command"
        );

        match (cmd, target) {
            (ModerationCommand::Ban { reason }, Some(t)) => self.ban(msg, actor, t, &reason).await,
            (ModerationCommand::Unban, Some(t)) => self.unban(msg, actor, t).await,
            (ModerationCommand::Mute { duration }, Some(t)) => {
                self.mute(msg, actor, t, duration.as_deref()).await
            }
            (ModerationCommand::Unmute, Some(t)) => self.unmute(msg, actor, t).await,
            (ModerationCommand::Delete, Some(t)) => self.delete(msg, actor, t).await,
            (ModerationCommand::Pin, Some(t)) => self.pin(msg, actor, t).await,
            (ModerationCommand::Unpin, t) => {
                self.unpin(msg, actor, t.map(|t| t.message.message_id)).await
            }
            (ModerationCommand::UnpinAll, _) => self.unpin_all(msg, actor).await,
            (ModerationCommand::Report, Some(t)) => self.report(msg, actor, t).await,
            (ModerationCommand::Admins, _) => self.list_admins(msg).await,
            // Reply-bound commands without a target were rejected above.
            (_, None) => {}
        }
    }

    async fn ban(&self, msg: &IncomingMessage, admin: &Actor, t: Target<'_>, reason: &str) {
        let reason = if reason.trim().is_empty() {
            texts::NO_REASON
        } else {
            reason.trim()
        };
        let result = self.platform.ban_member(msg.chat.id, t.user.id).await;
        self.finish(
            msg,
            "ban",
            result,
            Outcome {
                success: texts::banned(&mention(t.user), &mention(admin), reason),
                target_is_admin: Some(texts::BAN_ADMIN),
                failed: texts::BAN_FAILED,
            },
        )
        .await;
    }

    async fn unban(&self, msg: &IncomingMessage, admin: &Actor, t: Target<'_>) {
        let result = self.platform.unban_member(msg.chat.id, t.user.id).await;
        self.finish(
            msg,
            "unban",
            result,
            Outcome {
                success: texts::unbanned(&mention(t.user), &mention(admin)),
                target_is_admin: Some(texts::UNBAN_ADMIN),
                failed: texts::UNBAN_FAILED,
            },
        )
        .await;
    }

    async fn mute(
        &self,
        msg: &IncomingMessage,
        admin: &Actor,
        t: Target<'_>,
        duration: Option<&str>,
    ) {
        let Ok(minutes) = parse_mute_minutes(duration) else {
            self.reply(msg, texts::MUTE_BAD_DURATION).await;
            return;
        };
        let until = minutes.map(|m| Utc::now() + chrono::Duration::minutes(i64::from(m)));

        let result = self
            .platform
            .restrict_member(msg.chat.id, t.user.id, MemberPermissions::muted(), until)
            .await;
        self.finish(
            msg,
            "mute",
            result,
            Outcome {
                success: texts::muted(&mention(t.user), &mention(admin), minutes),
                target_is_admin: Some(texts::MUTE_ADMIN),
                failed: texts::MUTE_FAILED,
            },
        )
        .await;
    }

    async fn unmute(&self, msg: &IncomingMessage, admin: &Actor, t: Target<'_>) {
        let result = self
            .platform
            .restrict_member(msg.chat.id, t.user.id, MemberPermissions::unmuted(), None)
            .await;
        self.finish(
            msg,
            "unmute",
            result,
            Outcome {
                success: texts::unmuted(&mention(t.user), &mention(admin)),
                target_is_admin: Some(texts::UNMUTE_ADMIN),
                failed: texts::UNMUTE_FAILED,
            },
        )
        .await;
    }

    async fn delete(&self, msg: &IncomingMessage, admin: &Actor, t: Target<'_>) {
        let result = self.platform.delete_message(t.message).await;
        self.finish(
            msg,
            "delete",
            result,
            Outcome {
                success: texts::deleted(&mention(t.user), &mention(admin)),
                target_is_admin: None,
                failed: texts::DELETE_FAILED,
            },
        )
        .await;
    }

    async fn pin(&self, msg: &IncomingMessage, admin: &Actor, t: Target<'_>) {
        let result = self.platform.pin_message(t.message).await;
        self.finish(
            msg,
            "pin",
            result,
            Outcome {
                success: texts::pinned(&mention(t.user), &mention(admin)),
                target_is_admin: None,
                failed: texts::PIN_FAILED,
            },
        )
        .await;
    }

    async fn unpin(&self, msg: &IncomingMessage, admin: &Actor, message_id: Option<MessageId>) {
        let result = self.platform.unpin_message(msg.chat.id, message_id).await;
        self.finish(
            msg,
            "unpin",
            result,
            Outcome {
                success: texts::unpinned(&mention(admin)),
                target_is_admin: None,
                failed: texts::UNPIN_FAILED,
            },
        )
        .await;
    }

    async fn unpin_all(&self, msg: &IncomingMessage, admin: &Actor) {
        let result = self.platform.unpin_all(msg.chat.id).await;
        self.finish(
            msg,
            "unpin_all",
            result,
            Outcome {
                success: texts::unpinned_all(&mention(admin)),
                target_is_admin: None,
                failed: texts::UNPIN_ALL_FAILED,
            },
        )
        .await;
    }

    async fn report(&self, msg: &IncomingMessage, reporter: &Actor, t: Target<'_>) {
        if t.user.id == reporter.id {
            self.reply(msg, texts::REPORT_SELF).await;
            return;
        }
        if self.gate.is_user_admin(msg.chat.id, t.user.id).await {
            self.reply(msg, texts::REPORT_ADMIN).await;
            return;
        }

        let result = self.broadcast_report(msg, t.user).await;
        match result {
            Ok(()) => self.reply(msg, texts::REPORT_SENT).await,
            Err(e) => {
                tracing::error!(chat_id = msg.chat.id.0, "report failed: {e}");
                self.reply(msg, texts::REPORT_FAILED).await;
            }
        }
    }

    async fn broadcast_report(&self, msg: &IncomingMessage, reported: &Actor) -> Result<()> {
        let admins = self.platform.administrators(msg.chat.id).await?;
        let mentions = admins
            .iter()
            .filter(|a| !a.user.is_bot)
            .map(|a| silent_mention(a.user.id))
            .collect::<String>();
        self.platform
            .send_html(msg.chat.id, &texts::report_broadcast(&mentions, &mention(reported)))
            .await?;
        Ok(())
    }

    async fn list_admins(&self, msg: &IncomingMessage) {
        match self.platform.administrators(msg.chat.id).await {
            Ok(admins) => {
                let lines = admins
                    .iter()
                    .map(|a| {
                        let role = if a.status == MemberStatus::Owner {
                            "creator"
                        } else {
                            "admin"
                        };
                        format!("{} - {role}", escape_html(&a.user.full_name))
                    })
                    .collect::<Vec<_>>();
                self.reply(msg, &texts::admin_list(&lines)).await;
            }
            Err(e) => {
                tracing::error!(chat_id = msg.chat.id.0, "listing admins failed: {e}");
                self.reply(msg, texts::ADMINS_FAILED).await;
            }
        }
    }

    async fn finish(
        &self,
        msg: &IncomingMessage,
        op: &str,
        result: Result<()>,
        outcome: Outcome<'_>,
    ) {
        match result {
            Ok(()) => self.reply(msg, &outcome.success).await,
            Err(e) => match outcome.target_is_admin {
                Some(text) if e.is_target_admin() => self.reply(msg, text).await,
                _ => {
                    tracing::error!(chat_id = msg.chat.id.0, op, "platform call failed: {e}");
                    self.reply(msg, outcome.failed).await;
                }
            },
        }
    }

    async fn reply(&self, msg: &IncomingMessage, html: &str) {
        if let Err(e) = self.platform.reply_html(msg.message_ref(), html).await {
            tracing::warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
        }
    }
}
