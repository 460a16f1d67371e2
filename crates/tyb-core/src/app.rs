//! Inbound message routing: classify each message by shape and hand it to
//! exactly one component.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    clip::ClipExtractor,
    commands::{parse_command, Command},
    config::Config,
    cooldown::{Cooldown, InFlight, FETCH_COOLDOWN},
    domain::{Actor, AudioAttachment, BotIdentity, Content, IncomingMessage, MembershipChange},
    gate::PermissionGate,
    general::GeneralCommands,
    links::{find_video_link, VideoLink},
    moderation::ModerationExecutor,
    platform::ChatPlatform,
    ports::{AudioTool, ChatModel, VideoFetcher},
    relay::FetchRelay,
    texts,
};

/// External tool adapters the components run on.
pub struct Tools {
    pub fetcher: Arc<dyn VideoFetcher>,
    pub audio: Arc<dyn AudioTool>,
    pub chat_model: Option<Arc<dyn ChatModel>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Command(Command),
    VideoLink(VideoLink),
    Audio(&'a AudioAttachment),
    NewMembers(&'a [Actor]),
    MemberLeft(&'a Actor),
    Ignore,
}

impl Route<'_> {
    /// Routes that fetch, encode, or upload media.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Route::VideoLink(_) | Route::Audio(_) | Route::Command(Command::From(_))
        )
    }
}

pub struct App {
    bot: BotIdentity,
    platform: Arc<dyn ChatPlatform>,
    gate: Arc<PermissionGate>,
    moderation: ModerationExecutor,
    relay: FetchRelay,
    clips: ClipExtractor,
    general: GeneralCommands,
    started_at: DateTime<Utc>,
}

impl App {
    pub fn new(
        cfg: &Config,
        platform: Arc<dyn ChatPlatform>,
        tools: Tools,
        bot: BotIdentity,
    ) -> Self {
        let gate = Arc::new(PermissionGate::new(
            cfg.allowed_chat_ids.iter().copied(),
            platform.clone(),
        ));
        let in_flight = InFlight::default();

        Self {
            moderation: ModerationExecutor::new(platform.clone(), gate.clone(), bot.clone()),
            relay: FetchRelay::new(
                platform.clone(),
                tools.fetcher,
                cfg.download_dir.clone(),
                bot.username.clone(),
                Cooldown::new(FETCH_COOLDOWN, cfg.state_capacity),
                in_flight.clone(),
            ),
            clips: ClipExtractor::new(
                platform.clone(),
                tools.audio,
                cfg.download_dir.clone(),
                cfg.state_capacity,
                in_flight,
            ),
            general: GeneralCommands::new(
                platform.clone(),
                gate.clone(),
                tools.chat_model,
                bot.clone(),
            ),
            bot,
            platform,
            gate,
            started_at: Utc::now(),
        }
    }

    /// Messages dated before this instant are dropped.
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    pub fn route<'a>(&self, msg: &'a IncomingMessage) -> Route<'a> {
        // Message dates have whole-second resolution.
        if msg.date.timestamp() < self.started_at.timestamp() {
            return Route::Ignore;
        }

        match &msg.content {
            Content::Text(text) => {
                if let Some(cmd) = parse_command(text, &self.bot.username) {
                    Route::Command(cmd)
                } else if let Some(link) = find_video_link(text) {
                    Route::VideoLink(link)
                } else {
                    Route::Ignore
                }
            }
            Content::Audio(audio) if self.gate.is_allowed_group(msg.chat.id) => Route::Audio(audio),
            Content::NewMembers(members) => Route::NewMembers(members),
            Content::MemberLeft(member) => Route::MemberLeft(member),
            Content::Audio(_) | Content::Other => Route::Ignore,
        }
    }

    pub async fn dispatch(&self, msg: &IncomingMessage) {
        match self.route(msg) {
            Route::Command(cmd) => self.run_command(msg, cmd).await,
            Route::VideoLink(link) => self.relay.handle(msg, &link).await,
            Route::Audio(audio) => self.clips.from_attachment(msg, audio).await,
            Route::NewMembers(members) => self.general.new_members(msg, members).await,
            Route::MemberLeft(member) => self.general.member_left(msg, member).await,
            Route::Ignore => {}
        }
    }

    pub fn on_membership_change(&self, change: &MembershipChange) {
        self.general.membership_changed(change);
    }

    async fn run_command(&self, msg: &IncomingMessage, cmd: Command) {
        tracing::debug!(chat_id = msg.chat.id.0, ?cmd, "command");
        match cmd {
            Command::Start => self.general.start(msg).await,
            Command::Help => self.general.help(msg).await,
            Command::Info => self.general.info(msg).await,
            Command::ChatInfo => self.general.chat_info(msg).await,
            Command::Chat(prompt) => self.general.chat(msg, &prompt).await,
            Command::From(arg) => {
                if self.gate.is_allowed_group(msg.chat.id) {
                    self.clips.from_command(msg, &arg).await;
                } else if let Err(e) = self
                    .platform
                    .reply_html(msg.message_ref(), texts::NOT_OUR_GROUP)
                    .await
                {
                    tracing::warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
                }
            }
            Command::Moderation(cmd) => self.moderation.execute(msg, cmd).await,
        }
    }
}
