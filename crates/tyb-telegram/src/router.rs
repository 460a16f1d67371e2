use std::sync::Arc;

use chrono::Utc;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tyb_core::{
    app::{App, Tools},
    config::Config,
    domain::{BotIdentity, UserId},
    platform::ChatPlatform,
};

use crate::handlers;
use crate::TelegramPlatform;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

pub async fn run_polling(cfg: Arc<Config>, tools: Tools) -> anyhow::Result<()> {
    // Uploads of large videos need far more than the default request timeout.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(cfg.upload_timeout)
        .build()?;
    let bot = Bot::with_client(cfg.telegram_bot_token.clone(), client);

    let me = bot.get_me().await?;
    let identity = BotIdentity {
        id: UserId(me.id.0 as i64),
        username: me.username().to_string(),
    };
    tracing::info!(
        username = %identity.username,
        allowed_chats = ?cfg.allowed_chat_ids,
        download_dir = %cfg.download_dir.display(),
        "tyb started"
    );

    let platform: Arc<dyn ChatPlatform> = Arc::new(TelegramPlatform::new(bot.clone()));
    let app = App::new(&cfg, platform, tools, identity).with_start_time(Utc::now());
    let state = Arc::new(AppState { app: Arc::new(app) });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_my_chat_member().endpoint(handlers::handle_my_chat_member));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("tyb stopped");
    Ok(())
}
