//! Telegram update handlers: convert the update and hand it to the core app.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatMemberUpdated, Message},
};

use crate::router::AppState;

pub mod convert;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = convert::incoming(&msg);

    // Fetches and clips run for minutes; keep them off the chat's update queue.
    if state.app.route(&incoming).is_media() {
        let app = state.app.clone();
        tokio::spawn(async move {
            app.dispatch(&incoming).await;
        });
        return Ok(());
    }

    state.app.dispatch(&incoming).await;
    Ok(())
}

pub async fn handle_my_chat_member(
    update: ChatMemberUpdated,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    state
        .app
        .on_membership_change(&convert::membership_change(&update));
    Ok(())
}
