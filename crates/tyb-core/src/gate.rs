use std::{collections::HashSet, sync::Arc};

use crate::{
    domain::{ChatId, UserId},
    platform::ChatPlatform,
};

/// Decides where privileged commands run and who may issue them.
pub struct PermissionGate {
    allowed_chats: HashSet<ChatId>,
    platform: Arc<dyn ChatPlatform>,
}

impl PermissionGate {
    pub fn new(
        allowed_chats: impl IntoIterator<Item = i64>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            allowed_chats: allowed_chats.into_iter().map(ChatId).collect(),
            platform,
        }
    }

    pub fn is_allowed_group(&self, chat_id: ChatId) -> bool {
        self.allowed_chats.contains(&chat_id)
    }

    /// True iff the user is an administrator or the owner of the chat.
    ///
    /// Fails closed: a failed lookup is logged and treated as "not admin".
    pub async fn is_user_admin(&self, chat_id: ChatId, user_id: UserId) -> bool {
        match self.platform.member_status(chat_id, user_id).await {
            Ok(status) => status.is_privileged(),
            Err(e) => {
                tracing::error!(
                    chat_id = chat_id.0,
                    user_id = user_id.0,
                    "admin status check failed: {e}"
                );
                false
            }
        }
    }
}
