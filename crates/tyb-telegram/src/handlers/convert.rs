//! teloxide types → `tyb-core` domain types.

use teloxide::types::{Chat, ChatMemberUpdated, Message, User};

use tyb_core::domain::{
    Actor, AudioAttachment, AudioKind, ChatId, ChatInfo, ChatKind, Content, IncomingMessage,
    MembershipChange, MessageId, RepliedMessage, UserId,
};

use crate::member_status;

pub fn actor(u: &User) -> Actor {
    Actor {
        id: UserId(u.id.0 as i64),
        full_name: u.full_name(),
        username: u.username.clone(),
        language_code: u.language_code.clone(),
        is_bot: u.is_bot,
    }
}

fn chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    };
    ChatInfo {
        id: ChatId(chat.id.0),
        title: chat.title().map(str::to_string),
        kind,
    }
}

/// Music, voice note, or an `audio/mpeg` document.
fn audio_attachment(msg: &Message) -> Option<AudioAttachment> {
    if let Some(a) = msg.audio() {
        return Some(AudioAttachment {
            kind: AudioKind::Music,
            file_id: a.file.id.clone(),
            duration: Some(a.duration),
            file_name: a.file_name.clone(),
            title: a.title.clone(),
            performer: a.performer.clone(),
        });
    }
    if let Some(v) = msg.voice() {
        return Some(AudioAttachment {
            kind: AudioKind::Voice,
            file_id: v.file.id.clone(),
            duration: Some(v.duration),
            file_name: None,
            title: None,
            performer: None,
        });
    }
    let doc = msg.document()?;
    let is_mp3 = doc
        .mime_type
        .as_ref()
        .is_some_and(|m| m.essence_str() == "audio/mpeg");
    is_mp3.then(|| AudioAttachment {
        kind: AudioKind::Document,
        file_id: doc.file.id.clone(),
        duration: None,
        file_name: doc.file_name.clone(),
        title: None,
        performer: None,
    })
}

fn content(msg: &Message) -> Content {
    if let Some(text) = msg.text() {
        return Content::Text(text.to_string());
    }
    if let Some(audio) = audio_attachment(msg) {
        return Content::Audio(audio);
    }
    if let Some(members) = msg.new_chat_members() {
        return Content::NewMembers(members.iter().map(actor).collect());
    }
    if let Some(member) = msg.left_chat_member() {
        return Content::MemberLeft(actor(member));
    }
    Content::Other
}

pub fn incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat: chat_info(&msg.chat),
        message_id: MessageId(msg.id.0),
        date: msg.date,
        from: msg.from().map(actor),
        content: content(msg),
        reply_to: msg.reply_to_message().map(|r| RepliedMessage {
            message_id: MessageId(r.id.0),
            from: r.from().map(actor),
            audio: audio_attachment(r),
        }),
    }
}

pub fn membership_change(update: &ChatMemberUpdated) -> MembershipChange {
    MembershipChange {
        chat: chat_info(&update.chat),
        by: Some(actor(&update.from)),
        old_status: member_status(&update.old_chat_member.kind),
        new_status: member_status(&update.new_chat_member.kind),
    }
}
