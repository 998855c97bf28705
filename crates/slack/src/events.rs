//! Events API payloads and their normalisation into [`ChatEvent`]s.

use serde::Deserialize;

use orchestrator::{ChannelId, MessageTs, UserId};

/// Outer body of a request to the Events API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Endpoint ownership check; the challenge is echoed back.
    UrlVerification { challenge: String },
    EventCallback {
        #[serde(default)]
        event_id: Option<String>,
        event: SlackEvent,
    },
    #[serde(other)]
    Unsupported,
}

/// The inner `event` object, reduced to the fields the bridge reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEventKind {
    /// `@bot` in a channel.
    Mention,
    /// A user's message in a direct-message conversation with the bot.
    DirectMessage,
}

/// A chat message the bridge acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub kind: ChatEventKind,
    pub user: UserId,
    pub channel: ChannelId,
    pub ts: MessageTs,
    pub text: String,
}

/// Turns a raw event into a [`ChatEvent`], or `None` when the bridge should
/// ignore it: other event types, edits and other subtypes, messages from bots
/// (including this one), and events without a user, channel or timestamp.
pub fn normalize_event(event: &SlackEvent, bot_user_id: &UserId) -> Option<ChatEvent> {
    let kind = match event.kind.as_str() {
        "app_mention" => ChatEventKind::Mention,
        "message"
            if event.channel_type.as_deref() == Some("im") && event.subtype.is_none() =>
        {
            ChatEventKind::DirectMessage
        }
        _ => return None,
    };
    if event.bot_id.is_some() || event.subtype.as_deref() == Some("bot_message") {
        return None;
    }

    let user = event.user.clone().and_then(UserId::new)?;
    if &user == bot_user_id {
        return None;
    }
    let channel = event.channel.clone().and_then(ChannelId::new)?;
    let ts = event.ts.clone().and_then(MessageTs::new)?;

    Some(ChatEvent {
        kind,
        user,
        channel,
        ts,
        text: event.text.clone().unwrap_or_default(),
    })
}

/// Removes every `<@BOT>` token from a mention and trims the rest.
pub fn strip_bot_mention(text: &str, bot_user_id: &UserId) -> String {
    let token = format!("<@{}>", bot_user_id.as_str());
    text.replace(&token, "").trim().to_string()
}
