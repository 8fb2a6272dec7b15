//! Activity model exchanged between the chat UI and the bot
//!
//! Serialises to the Direct Line JSON shape (`"type": "message"`, camelCase
//! fields). Attachment content is parsed when the activity is built, so an
//! Adaptive Card attachment always carries a typed [`AdaptiveCard`].

mod card;

pub use card::{AdaptiveCard, CardAction, CardVariant, ExecuteAction, SubmitAction};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// Invoke name used when a host executes an `Action.Execute` button
pub const ADAPTIVE_CARD_ACTION_INVOKE: &str = "adaptiveCard/action";

/// Channel-scoped activity identifier; strictly increasing within a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:07}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// Sender descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
}

impl ChannelAccount {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role: Role::User,
        }
    }

    pub fn bot(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            role: Role::Bot,
        }
    }
}

/// A structured message unit. `id` and `timestamp` are assigned by the
/// channel; activities built by the host leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub from: ChannelAccount,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Message(MessageActivity),
    Invoke(InvokeActivity),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeActivity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Activity {
    fn new(from: ChannelAccount, kind: ActivityKind) -> Self {
        Self {
            id: None,
            timestamp: None,
            from,
            kind,
        }
    }

    /// Plain text message
    pub fn text(from: ChannelAccount, text: impl Into<String>) -> Self {
        Self::new(
            from,
            ActivityKind::Message(MessageActivity {
                text: Some(text.into()),
                ..MessageActivity::default()
            }),
        )
    }

    /// Message carrying a structured value and no text (what a submit click posts)
    pub fn value(from: ChannelAccount, value: Value) -> Self {
        Self::new(
            from,
            ActivityKind::Message(MessageActivity {
                value: Some(value),
                ..MessageActivity::default()
            }),
        )
    }

    /// Message carrying a single Adaptive Card attachment
    pub fn card(from: ChannelAccount, card: AdaptiveCard) -> Self {
        Self::new(
            from,
            ActivityKind::Message(MessageActivity {
                attachments: vec![Attachment::AdaptiveCard(card)],
                ..MessageActivity::default()
            }),
        )
    }

    pub fn invoke(from: ChannelAccount, name: impl Into<String>, value: Option<Value>) -> Self {
        Self::new(
            from,
            ActivityKind::Invoke(InvokeActivity {
                name: name.into(),
                value,
            }),
        )
    }

    pub fn as_message(&self) -> Option<&MessageActivity> {
        match &self.kind {
            ActivityKind::Message(message) => Some(message),
            ActivityKind::Invoke(_) => None,
        }
    }

    /// Wire name of the activity kind
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ActivityKind::Message(_) => "message",
            ActivityKind::Invoke(_) => "invoke",
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        match &self.kind {
            ActivityKind::Message(message) => &message.attachments,
            ActivityKind::Invoke(_) => &[],
        }
    }

    /// Adaptive Cards among the attachments, in order, for in-place editing
    pub fn adaptive_cards_mut(&mut self) -> impl Iterator<Item = &mut AdaptiveCard> {
        let attachments: &mut [Attachment] = match &mut self.kind {
            ActivityKind::Message(message) => &mut message.attachments,
            ActivityKind::Invoke(_) => &mut [],
        };
        attachments.iter_mut().filter_map(|attachment| match attachment {
            Attachment::AdaptiveCard(card) => Some(card),
            Attachment::Other { .. } => None,
        })
    }
}

// ============================================================================
// Attachments
// ============================================================================

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("invalid adaptive card content: {0}")]
    InvalidCard(#[from] serde_json::Error),
}

/// Attachment wire shape
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttachment {
    content_type: String,
    #[serde(default)]
    content: Value,
}

/// Activity attachment, parsed by content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAttachment", into = "RawAttachment")]
pub enum Attachment {
    AdaptiveCard(AdaptiveCard),
    Other { content_type: String, content: Value },
}

impl Attachment {
    pub fn content_type(&self) -> &str {
        match self {
            Attachment::AdaptiveCard(_) => ADAPTIVE_CARD_CONTENT_TYPE,
            Attachment::Other { content_type, .. } => content_type,
        }
    }
}

impl TryFrom<RawAttachment> for Attachment {
    type Error = AttachmentError;

    fn try_from(raw: RawAttachment) -> Result<Self, Self::Error> {
        if raw.content_type == ADAPTIVE_CARD_CONTENT_TYPE {
            Ok(Attachment::AdaptiveCard(serde_json::from_value(raw.content)?))
        } else {
            Ok(Attachment::Other {
                content_type: raw.content_type,
                content: raw.content,
            })
        }
    }
}

impl From<Attachment> for RawAttachment {
    fn from(attachment: Attachment) -> Self {
        match attachment {
            Attachment::AdaptiveCard(card) => RawAttachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
                content: serde_json::to_value(card).unwrap_or(Value::Null),
            },
            Attachment::Other {
                content_type,
                content,
            } => RawAttachment {
                content_type,
                content,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> ChannelAccount {
        ChannelAccount::user("user-1")
    }

    #[test]
    fn test_message_serialises_direct_line_shape() {
        let mut activity = Activity::text(user(), "hello");
        activity.id = Some(ActivityId(3));

        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({
                "id": 3,
                "from": {"id": "user-1", "role": "user"},
                "type": "message",
                "text": "hello"
            })
        );
    }

    #[test]
    fn test_invoke_round_trips_kind() {
        let raw = json!({
            "from": {"id": "user-1", "role": "user"},
            "type": "invoke",
            "name": "adaptiveCard/action",
            "value": {"action": {"type": "Action.Execute", "data": {"action": "Allow"}}}
        });

        let activity: Activity = serde_json::from_value(raw).unwrap();

        assert_eq!(activity.kind_name(), "invoke");
        assert!(activity.as_message().is_none());
        assert!(activity.attachments().is_empty());
        match &activity.kind {
            ActivityKind::Invoke(invoke) => assert_eq!(invoke.name, ADAPTIVE_CARD_ACTION_INVOKE),
            ActivityKind::Message(_) => panic!("expected invoke"),
        }
    }

    #[test]
    fn test_adaptive_attachment_parsed_at_construction() {
        let raw = json!({
            "from": {"id": "bot", "name": "Bot", "role": "bot"},
            "type": "message",
            "attachments": [
                {"contentType": ADAPTIVE_CARD_CONTENT_TYPE, "content": {
                    "type": "AdaptiveCard", "version": "1.4",
                    "actions": [{"type": "Action.Execute", "title": "Allow", "verb": "consent"}]
                }},
                {"contentType": "image/png", "content": {"url": "x.png"}}
            ]
        });

        let mut activity: Activity = serde_json::from_value(raw).unwrap();

        assert_eq!(activity.attachments()[1].content_type(), "image/png");
        let cards: Vec<_> = activity.adaptive_cards_mut().collect();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].actions[0].verb(), Some("consent"));
    }

    #[test]
    fn test_malformed_card_is_rejected() {
        let raw = json!({
            "from": {"id": "bot", "role": "bot"},
            "type": "message",
            "attachments": [{"contentType": ADAPTIVE_CARD_CONTENT_TYPE, "content": {"body": 3}}]
        });

        assert!(serde_json::from_value::<Activity>(raw).is_err());
    }

    #[test]
    fn test_activity_id_display_is_padded() {
        assert_eq!(ActivityId(42).to_string(), "0000042");
        assert!(ActivityId(2) > ActivityId(1));
    }
}
