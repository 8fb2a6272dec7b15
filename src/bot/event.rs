//! Events that can occur in a conversation

use crate::activity::{Activity, ActivityKind, ADAPTIVE_CARD_ACTION_INVOKE};
use serde_json::Value;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// The transport reached Online
    Online,
    /// The host posted an activity
    Inbound(Activity),
}

/// What an inbound activity asks the bot to do
#[derive(Debug, Clone, PartialEq)]
pub enum InboundIntent {
    /// `adaptiveCard/action` invoke; carries the action's data
    CardInvoke(Value),
    /// Message with a value and no text, as posted by a submit click
    SubmitValue(Value),
    /// Message with text only
    Text(String),
    /// Anything else; the reason is for diagnostics only
    Unrecognized(String),
}

impl InboundIntent {
    pub fn classify(activity: &Activity) -> Self {
        match &activity.kind {
            ActivityKind::Invoke(invoke) if invoke.name == ADAPTIVE_CARD_ACTION_INVOKE => {
                match invoke
                    .value
                    .as_ref()
                    .and_then(|value| value.get("action"))
                    .and_then(|action| action.get("data"))
                {
                    Some(data) => InboundIntent::CardInvoke(data.clone()),
                    None => InboundIntent::Unrecognized(
                        "card action invoke without action data".to_string(),
                    ),
                }
            }
            ActivityKind::Invoke(invoke) => {
                InboundIntent::Unrecognized(format!("unhandled invoke: {}", invoke.name))
            }
            ActivityKind::Message(message) => match (&message.text, &message.value) {
                (None, Some(value)) => InboundIntent::SubmitValue(value.clone()),
                (Some(text), None) => InboundIntent::Text(text.clone()),
                (Some(_), Some(_)) => {
                    InboundIntent::Unrecognized("message with both text and value".to_string())
                }
                (None, None) => {
                    InboundIntent::Unrecognized("message without text or value".to_string())
                }
            },
        }
    }
}
