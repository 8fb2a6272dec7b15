//! Effects produced by state transitions

use crate::activity::AdaptiveCard;
use std::time::Duration;

/// What the bot says
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Card(AdaptiveCard),
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Emit a bot activity once `after` has elapsed from the triggering event
    Reply { after: Duration, reply: Reply },

    /// Observability only; never reaches the activity stream
    Diagnostic { reason: String },
}

impl Effect {
    pub fn text(after: Duration, text: impl Into<String>) -> Self {
        Effect::Reply {
            after,
            reply: Reply::Text(text.into()),
        }
    }

    pub fn card(after: Duration, card: AdaptiveCard) -> Self {
        Effect::Reply {
            after,
            reply: Reply::Card(card),
        }
    }

    pub fn diagnostic(reason: impl Into<String>) -> Self {
        Effect::Diagnostic {
            reason: reason.into(),
        }
    }

    /// Text of a text reply, if this is one
    #[allow(dead_code)] // Used by tests
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Effect::Reply {
                reply: Reply::Text(text),
                ..
            } => Some(text),
            _ => None,
        }
    }
}
