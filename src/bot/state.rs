//! Conversation state types

use crate::activity::{CardVariant, ChannelAccount};
use serde::{Deserialize, Serialize};

/// Mutable conversation state, owned by a single channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BotState {
    /// Set by the first consent response; cleared only by a reset command
    pub answered: bool,
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct BotContext {
    pub variant: CardVariant,
    /// Account the bot's replies are sent from
    pub account: ChannelAccount,
}

impl BotContext {
    pub fn new(variant: CardVariant) -> Self {
        Self {
            variant,
            account: ChannelAccount::bot("calendar-bot", "Calendar Bot"),
        }
    }
}
