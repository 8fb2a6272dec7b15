//! Adaptive Card payload types

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";

/// Adaptive Card content. The body is an opaque rendering tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveCard {
    #[serde(rename = "$schema", default = "default_schema")]
    pub schema: String,
    #[serde(rename = "type", default = "default_card_type")]
    pub card_type: String,
    pub version: String,
    #[serde(default)]
    pub body: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<CardAction>,
}

fn default_schema() -> String {
    ADAPTIVE_CARD_SCHEMA.to_string()
}

fn default_card_type() -> String {
    "AdaptiveCard".to_string()
}

impl AdaptiveCard {
    pub fn new(version: impl Into<String>, body: Vec<Value>, actions: Vec<CardAction>) -> Self {
        Self {
            schema: default_schema(),
            card_type: default_card_type(),
            version: version.into(),
            body,
            actions,
        }
    }
}

/// A button on a card. The type tag decides which click path a renderer uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CardAction {
    /// Universal action; raises an invoke on hosts that support it
    #[serde(rename = "Action.Execute")]
    Execute(ExecuteAction),
    /// Classic submit; posts a message carrying `data` as its value
    #[serde(rename = "Action.Submit")]
    Submit(SubmitAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CardAction {
    /// Wire name of the action type
    pub fn type_name(&self) -> &'static str {
        match self {
            CardAction::Execute(_) => "Action.Execute",
            CardAction::Submit(_) => "Action.Submit",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CardAction::Execute(action) => &action.title,
            CardAction::Submit(action) => &action.title,
        }
    }

    pub fn style(&self) -> Option<&str> {
        match self {
            CardAction::Execute(action) => action.style.as_deref(),
            CardAction::Submit(action) => action.style.as_deref(),
        }
    }

    pub fn verb(&self) -> Option<&str> {
        match self {
            CardAction::Execute(action) => action.verb.as_deref(),
            CardAction::Submit(_) => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            CardAction::Execute(action) => action.data.as_ref(),
            CardAction::Submit(action) => action.data.as_ref(),
        }
    }
}

/// Which action type the bot's consent card is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardVariant {
    /// `Action.Execute` buttons; the chat UI ignores clicks on these
    #[default]
    Execute,
    /// `Action.Submit` buttons; handled natively
    Submit,
}

impl std::str::FromStr for CardVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "execute" | "action.execute" => Ok(CardVariant::Execute),
            "submit" | "action.submit" => Ok(CardVariant::Submit),
            other => Err(format!("unknown card variant: {other}")),
        }
    }
}
