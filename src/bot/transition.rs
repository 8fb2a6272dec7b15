//! Pure state transition function

use super::event::InboundIntent;
use super::script::{
    self, ALREADY_ANSWERED_TEXT, AVAILABILITY_TEXT, CARD_DELAY, CONFIRMATION_TEXT, DENIED_TEXT,
    LISTING_DELAY, RESET_DELAY, WAITING_TEXT, WELCOME_DELAY, WELCOME_TEXT,
};
use super::{BotContext, BotEvent, BotState, Effect};
use serde_json::Value;
use std::time::Duration;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: BotState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: BotState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function
///
/// Every event yields a result: anomalies become scripted replies or
/// diagnostics, never errors.
pub fn transition(state: &BotState, context: &BotContext, event: BotEvent) -> TransitionResult {
    match event {
        BotEvent::Online => {
            TransitionResult::new(*state).with_effects(welcome_sequence(context, Duration::ZERO))
        }

        BotEvent::Inbound(activity) => match InboundIntent::classify(&activity) {
            InboundIntent::CardInvoke(data) | InboundIntent::SubmitValue(data) => {
                consent_response(state, &data)
            }

            InboundIntent::Text(text) if script::is_reset_command(&text) => {
                TransitionResult::new(BotState { answered: false })
                    .with_effects(welcome_sequence(context, RESET_DELAY))
            }

            InboundIntent::Text(_) => {
                TransitionResult::new(*state).with_effect(Effect::text(Duration::ZERO, WAITING_TEXT))
            }

            InboundIntent::Unrecognized(reason) => {
                TransitionResult::new(*state).with_effect(Effect::diagnostic(reason))
            }
        },
    }
}

/// Welcome text followed by the consent card, starting `start` from now
fn welcome_sequence(context: &BotContext, start: Duration) -> [Effect; 2] {
    let welcome_at = start + WELCOME_DELAY;
    [
        Effect::text(welcome_at, WELCOME_TEXT),
        Effect::card(welcome_at + CARD_DELAY, script::consent_card(context.variant)),
    ]
}

/// Single-shot consent handling. `answered` is set before branching, so an
/// unrecognized action still consumes the response.
fn consent_response(state: &BotState, data: &Value) -> TransitionResult {
    if state.answered {
        return TransitionResult::new(*state)
            .with_effect(Effect::text(Duration::ZERO, ALREADY_ANSWERED_TEXT));
    }

    let answered = TransitionResult::new(BotState { answered: true });
    match data.get("action") {
        Some(Value::String(action)) if action == "Allow" => answered
            .with_effect(Effect::text(Duration::ZERO, CONFIRMATION_TEXT))
            .with_effect(Effect::text(LISTING_DELAY, AVAILABILITY_TEXT)),
        Some(Value::String(action)) if action == "Deny" => {
            answered.with_effect(Effect::text(Duration::ZERO, DENIED_TEXT))
        }
        other => answered.with_effect(Effect::text(
            Duration::ZERO,
            script::unexpected_action_text(&describe_action(other)),
        )),
    }
}

fn describe_action(action: Option<&Value>) -> String {
    match action {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "(none)".to_string(),
    }
}
