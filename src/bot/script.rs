//! Fixed conversation copy and card content

use crate::activity::{AdaptiveCard, CardAction, CardVariant, ExecuteAction, SubmitAction};
use serde_json::{json, Value};
use std::time::Duration;

/// Delay from Online (or from a reset) to the welcome text
pub const WELCOME_DELAY: Duration = Duration::from_millis(300);

/// Delay from the welcome text to the consent card
pub const CARD_DELAY: Duration = Duration::from_millis(700);

/// Delay before a reset replays the welcome sequence
pub const RESET_DELAY: Duration = Duration::from_millis(200);

/// Delay from the Allow confirmation to the availability listing
pub const LISTING_DELAY: Duration = Duration::from_millis(1200);

pub const CARD_VERSION: &str = "1.4";

/// Verb carried by `Action.Execute` buttons
pub const CONSENT_VERB: &str = "calendarConsent";

pub const WELCOME_TEXT: &str =
    "Hi! I can check your calendar and find a free slot for the team sync.";

pub const CONFIRMATION_TEXT: &str = "Thanks! Checking your calendar now...";

pub const DENIED_TEXT: &str =
    "No problem, I won't access your calendar. Type \"reset\" if you change your mind.";

pub const ALREADY_ANSWERED_TEXT: &str =
    "You've already responded to this request. Type \"reset\" to start again.";

pub const WAITING_TEXT: &str =
    "I'm waiting for your response on the card above. Type \"reset\" to see it again.";

pub const AVAILABILITY_TEXT: &str = "Here's your availability for tomorrow:\n\
     - 09:00 - 10:00  Free\n\
     - 10:00 - 11:30  Design review\n\
     - 11:30 - 13:00  Free\n\
     - 13:00 - 14:00  Lunch\n\
     - 14:00 - 16:00  Free\n\
     The first free slot is 09:00.";

pub fn unexpected_action_text(action: &str) -> String {
    format!("Received an unexpected action: {action}")
}

/// Words that restart the conversation (case-insensitive substring match)
pub fn is_reset_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("reset") || lower.contains("again")
}

/// Consent card with Allow / Deny buttons of the configured action type
pub fn consent_card(variant: CardVariant) -> AdaptiveCard {
    let body = vec![
        json!({
            "type": "TextBlock",
            "text": "Calendar access",
            "weight": "Bolder",
            "size": "Medium"
        }),
        json!({
            "type": "TextBlock",
            "text": "Allow Calendar Bot to read your free/busy information?",
            "wrap": true
        }),
    ];
    let actions = vec![
        consent_action(variant, "Allow", "positive", json!({ "action": "Allow" })),
        consent_action(variant, "Deny", "destructive", json!({ "action": "Deny" })),
    ];
    AdaptiveCard::new(CARD_VERSION, body, actions)
}

fn consent_action(variant: CardVariant, title: &str, style: &str, data: Value) -> CardAction {
    match variant {
        CardVariant::Execute => CardAction::Execute(ExecuteAction {
            title: title.to_string(),
            style: Some(style.to_string()),
            verb: Some(CONSENT_VERB.to_string()),
            data: Some(data),
        }),
        CardVariant::Submit => CardAction::Submit(SubmitAction {
            title: title.to_string(),
            style: Some(style.to_string()),
            data: Some(data),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_detection() {
        assert!(is_reset_command("RESET"));
        assert!(is_reset_command("show me that card again please"));
        assert!(!is_reset_command("hello"));
    }

    #[test]
    fn test_card_uses_variant_action_type() {
        let execute = consent_card(CardVariant::Execute);
        let submit = consent_card(CardVariant::Submit);

        assert!(execute.actions.iter().all(|a| a.type_name() == "Action.Execute"));
        assert!(submit.actions.iter().all(|a| a.type_name() == "Action.Submit"));
        assert_eq!(execute.actions[0].verb(), Some(CONSENT_VERB));
        assert_eq!(execute.actions[1].data(), submit.actions[1].data());
    }
}
