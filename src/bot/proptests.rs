//! Property-based tests for the conversation engine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::script::{ALREADY_ANSWERED_TEXT, WAITING_TEXT};
use super::*;
use crate::activity::{Activity, CardVariant, ChannelAccount, ADAPTIVE_CARD_ACTION_INVOKE};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> BotContext {
    BotContext::new(CardVariant::Execute)
}

fn user() -> ChannelAccount {
    ChannelAccount::user("prop-user")
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_action() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Allow".to_string()),
        Just("Deny".to_string()),
        "[A-Za-z]{1,10}",
    ]
}

fn arb_consent_event() -> impl Strategy<Value = BotEvent> {
    (arb_action(), any::<bool>()).prop_map(|(action, via_invoke)| {
        let activity = if via_invoke {
            Activity::invoke(
                user(),
                ADAPTIVE_CARD_ACTION_INVOKE,
                Some(json!({ "action": { "type": "Action.Execute", "data": { "action": action } } })),
            )
        } else {
            Activity::value(user(), json!({ "action": action }))
        };
        BotEvent::Inbound(activity)
    })
}

fn arb_chatter_event() -> impl Strategy<Value = BotEvent> {
    "[a-z ]{0,20}"
        .prop_filter("not a reset command", |text| !script::is_reset_command(text))
        .prop_map(|text| BotEvent::Inbound(Activity::text(user(), text)))
}

fn arb_event() -> impl Strategy<Value = BotEvent> {
    prop_oneof![
        arb_consent_event(),
        arb_chatter_event(),
        Just(BotEvent::Inbound(Activity::text(user(), "reset"))),
        Just(BotEvent::Online),
    ]
}

fn is_reset(event: &BotEvent) -> bool {
    match event {
        BotEvent::Inbound(activity) => matches!(
            InboundIntent::classify(activity),
            InboundIntent::Text(text) if script::is_reset_command(&text)
        ),
        BotEvent::Online => false,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Only the first consent response after a reset produces a real answer
    #[test]
    fn prop_consent_is_single_shot(events in proptest::collection::vec(arb_event(), 0..20)) {
        let ctx = test_context();
        let mut state = BotState::default();

        for event in events {
            let reset = is_reset(&event);
            let consent = matches!(
                &event,
                BotEvent::Inbound(a) if matches!(
                    InboundIntent::classify(a),
                    InboundIntent::CardInvoke(_) | InboundIntent::SubmitValue(_)
                )
            );
            let was_answered = state.answered;
            let result = transition(&state, &ctx, event);

            if reset {
                prop_assert!(!result.new_state.answered);
            } else if consent {
                prop_assert!(result.new_state.answered);
                let already = result
                    .effects
                    .iter()
                    .any(|e| e.reply_text() == Some(ALREADY_ANSWERED_TEXT));
                prop_assert_eq!(already, was_answered);
            } else {
                prop_assert_eq!(result.new_state.answered, was_answered);
            }
            state = result.new_state;
        }
    }

    // Chatter never changes state and always gets the waiting prompt
    #[test]
    fn prop_chatter_is_stateless(answered in any::<bool>(), event in arb_chatter_event()) {
        let state = BotState { answered };
        let result = transition(&state, &test_context(), event);
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects, vec![Effect::text(std::time::Duration::ZERO, WAITING_TEXT)]);
    }

    // Every consent event yields exactly one immediate reply, plus the listing on Allow
    #[test]
    fn prop_consent_reply_counts(event in arb_consent_event()) {
        let result = transition(&BotState::default(), &test_context(), event.clone());
        let allow = match &event {
            BotEvent::Inbound(a) => matches!(
                InboundIntent::classify(a),
                InboundIntent::CardInvoke(data) | InboundIntent::SubmitValue(data)
                    if data["action"] == "Allow"
            ),
            BotEvent::Online => false,
        };
        prop_assert_eq!(result.effects.len(), if allow { 2 } else { 1 });
    }
}
