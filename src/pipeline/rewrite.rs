//! `Action.Execute` -> `Action.Submit` rewrite
//!
//! The chat UI's renderer drops `Action.Execute` clicks before any click
//! interceptor sees them, so the fix has to change the card itself while
//! the activity is still in flight to the host.

use super::{ActivityInterceptor, DispatchContext, Direction, Next};
use crate::activity::{Activity, AdaptiveCard, CardAction, ExecuteAction, SubmitAction};

/// Convert every `Action.Execute` on the card to `Action.Submit` in place.
/// Title, style and data are kept; the verb has no Submit equivalent and is
/// dropped. Returns the number of actions converted.
pub fn rewrite_card(card: &mut AdaptiveCard) -> usize {
    let mut converted = 0;
    for action in &mut card.actions {
        if let CardAction::Execute(ExecuteAction {
            title, style, data, ..
        }) = action
        {
            *action = CardAction::Submit(SubmitAction {
                title: std::mem::take(title),
                style: style.take(),
                data: data.take(),
            });
            converted += 1;
        }
    }
    converted
}

/// Activity interceptor applying [`rewrite_card`] to incoming activities
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionRewrite;

impl ActivityInterceptor for ActionRewrite {
    fn name(&self) -> &str {
        "action-rewrite"
    }

    fn handle(&self, ctx: &DispatchContext, mut activity: Activity, next: Next<'_>) {
        if ctx.direction == Direction::Incoming {
            let converted: usize = activity.adaptive_cards_mut().map(rewrite_card).sum();
            if converted > 0 {
                tracing::info!(
                    conversation_id = %ctx.conversation_id,
                    converted,
                    "Rewrote Action.Execute buttons to Action.Submit"
                );
            }
        }
        next.run(activity);
    }
}
