//! Host-side card renderer click routing
//!
//! Models the chat UI's Adaptive Card renderer: it only knows how to route
//! `Action.Submit`. Clicks on `Action.Execute` are discarded before the
//! card-click pipeline runs.

use crate::activity::{Activity, ActivityId, Attachment, CardAction, ChannelAccount};
use crate::broadcast::StreamReader;
use crate::channel::ActivityChannel;
use crate::pipeline::CardClick;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RendererError {
    #[error("activity has no attachment at index {0}")]
    NoSuchAttachment(usize),
    #[error("attachment {0} is not an adaptive card")]
    NotACard(usize),
    #[error("card has no action at index {0}")]
    NoSuchAction(usize),
}

/// What happened to a click
pub enum ClickOutcome {
    /// The renderer posted the action's data; the stream acknowledges it
    Posted(StreamReader<ActivityId>),
    /// The click interceptor stopped the default handling
    Intercepted,
    /// The renderer does not route this action type
    Discarded { action_type: &'static str },
}

impl std::fmt::Debug for ClickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickOutcome::Posted(ack) => f
                .debug_tuple("Posted")
                .field(&ack.last())
                .finish(),
            ClickOutcome::Intercepted => f.write_str("Intercepted"),
            ClickOutcome::Discarded { action_type } => f
                .debug_struct("Discarded")
                .field("action_type", action_type)
                .finish(),
        }
    }
}

/// Renderer bound to one channel, posting as `user`
pub struct CardRenderer<'a> {
    channel: &'a ActivityChannel,
    user: ChannelAccount,
}

impl<'a> CardRenderer<'a> {
    pub fn new(channel: &'a ActivityChannel, user: ChannelAccount) -> Self {
        Self { channel, user }
    }

    /// Click button `action` on the card in attachment `attachment`.
    pub fn click(
        &self,
        activity: &Activity,
        attachment: usize,
        action: usize,
    ) -> Result<ClickOutcome, RendererError> {
        let card = match activity.attachments().get(attachment) {
            Some(Attachment::AdaptiveCard(card)) => card,
            Some(Attachment::Other { .. }) => return Err(RendererError::NotACard(attachment)),
            None => return Err(RendererError::NoSuchAttachment(attachment)),
        };
        let action = card
            .actions
            .get(action)
            .ok_or(RendererError::NoSuchAction(action))?;

        let submit = match action {
            CardAction::Submit(submit) => submit,
            CardAction::Execute(_) => {
                tracing::warn!(
                    conversation_id = %self.channel.conversation_id(),
                    title = action.title(),
                    action_type = action.type_name(),
                    "Renderer ignored click on unsupported action type"
                );
                return Ok(ClickOutcome::Discarded {
                    action_type: action.type_name(),
                });
            }
        };

        let click = CardClick {
            action_type: action.type_name().to_string(),
            title: submit.title.clone(),
            verb: None,
            data: submit.data.clone(),
        };
        let mut posted = None;
        self.channel.click_pipeline().dispatch(&click, |click| {
            let value = click.data.clone().unwrap_or_else(|| json!({}));
            posted = Some(self.channel.send(Activity::value(self.user.clone(), value)));
        });

        Ok(match posted {
            Some(ack) => ClickOutcome::Posted(ack),
            None => {
                tracing::debug!(title = %click.title, "Card click stopped by interceptor");
                ClickOutcome::Intercepted
            }
        })
    }
}
