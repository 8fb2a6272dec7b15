//! Scripted conversation engine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The channel executes the returned effects on its scheduler.

mod effect;
pub mod event;
pub mod script;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Reply};
pub use event::{BotEvent, InboundIntent};
pub use state::{BotContext, BotState};
pub use transition::{transition, TransitionResult};
