//! Interceptor pipelines
//!
//! Two independent chain-of-responsibility pipelines:
//! - [`ActivityPipeline`] wraps every activity crossing the channel boundary,
//!   in both directions.
//! - [`ClickPipeline`] wraps only clicks the card renderer recognised and
//!   routed. Clicks the renderer discards never reach it.

mod click;
mod rewrite;

pub use click::{CardClick, CardClickInterceptor, ClickNext, ClickPipeline};
pub use rewrite::{rewrite_card, ActionRewrite};

use crate::activity::Activity;

/// Which way an activity is travelling, seen from the chat UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Bot to host; the final consumer is the activity stream
    Incoming,
    /// Host to bot; the final consumer is the conversation engine
    Outgoing,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Incoming => f.write_str("incoming"),
            Direction::Outgoing => f.write_str("outgoing"),
        }
    }
}

/// Information about the dispatch an interceptor is wrapping
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub direction: Direction,
    pub conversation_id: String,
}

/// One link in the activity chain
pub trait ActivityInterceptor {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Inspect or rewrite `activity`, then call `next.run` to continue.
    /// Returning without calling it drops the activity.
    fn handle(&self, ctx: &DispatchContext, activity: Activity, next: Next<'_>);
}

/// Continuation handed to an interceptor
pub struct Next<'a> {
    ctx: &'a DispatchContext,
    rest: &'a [Box<dyn ActivityInterceptor>],
    terminal: Box<dyn FnOnce(Activity) + 'a>,
}

impl Next<'_> {
    /// Pass the activity to the next interceptor, or the final consumer.
    pub fn run(self, activity: Activity) {
        match self.rest.split_first() {
            Some((interceptor, rest)) => {
                tracing::trace!(interceptor = interceptor.name(), direction = %self.ctx.direction, "Running interceptor");
                let ctx = self.ctx;
                interceptor.handle(
                    ctx,
                    activity,
                    Next {
                        ctx,
                        rest,
                        terminal: self.terminal,
                    },
                );
            }
            None => (self.terminal)(activity),
        }
    }
}

/// Ordered list of activity interceptors, fixed at construction
#[derive(Default)]
pub struct ActivityPipeline {
    interceptors: Vec<Box<dyn ActivityInterceptor>>,
}

impl ActivityPipeline {
    pub fn new(interceptors: Vec<Box<dyn ActivityInterceptor>>) -> Self {
        Self { interceptors }
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every interceptor in order, then hand the result to `consumer`.
    /// `consumer` is not called if an interceptor drops the activity.
    pub fn dispatch(
        &self,
        ctx: &DispatchContext,
        activity: Activity,
        consumer: impl FnOnce(Activity),
    ) {
        Next {
            ctx,
            rest: &self.interceptors,
            terminal: Box::new(consumer),
        }
        .run(activity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityKind, ChannelAccount};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Tagger {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ActivityInterceptor for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        fn handle(&self, ctx: &DispatchContext, mut activity: Activity, next: Next<'_>) {
            self.log
                .borrow_mut()
                .push(format!("{}:{}", self.tag, ctx.direction));
            if let ActivityKind::Message(message) = &mut activity.kind {
                let text = message.text.get_or_insert_with(String::new);
                text.push_str(self.tag);
            }
            next.run(activity);
        }
    }

    struct Dropper;

    impl ActivityInterceptor for Dropper {
        fn name(&self) -> &str {
            "dropper"
        }

        fn handle(&self, _ctx: &DispatchContext, _activity: Activity, _next: Next<'_>) {}
    }

    fn ctx(direction: Direction) -> DispatchContext {
        DispatchContext {
            direction,
            conversation_id: "conv".to_string(),
        }
    }

    fn tagger(tag: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn ActivityInterceptor> {
        Box::new(Tagger {
            tag,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn test_interceptors_run_in_order_before_consumer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = ActivityPipeline::new(vec![tagger("a", &log), tagger("b", &log)]);
        let delivered = RefCell::new(None);

        pipeline.dispatch(
            &ctx(Direction::Outgoing),
            Activity::text(ChannelAccount::user("u"), ">"),
            |activity| *delivered.borrow_mut() = Some(activity),
        );

        assert_eq!(*log.borrow(), vec!["a:outgoing", "b:outgoing"]);
        let delivered = delivered.into_inner().unwrap();
        assert_eq!(delivered.as_message().unwrap().text.as_deref(), Some(">ab"));
    }

    #[test]
    fn test_interceptor_can_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = ActivityPipeline::new(vec![Box::new(Dropper), tagger("after", &log)]);
        let mut delivered = false;

        pipeline.dispatch(
            &ctx(Direction::Incoming),
            Activity::text(ChannelAccount::user("u"), "x"),
            |_| delivered = true,
        );

        assert!(!delivered);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_empty_pipeline_passes_through() {
        let pipeline = ActivityPipeline::default();
        let original = Activity::text(ChannelAccount::user("u"), "same");
        let mut delivered = None;

        pipeline.dispatch(&ctx(Direction::Incoming), original.clone(), |a| {
            delivered = Some(a);
        });

        assert_eq!(delivered, Some(original));
        assert_eq!(pipeline.len(), 0);
    }
}
