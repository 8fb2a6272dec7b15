//! Card-click pipeline
//!
//! Sees only clicks the renderer already recognised. It cannot repair an
//! action type the renderer ignores, because such clicks never arrive here.

use serde::Serialize;
use serde_json::Value;

/// A renderer-recognised button click
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardClick {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    pub data: Option<Value>,
}

/// Interceptor wrapping a click before the renderer's default handling
pub trait CardClickInterceptor {
    /// Call `next.run` to let the default handling proceed
    fn handle(&self, click: &CardClick, next: ClickNext<'_>);
}

/// Continuation to the renderer's default click handling
pub struct ClickNext<'a> {
    default: Box<dyn FnOnce(&CardClick) + 'a>,
    click: &'a CardClick,
}

impl ClickNext<'_> {
    pub fn run(self) {
        (self.default)(self.click);
    }
}

/// Holds at most one click interceptor
#[derive(Default)]
pub struct ClickPipeline {
    interceptor: Option<Box<dyn CardClickInterceptor>>,
}

impl ClickPipeline {
    pub fn new(interceptor: Option<Box<dyn CardClickInterceptor>>) -> Self {
        Self { interceptor }
    }

    /// Run the interceptor (if any) around `default`. Returns whether the
    /// default handling ran.
    pub fn dispatch(&self, click: &CardClick, default: impl FnOnce(&CardClick)) -> bool {
        let mut ran = false;
        let tracked = |click: &CardClick| {
            ran = true;
            default(click);
        };
        match &self.interceptor {
            Some(interceptor) => interceptor.handle(
                click,
                ClickNext {
                    default: Box::new(tracked),
                    click,
                },
            ),
            None => tracked(click),
        }
        ran
    }
}
