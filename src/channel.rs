//! Mock activity channel between the chat UI and the bot
//!
//! Owns the connection lifecycle, the conversation engine state and the
//! activity pipeline for one conversation. Everything runs on the injected
//! scheduler; nothing here blocks.


use crate::activity::{Activity, ActivityId, CardVariant};
use crate::bot::{transition, BotContext, BotEvent, BotState, Effect, Reply};
use crate::broadcast::{BroadcastStream, StreamReader};
use crate::connection::{ConnectionStateMachine, ConnectionStatus};
use crate::pipeline::{
    ActivityInterceptor, ActivityPipeline, CardClickInterceptor, ClickPipeline, DispatchContext,
    Direction,
};
use crate::scheduler::Scheduler;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Default latency between a post and the bot processing it
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(600);

/// Per-channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Action type the bot builds its consent card with
    pub card_variant: CardVariant,
    /// Delay before a posted activity reaches the bot
    pub response_delay: Duration,
    /// Delay before a post is acknowledged with its id
    pub ack_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            card_variant: CardVariant::default(),
            response_delay: DEFAULT_RESPONSE_DELAY,
            ack_delay: Duration::ZERO,
        }
    }
}

/// Identifier source owned by one channel
#[derive(Debug)]
struct IdGenerator {
    next: Cell<u64>,
}

impl IdGenerator {
    fn new() -> Self {
        Self { next: Cell::new(1) }
    }

    fn next(&self) -> ActivityId {
        let id = self.next.get();
        self.next.set(id + 1);
        ActivityId(id)
    }
}

struct Shared {
    conversation_id: String,
    config: ChannelConfig,
    scheduler: Rc<dyn Scheduler>,
    connection: Rc<ConnectionStateMachine>,
    activities: BroadcastStream<Activity>,
    pipeline: ActivityPipeline,
    clicks: ClickPipeline,
    ids: IdGenerator,
    bot_state: Cell<BotState>,
    bot_context: BotContext,
}

/// Builder collecting the interceptors a channel is constructed with
#[derive(Default)]
pub struct ChannelBuilder {
    config: ChannelConfig,
    interceptors: Vec<Box<dyn ActivityInterceptor>>,
    click_interceptor: Option<Box<dyn CardClickInterceptor>>,
}

impl ChannelBuilder {
    /// Append an activity interceptor; they run in the order added
    pub fn with_interceptor(mut self, interceptor: Box<dyn ActivityInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Install the card-click interceptor, replacing any previous one
    pub fn with_click_interceptor(mut self, interceptor: Box<dyn CardClickInterceptor>) -> Self {
        self.click_interceptor = Some(interceptor);
        self
    }

    pub fn build(self, scheduler: Rc<dyn Scheduler>) -> ActivityChannel {
        ActivityChannel::new(
            self.config,
            scheduler,
            self.interceptors,
            self.click_interceptor,
        )
    }
}

/// Host-facing handle to one simulated conversation
pub struct ActivityChannel {
    shared: Rc<Shared>,
}

impl ActivityChannel {
    pub fn builder(config: ChannelConfig) -> ChannelBuilder {
        ChannelBuilder {
            config,
            ..ChannelBuilder::default()
        }
    }

    pub fn new(
        config: ChannelConfig,
        scheduler: Rc<dyn Scheduler>,
        interceptors: Vec<Box<dyn ActivityInterceptor>>,
        click_interceptor: Option<Box<dyn CardClickInterceptor>>,
    ) -> Self {
        let conversation_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            conversation_id = %conversation_id,
            variant = ?config.card_variant,
            interceptors = interceptors.len(),
            "Creating activity channel"
        );

        let connection = ConnectionStateMachine::start(&scheduler);
        let shared = Rc::new(Shared {
            conversation_id,
            bot_context: BotContext::new(config.card_variant),
            config,
            scheduler,
            connection,
            activities: BroadcastStream::new(),
            pipeline: ActivityPipeline::new(interceptors),
            clicks: ClickPipeline::new(click_interceptor),
            ids: IdGenerator::new(),
            bot_state: Cell::new(BotState::default()),
        });

        let weak = Rc::downgrade(&shared);
        shared
            .connection
            .reader()
            .subscribe(move |status: &ConnectionStatus| {
                if *status == ConnectionStatus::Online {
                    if let Some(shared) = weak.upgrade() {
                        shared.process(BotEvent::Online);
                    }
                }
            });

        Self { shared }
    }

    pub fn conversation_id(&self) -> &str {
        &self.shared.conversation_id
    }

    /// Activities delivered to the host, after the activity pipeline
    pub fn activity_stream(&self) -> StreamReader<Activity> {
        self.shared.activities.reader()
    }

    pub fn status_stream(&self) -> StreamReader<ConnectionStatus> {
        self.shared.connection.reader()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.connection.current()
    }

    /// Whether the bot has taken a consent response since the last reset
    pub fn answered(&self) -> bool {
        self.shared.bot_state.get().answered
    }

    /// Pipeline wrapping renderer-recognised card clicks
    pub fn click_pipeline(&self) -> &ClickPipeline {
        &self.shared.clicks
    }

    /// Post an activity to the bot. Always accepted, whatever the connection
    /// status. The returned stream yields the assigned id once, then completes.
    pub fn send(&self, mut activity: Activity) -> StreamReader<ActivityId> {
        let shared = &self.shared;
        let id = shared.ids.next();
        activity.id = Some(id);
        activity.timestamp = Some(shared.scheduler.timestamp());
        tracing::debug!(
            conversation_id = %shared.conversation_id,
            activity_id = %id,
            kind = activity.kind_name(),
            status = %shared.connection.current(),
            "Activity posted"
        );

        let ack = BroadcastStream::new();
        let reader = ack.reader();
        shared.scheduler.schedule(
            shared.config.ack_delay,
            Box::new(move || {
                ack.push(id);
                ack.complete();
            }),
        );

        let weak = Rc::downgrade(shared);
        shared.scheduler.schedule(
            shared.config.response_delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.deliver_to_bot(activity);
                }
            }),
        );

        reader
    }

    /// End the session. Pending deliveries are dropped when they fire.
    pub fn close(&self) {
        if self.shared.connection.current().is_terminal() {
            return;
        }
        tracing::info!(conversation_id = %self.shared.conversation_id, "Closing activity channel");
        self.shared.connection.close();
        self.shared.activities.complete();
    }
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.connection.current().is_terminal()
    }

    fn dispatch_context(&self, direction: Direction) -> DispatchContext {
        DispatchContext {
            direction,
            conversation_id: self.conversation_id.clone(),
        }
    }

    fn deliver_to_bot(self: &Rc<Self>, activity: Activity) {
        if self.is_closed() {
            tracing::debug!(conversation_id = %self.conversation_id, "Channel closed, dropping posted activity");
            return;
        }
        let ctx = self.dispatch_context(Direction::Outgoing);
        self.pipeline.dispatch(&ctx, activity, |activity| {
            self.process(BotEvent::Inbound(activity));
        });
    }

    fn process(self: &Rc<Self>, event: BotEvent) {
        let result = transition(&self.bot_state.get(), &self.bot_context, event);
        self.bot_state.set(result.new_state);
        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(self: &Rc<Self>, effect: Effect) {
        match effect {
            Effect::Reply { after, reply } => {
                let weak: Weak<Self> = Rc::downgrade(self);
                self.scheduler.schedule(
                    after,
                    Box::new(move || {
                        if let Some(shared) = weak.upgrade() {
                            shared.emit(reply);
                        }
                    }),
                );
            }
            Effect::Diagnostic { reason } => {
                tracing::debug!(conversation_id = %self.conversation_id, %reason, "Inbound activity produced no reply");
            }
        }
    }

    fn emit(&self, reply: Reply) {
        if self.is_closed() {
            tracing::debug!(conversation_id = %self.conversation_id, "Channel closed, dropping bot reply");
            return;
        }
        let account = self.bot_context.account.clone();
        let mut activity = match reply {
            Reply::Text(text) => Activity::text(account, text),
            Reply::Card(card) => Activity::card(account, card),
        };
        let id = self.ids.next();
        activity.id = Some(id);
        activity.timestamp = Some(self.scheduler.timestamp());

        let ctx = self.dispatch_context(Direction::Incoming);
        self.pipeline.dispatch(&ctx, activity, |activity| {
            tracing::info!(
                conversation_id = %self.conversation_id,
                activity_id = %id,
                attachments = activity.attachments().len(),
                "Bot activity delivered"
            );
            self.activities.push(activity);
        });
    }
}
