//! card_shim - Adaptive Card action compatibility demo
//!
//! Simulates a chat UI talking to a bot over a mock activity channel. The
//! bot's consent card uses `Action.Execute`, which the UI's renderer ignores;
//! the `ActionRewrite` interceptor converts those buttons to `Action.Submit`
//! in flight so the click reaches the bot.

mod activity;
mod bot;
mod broadcast;
mod channel;
mod config;
mod connection;
mod pipeline;
mod renderer;
mod scheduler;

use activity::{Activity, ChannelAccount};
use channel::ActivityChannel;
use config::DemoConfig;
use connection::ConnectionStatus;
use pipeline::{ActionRewrite, CardClick, CardClickInterceptor, ClickNext};
use renderer::{CardRenderer, ClickOutcome};
use scheduler::{Scheduler, VirtualScheduler};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Logs every click the renderer routes before letting it through
struct LoggingClicks;

impl CardClickInterceptor for LoggingClicks {
    fn handle(&self, click: &CardClick, next: ClickNext<'_>) {
        tracing::info!(
            action_type = %click.action_type,
            title = %click.title,
            data = %click.data.clone().unwrap_or_default(),
            "Card click routed"
        );
        next.run();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "card_shim=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = DemoConfig::from_env()?;
    tracing::info!(
        variant = ?config.channel.card_variant,
        rewrite = config.rewrite,
        response_delay_ms = %config.channel.response_delay.as_millis(),
        realtime = config.realtime,
        "Starting demo"
    );

    let sched = VirtualScheduler::starting_now();
    let mut builder = ActivityChannel::builder(config.channel.clone())
        .with_click_interceptor(Box::new(LoggingClicks));
    if config.rewrite {
        builder = builder.with_interceptor(Box::new(ActionRewrite));
    }
    let channel = builder.build(sched.clone());

    channel.status_stream().subscribe(|status: &ConnectionStatus| {
        tracing::info!(%status, "Connection status");
    });

    let latest_card: Rc<RefCell<Option<Activity>>> = Rc::new(RefCell::new(None));
    let card_sink = Rc::clone(&latest_card);
    channel.activity_stream().subscribe(move |activity: &Activity| {
        match serde_json::to_string(activity) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize activity"),
        }
        if !activity.attachments().is_empty() {
            *card_sink.borrow_mut() = Some(activity.clone());
        }
    });

    drive(&sched, config.realtime).await;

    let user = ChannelAccount::user("demo-user");
    let card = latest_card.borrow().clone();
    match card {
        Some(card) => {
            let renderer = CardRenderer::new(&channel, user.clone());
            match renderer.click(&card, 0, 0)? {
                ClickOutcome::Posted(ack) => {
                    ack.subscribe(|id: &activity::ActivityId| {
                        tracing::info!(activity_id = %id, "Click acknowledged");
                    });
                }
                ClickOutcome::Intercepted => tracing::info!("Click stopped by interceptor"),
                ClickOutcome::Discarded { action_type } => tracing::warn!(
                    action_type,
                    "Renderer dropped the click; set CARD_SHIM_REWRITE=1 to apply the fix"
                ),
            }
        }
        None => tracing::warn!("No card was delivered"),
    }
    drive(&sched, config.realtime).await;

    channel.send(Activity::text(user, "show it again"));
    drive(&sched, config.realtime).await;

    tracing::info!(answered = channel.answered(), "Demo finished");
    channel.close();
    drive(&sched, config.realtime).await;

    Ok(())
}

/// Fire scheduled work until none is left, optionally sleeping so logical
/// time tracks the wall clock.
async fn drive(sched: &VirtualScheduler, realtime: bool) {
    while let Some(deadline) = sched.next_deadline() {
        if realtime {
            let wait = deadline.saturating_sub(sched.now());
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
        sched.run_next();
    }
}
