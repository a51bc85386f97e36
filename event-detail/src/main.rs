//! Command-line driver for one event page.
//!
//! ```bash
//! # Show event 42
//! cargo run --bin event-detail -- 42
//!
//! # Join, leave or rate as the configured session
//! HERITAGE_USER_ID=7 HERITAGE_TOKEN=... cargo run --bin event-detail -- 42 join
//! HERITAGE_USER_ID=7 HERITAGE_TOKEN=... cargo run --bin event-detail -- 42 rate 4 "Lovely evening"
//! ```

use anyhow::{Context, bail};
use heritage_auth::{SessionProvider, SharedSession};
use heritage_client::{EventId, HttpEventApi};
use heritage_event_detail::{
    AppConfig, EventDetailEnvironment, EventDetailReconciler, EventDetailView,
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "heritage_event_detail=debug,heritage_runtime=info";

enum Command {
    Show,
    Join,
    Leave,
    Rate { score: u8, comment: String },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(EventId, Command)> {
    let event_id = args
        .next()
        .context("usage: event-detail <event-id> [join | leave | rate <score> [comment]]")?
        .parse::<u64>()
        .map(EventId)
        .context("event id must be a number")?;

    let command = match args.next().as_deref() {
        None | Some("show") => Command::Show,
        Some("join") => Command::Join,
        Some("leave") => Command::Leave,
        Some("rate") => {
            let score = args
                .next()
                .context("rate needs a score")?
                .parse::<u8>()
                .context("score must be a number")?;
            Command::Rate {
                score,
                comment: args.collect::<Vec<_>>().join(" "),
            }
        },
        Some(other) => bail!("unknown command {other:?}"),
    };

    Ok((event_id, command))
}

fn print_view(view: &EventDetailView) {
    if let Some(error) = &view.error {
        println!("Event unavailable: {error}");
        return;
    }

    if let Some(event) = &view.event {
        println!("{} ({})", event.name, event.date);
        println!("  {} · {}", event.location, view.province);
        println!("  {} attending", event.attendee_count);
    }

    println!("  Participation: {:?}", view.participation);
    println!(
        "  Rating: {:.1} from {} reviews",
        (view.average_rating * 10.0).round() / 10.0,
        view.review_count
    );
    if view.user_rating > 0 {
        println!("  Your rating: {} {:?}", view.user_rating, view.user_comment);
    }

    for row in &view.reviews {
        println!("  {} {}: {}", row.stars(), row.username, row.comment);
    }

    if let Some(message) = view.notice_message() {
        println!("  ! {message}");
    }
}

async fn settle(page: &EventDetailReconciler<HttpEventApi, SharedSession>, config: &AppConfig) {
    // Pending notice expiries count as running effects
    if let Err(error) = page.wait_idle(config.settle_timeout).await {
        tracing::warn!(%error, "Page did not settle");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    let filter = config
        .log_filter
        .as_deref()
        .map(EnvFilter::try_new)
        .transpose()?
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (event_id, command) = parse_args(std::env::args().skip(1))?;

    let session = match &config.session {
        Some(session) => SharedSession::signed_in(session.identity, session.token.clone()),
        None => SharedSession::anonymous(),
    };
    let session = Arc::new(session);

    tracing::info!(
        api = %config.api.base_url(),
        authenticated = config.session.is_some(),
        %event_id,
        "Opening event page"
    );

    let provider: Arc<dyn SessionProvider> = session.clone();
    let api = HttpEventApi::new(config.api.clone(), provider);
    let mut environment = EventDetailEnvironment::new(Arc::new(api), Arc::clone(&session));
    if let Some(ttl) = config.notice_ttl {
        environment = environment.with_notice_ttl(ttl);
    }

    let page = EventDetailReconciler::new(environment);
    let watcher = page.watch_session(session.subscribe());

    page.mount(event_id).await?;
    settle(&page, &config).await;

    match command {
        Command::Show => {},
        Command::Join => {
            page.join().await?;
        },
        Command::Leave => {
            page.leave().await?;
        },
        Command::Rate { score, comment } => {
            page.submit_rating(score, comment).await?;
        },
    }
    settle(&page, &config).await;

    print_view(&page.view().await);

    page.unmount().await?;
    watcher.abort();
    if let Err(error) = page.store().shutdown(config.settle_timeout).await {
        tracing::warn!(%error, "Effects still running at exit");
    }

    Ok(())
}
