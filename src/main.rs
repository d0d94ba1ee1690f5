//! Post summarizer service entrypoint.
//! Waits for the Discord bot to be ready, then drives the recurring
//! fetch → triage → summarize → persist → announce pipeline until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use post_summarizer::api::{self, AppState};
use post_summarizer::config::{ai::CompletionConfig, AppConfig};
use post_summarizer::metrics::Metrics;
use post_summarizer::notify::{DiscordNotifier, Notifier};
use post_summarizer::store::{JsonFileStore, PostStore};
use post_summarizer::summarize::build_completion;
use post_summarizer::triage::config::keyword_filter_from_env;
use post_summarizer::{spawn_scheduler, ImportanceFilter, Pipeline};

const READY_RETRY: Duration = Duration::from_secs(30);

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("post_summarizer=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env().context("loading service config")?;
    let ai = CompletionConfig::load_default().context("loading completion config")?;
    let completion = build_completion(&ai).context("building completion client")?;
    let filter = keyword_filter_from_env().context("loading triage keywords")?;

    let mut pipeline_cfg = cfg.pipeline.clone();
    pipeline_cfg.max_tokens = ai.max_tokens;
    if pipeline_cfg.lookback <= pipeline_cfg.interval {
        tracing::warn!(
            lookback_secs = pipeline_cfg.lookback.as_secs(),
            interval_secs = pipeline_cfg.interval.as_secs(),
            "lookback does not exceed the run interval; posts failing one run may never be retried"
        );
    }

    let notifier = Arc::new(
        DiscordNotifier::new(cfg.discord_token.clone())
            .with_timeout(pipeline_cfg.notify_timeout),
    );
    let store = Arc::new(JsonFileStore::new(&cfg.store_path));
    tracing::info!(
        store = store.name(),
        path = %store.path().display(),
        provider = completion.name(),
        triage = filter.name(),
        notifier = notifier.name(),
        channel = %cfg.channel_id,
        "capabilities ready"
    );

    let pipeline = Arc::new(Pipeline::new(
        store,
        Arc::new(filter),
        completion,
        notifier.clone(),
        cfg.channel_id.clone(),
        pipeline_cfg,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Metrics + status endpoint
    let metrics = Metrics::init().context("installing prometheus recorder")?;
    let app = api::router(AppState {
        pipeline: pipeline.clone(),
    })
    .merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(cfg.metrics_addr)
        .await
        .with_context(|| format!("binding {}", cfg.metrics_addr))?;
    let mut http_shutdown = shutdown_rx.clone();
    let http = tokio::spawn(async move {
        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = http_shutdown.wait_for(|stop| *stop).await;
        });
        if let Err(e) = serve.await {
            tracing::warn!(error = %e, "status server stopped");
        }
    });

    // Readiness: the scheduler starts only once the bot user resolves.
    let ready = async {
        loop {
            match notifier.connect().await {
                Ok(name) => {
                    tracing::info!("{name} has connected to Discord!");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discord not ready; retrying");
                    tokio::time::sleep(READY_RETRY).await;
                }
            }
        }
    };
    tokio::select! {
        _ = ready => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested before ready");
            let _ = shutdown_tx.send(true);
            let _ = http.await;
            return Ok(());
        }
    }

    let scheduler = spawn_scheduler(pipeline, shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    let _ = scheduler.await;
    let _ = http.await;
    Ok(())
}
