use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comment_bot::accounts::MemoryAccountStore;
use comment_bot::config::Config;
use comment_bot::github::GithubHost;
use comment_bot::lock::RepoLocks;
use comment_bot::pipeline::{CommentCounter, CommentPipeline};
use comment_bot::server::{build_router, AppState, CsrfStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comment_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let host = match GithubHost::new(&config.github) {
        Ok(host) => host,
        Err(err) => {
            tracing::error!(%err, "could not build the GitHub client");
            std::process::exit(1);
        }
    };

    let pipeline = CommentPipeline::new(
        host,
        MemoryAccountStore::new(),
        RepoLocks::new(config.lock_acquire_timeout),
        CommentCounter::new(),
        config.identity.clone(),
        config.submission_timeout,
    );
    let state = AppState::new(
        pipeline,
        CsrfStore::default(),
        config.max_content_len,
    );
    let app = build_router(state);

    tracing::info!("listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
