use anyhow::Result;
use clap::Parser;
use quorum_core::events::PollEvent;
use quorum_db::{MemoryPollStore, PollBackend, SqlitePollStore};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_tracing(config.logging.json);

    let backend = build_backend(&config).await?;
    tracing::info!(backend = backend.name(), "poll store ready");

    let state = quorum_core::AppState::new(
        backend,
        config.poll_service(),
        config.polls.event_capacity,
    );
    tokio::spawn(log_events(state.event_bus.subscribe_all("event-log")));
    let app = quorum_api::build_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("Listening on http://{}", config.server.bind_address);

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Trace every poll event until the bus drops this subscription.
async fn log_events(mut events: Receiver<PollEvent>) -> usize {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                seen += 1;
                tracing::debug!(
                    kind = event.kind.as_str(),
                    poll_id = %event.poll_id,
                    channel_id = %event.channel_id,
                    "poll event"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log fell behind");
            }
            Err(RecvError::Closed) => return seen,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quorum=info,tower_http=debug"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_backend(config: &config::Config) -> Result<PollBackend> {
    match config.storage.backend {
        config::StorageBackend::Memory => Ok(PollBackend::Memory(MemoryPollStore::new())),
        config::StorageBackend::Sqlite => {
            ensure_db_parent_dir(&config.storage.database_url);
            let pool = quorum_db::create_pool(
                &config.storage.database_url,
                config.storage.max_connections,
            )
            .await?;
            quorum_db::run_migrations(&pool).await?;
            Ok(PollBackend::Sqlite(SqlitePollStore::new(pool)))
        }
    }
}

/// Create the directory holding a file-backed SQLite database.
fn ensure_db_parent_dir(database_url: &str) {
    let Some(db_path) = database_url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    else {
        return;
    };
    if db_path.is_empty() || db_path.starts_with(":memory:") {
        return;
    }
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create directory '{}': {}", parent.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::events::{EventBus, PollEventKind};

    #[test]
    fn creates_missing_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("nested").join("data");
        let url = format!("sqlite://{}/quorum.db?mode=rwc", db_dir.display());

        ensure_db_parent_dir(&url);
        assert!(db_dir.is_dir());
    }

    #[tokio::test]
    async fn event_log_drains_until_unsubscribed() {
        let bus = EventBus::new(16);
        let task = tokio::spawn(log_events(bus.subscribe_all("event-log")));
        bus.publish(PollEvent {
            kind: PollEventKind::PollCreate,
            poll_id: "p1".into(),
            channel_id: "general".into(),
            payload: serde_json::Value::Null,
        });
        bus.unsubscribe("event-log");
        assert_eq!(task.await.unwrap(), 1);
    }

    #[test]
    fn ignores_in_memory_urls() {
        ensure_db_parent_dir("sqlite::memory:");
        ensure_db_parent_dir("sqlite://:memory:");
    }

    #[tokio::test]
    async fn sqlite_backend_is_migrated_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config::Config::default();
        config.storage.database_url =
            format!("sqlite://{}/db/quorum.db?mode=rwc", dir.path().display());

        let backend = build_backend(&config).await.unwrap();
        assert_eq!(backend.name(), "sqlite");
        assert!(matches!(
            quorum_db::PollStore::get(&backend, "missing").await,
            Err(quorum_db::StoreError::NotFound)
        ));
    }
}
