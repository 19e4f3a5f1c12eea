//! # miji
//!
//! Assembles the forum store from configuration: installs logging, opens the
//! backend selected at compile time, applies migrations and reports what the
//! database holds. Request handlers depend on the [`miji_core::Store`] built here.

use anyhow::Context;
use miji_config::{LogSettings, Settings};
use miji_core::{PostStore, Store, ThreadStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use miji_db_sqlite::{SqliteStore, SqliteStoreOptions};

#[cfg(not(feature = "db-sqlite"))]
compile_error!("miji needs a storage backend; enable the `db-sqlite` feature");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    #[cfg(feature = "db-sqlite")]
    let backend = open_sqlite(&settings).await?;

    let store = backend.store();
    report(&store).await?;

    backend.close().await;
    Ok(())
}

/// `RUST_LOG` wins over the configured filter when it is set.
fn init_tracing(log: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[cfg(feature = "db-sqlite")]
async fn open_sqlite(settings: &Settings) -> anyhow::Result<SqliteStore> {
    use secrecy::ExposeSecret;

    let options = SqliteStoreOptions {
        url: settings.database.url.expose_secret().to_string(),
        max_connections: settings.database.max_connections,
        acquire_timeout: settings.database.acquire_timeout(),
        statement_timeout: settings.database.statement_timeout(),
    };

    let store = SqliteStore::connect(&options)
        .await
        .context("opening sqlite database")?;
    store.migrate().await.context("migrating sqlite database")?;
    Ok(store)
}

async fn report(store: &Store) -> anyhow::Result<()> {
    let threads = store.list_threads().await?;
    for thread in &threads {
        let posts = store.list_posts_by_thread(thread.id).await?;
        info!(thread_id = %thread.id, title = %thread.title, posts = posts.len(), "thread");
    }
    info!(threads = threads.len(), "store ready");
    Ok(())
}
