//! Command-line shell for the to-do list.
//!
//! Each invocation rehydrates the store from disk, dispatches the actions
//! for one command, prints the result and lets the autosave task write the
//! collection back before exiting.

use anyhow::Context;
use checkmark_core::environment::{SystemClock, TimestampIdGenerator};
use checkmark_runtime::Store;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use todo::cli::{self, Cli};
use todo::{
    Config, FileStore, HttpRemoteSource, Persistence, TodoEnvironment, TodoReducer, TodoStore,
    spawn_autosave,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=info,checkmark_runtime=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let persistence = Persistence::new(Arc::new(FileStore::new(config.storage.data_dir.clone())));
    let initial = persistence
        .rehydrate()
        .await
        .context("Failed to load saved todos")?;

    let remote = HttpRemoteSource::from_config(&config.remote, Arc::new(SystemClock))
        .context("Failed to set up remote source")?;
    let store: TodoStore = Store::new(
        initial,
        TodoReducer::new(),
        TodoEnvironment::new(Arc::new(remote)),
    );
    let autosave = spawn_autosave(persistence, store.subscribe_state());
    let ids = TimestampIdGenerator::new(SystemClock);

    let sync_timeout = config.remote.timeout() + Duration::from_secs(1);
    let outcome = cli::run(cli.command, &store, &ids, sync_timeout, &mut std::io::stdout()).await;

    if let Err(error) = store.shutdown(config.shutdown_timeout()).await {
        tracing::warn!(%error, "Store did not shut down cleanly");
    }
    drop(store);
    autosave.await.context("Autosave task failed")?;

    outcome
}
