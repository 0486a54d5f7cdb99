//! DatabaseService - the single consumer of the wiki-database channel.
//!
//! # 状態遷移
//! `Starting -> Listening -> Stopped`
//!
//! `start` is a straight pipeline: load SQL statements, open the pool, ensure
//! the schema, register handlers, subscribe. The first failing step aborts the
//! start and the channel never gets a consumer. The returned service reports
//! `Starting` until its listener task is running, then `Listening`.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info};

use super::handlers::PageHandlers;
use crate::bus::{BusError, Consumer, EventBus, Message};
use crate::config::DatabaseConfig;
use crate::domain::{
    AllPages, CreatePage, DeletePage, ErrorCode, GetPage, ReplyFailure, SavePage,
};
use crate::impls::{QueryTable, QueryTableError, SqlitePageStore};
use crate::ports::{PageStore, StoreError};
use crate::typed::{ActionRegistry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting,
    Listening,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("failed to load SQL statements: {0}")]
    Queries(#[from] QueryTableError),

    #[error("could not open a database connection: {0}")]
    Open(#[source] StoreError),

    #[error("database preparation error: {0}")]
    Schema(#[source] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

pub struct DatabaseService {
    channel: String,
    state_tx: Arc<watch::Sender<ServiceState>>,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
    _store: Arc<dyn PageStore>,
}

impl DatabaseService {
    /// Start against the SQLite database described by `config`.
    pub async fn start(config: &DatabaseConfig, bus: &EventBus) -> Result<Self, StartError> {
        info!(queue = %config.queue, "database service starting");
        let queries = QueryTable::load(config.sql_queries_file.as_deref())?;
        let store = SqlitePageStore::open(config.database_path(), config.max_pool_size, queries)
            .map_err(StartError::Open)?;
        store.ensure_schema().await.map_err(StartError::Schema)?;

        Self::start_with_store(Arc::new(store), &config.queue, bus)
    }

    /// Start against an already prepared store.
    pub fn start_with_store(
        store: Arc<dyn PageStore>,
        channel: &str,
        bus: &EventBus,
    ) -> Result<Self, StartError> {
        let registry = page_registry(Arc::clone(&store))?;
        let consumer = bus.consumer(channel)?;

        let (state_tx, _) = watch::channel(ServiceState::Starting);
        let state_tx = Arc::new(state_tx);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(listen(
            consumer,
            Arc::new(registry),
            shutdown_rx,
            Arc::clone(&state_tx),
        ));

        Ok(Self {
            channel: channel.to_string(),
            state_tx,
            shutdown_tx,
            join,
            _store: store,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> ServiceState {
        *self.state_tx.borrow()
    }

    /// Follow state changes, including the final `Stopped`.
    pub fn state_watch(&self) -> watch::Receiver<ServiceState> {
        self.state_tx.subscribe()
    }

    /// Stop taking new requests, let in-flight ones finish, then stop.
    pub async fn shutdown(self) {
        info!(channel = %self.channel, "database service stopping");
        // receiver が落ちていても構わない
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "listener task failed");
        }
        // listener が panic した場合もここで確定させる
        self.state_tx.send_replace(ServiceState::Stopped);
        info!(channel = %self.channel, "database service stopped");
    }
}

/// One handler per action, all backed by `store`.
fn page_registry(store: Arc<dyn PageStore>) -> Result<ActionRegistry, RegistryError> {
    let handlers = PageHandlers::new(store);
    let mut registry = ActionRegistry::new();
    registry.register::<AllPages, _>(handlers.clone())?;
    registry.register::<GetPage, _>(handlers.clone())?;
    registry.register::<CreatePage, _>(handlers.clone())?;
    registry.register::<SavePage, _>(handlers.clone())?;
    registry.register::<DeletePage, _>(handlers)?;
    registry.ensure_complete()?;
    Ok(registry)
}

async fn listen(
    mut consumer: Consumer,
    registry: Arc<ActionRegistry>,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: Arc<watch::Sender<ServiceState>>,
) {
    state_tx.send_replace(ServiceState::Listening);
    info!(channel = consumer.channel(), "database service listening");

    let mut in_flight = JoinSet::new();

    loop {
        // shutdown が来ていたら抜ける
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が drop された場合も止まる
                if changed.is_err() {
                    break;
                }
            }
            message = consumer.recv() => {
                let Some(message) = message else { break };
                in_flight.spawn(handle_message(Arc::clone(&registry), message));
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "request task failed");
                }
            }
        }
    }

    // 新規受付を止め、キューに残っている分は断る
    consumer.close();
    while let Some(message) = consumer.recv().await {
        message.fail(ReplyFailure::new(
            ErrorCode::NoHandlers,
            "database service is stopping",
        ));
    }

    // in-flight は最後まで走らせる
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "request task failed");
        }
    }

    state_tx.send_replace(ServiceState::Stopped);
}

async fn handle_message(registry: Arc<ActionRegistry>, message: Message) {
    let (envelope, reply) = message.into_parts();
    reply.send(registry.dispatch(envelope).await);
}
