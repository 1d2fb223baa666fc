//! Background task that owns the sync engine.
//!
//! Requests are handled strictly one at a time, so catch-up is serialized
//! across accounts and callers.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::engine::{DrainStats, EventSyncEngine, SyncReport};
use crate::config::SyncConfig;
use crate::{AccountId, Error, Result};

/// Capacity of the request queue.
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// Work accepted by the worker.
#[derive(Debug)]
enum SyncRequest {
    /// Drain one account.
    Account {
        account_id: AccountId,
        reply: oneshot::Sender<Result<DrainStats>>,
    },
    /// Drain several accounts in turn.
    All {
        accounts: Vec<AccountId>,
        reply: oneshot::Sender<SyncReport>,
    },
    /// Stop the loop.
    Shutdown,
}

/// Cloneable handle for submitting work to a running [`SyncWorker`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    requests: mpsc::Sender<SyncRequest>,
}

impl SyncHandle {
    /// Drains one account and waits for the outcome.
    ///
    /// # Errors
    ///
    /// Returns the drain failure, or [`Error::Cancelled`] if the worker has
    /// stopped.
    pub async fn sync(&self, account_id: AccountId) -> Result<DrainStats> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(SyncRequest::Account { account_id, reply })
            .await
            .map_err(|_| Error::Cancelled)?;
        outcome.await.map_err(|_| Error::Cancelled)?
    }

    /// Drains every given account and waits for the report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the worker has stopped.
    pub async fn sync_all(&self, accounts: Vec<AccountId>) -> Result<SyncReport> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(SyncRequest::All { accounts, reply })
            .await
            .map_err(|_| Error::Cancelled)?;
        outcome.await.map_err(|_| Error::Cancelled)
    }

    /// Asks the worker to stop after the request in progress.
    pub async fn shutdown(&self) {
        // Already stopped is fine.
        let _ = self.requests.send(SyncRequest::Shutdown).await;
    }
}

/// Single owner of an [`EventSyncEngine`].
pub struct SyncWorker {
    engine: EventSyncEngine,
    requests: mpsc::Receiver<SyncRequest>,
    poll: Option<Interval>,
}

impl SyncWorker {
    /// Spawns the worker loop on the current runtime.
    ///
    /// The engine's full refresh fetches `config.page_size` conversations.
    /// With a poll interval configured, every logged-in account is also
    /// drained on each tick.
    pub fn spawn(engine: EventSyncEngine, config: &SyncConfig) -> (SyncHandle, JoinHandle<()>) {
        let engine = engine.with_bootstrap_page_size(config.page_size);
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let poll = config.poll_interval().map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let worker = Self {
            engine,
            requests: rx,
            poll,
        };
        let task = tokio::spawn(worker.run());
        (SyncHandle { requests: tx }, task)
    }

    async fn run(mut self) {
        info!("Sync worker started");
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(SyncRequest::Shutdown) | None => break,
                    Some(request) => self.handle(request).await,
                },
                () = next_tick(self.poll.as_mut()) => self.poll_all().await,
            }
        }
        info!("Sync worker stopped");
    }

    async fn handle(&self, request: SyncRequest) {
        match request {
            SyncRequest::Account { account_id, reply } => {
                let outcome = self.engine.drain(account_id).await;
                if reply.send(outcome).is_err() {
                    debug!("Sync caller for account {account_id} went away");
                }
            }
            SyncRequest::All { accounts, reply } => {
                let report = self.engine.start(&accounts).await;
                if reply.send(report).is_err() {
                    debug!("Sync caller went away");
                }
            }
            SyncRequest::Shutdown => {}
        }
    }

    async fn poll_all(&self) {
        let accounts = self.engine.sessions().logged_in().await;
        if accounts.is_empty() {
            return;
        }
        let report = self.engine.start(&accounts).await;
        if !report.is_success() {
            warn!("Periodic sync failed for accounts {:?}", report.failed());
        }
    }
}

async fn next_tick(poll: Option<&mut Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

