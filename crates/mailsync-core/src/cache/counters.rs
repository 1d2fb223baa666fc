//! Unread counters per label, kept in sync with the server by full replace.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::observation::{Emitter, Observation};
use crate::model::{CounterKind, DataResult, UnreadCounter};
use crate::remote::{Connectivity, MailApi};
use crate::store::MailboxStore;
use crate::{AccountId, Error, Result};

/// Counters observation item.
pub type CountersResult = DataResult<Vec<UnreadCounter>>;

/// Reactive access to the unread counters table.
#[derive(Clone)]
pub struct UnreadCounterCache {
    store: Arc<MailboxStore>,
    api: Arc<dyn MailApi>,
    connectivity: Arc<dyn Connectivity>,
    refreshing: Arc<Mutex<()>>,
}

impl UnreadCounterCache {
    /// Create a cache over the given collaborators.
    pub fn new(
        store: Arc<MailboxStore>,
        api: Arc<dyn MailApi>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
            refreshing: Arc::new(Mutex::new(())),
        }
    }

    /// Observes the counters of `kind`.
    ///
    /// Emits the stored counters now and after every change to them, and
    /// refreshes from the server once in the background when reachable.
    #[must_use]
    pub fn observe(
        &self,
        account_id: AccountId,
        kind: CounterKind,
    ) -> Observation<CountersResult> {
        let this = self.clone();
        Observation::spawn(move |emitter| async move {
            this.run(account_id, kind, emitter).await;
        })
    }

    async fn run(
        &self,
        account_id: AccountId,
        kind: CounterKind,
        emitter: Emitter<CountersResult>,
    ) {
        let mut changes = self.store.subscribe();
        self.emit_local(account_id, kind, &emitter).await;

        let refresh = self.refresh(account_id, kind);
        tokio::pin!(refresh);
        let mut refreshing = self.connectivity.is_reachable();
        if !refreshing {
            debug!("Offline, skipping {} counter refresh", kind.as_str());
        }

        loop {
            tokio::select! {
                refreshed = &mut refresh, if refreshing => {
                    refreshing = false;
                    match refreshed {
                        Ok(()) => {}
                        Err(Error::Cancelled) => return,
                        Err(e) => {
                            warn!("Counter refresh failed for account {account_id}: {e}");
                            emitter.emit(DataResult::remote_error(e.message()));
                        }
                    }
                }
                change = changes.recv() => {
                    match change {
                        Ok(change) if !change.touches_counters(account_id, kind) => continue,
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            self.emit_local(account_id, kind, &emitter).await;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }

            if emitter.is_closed() {
                return;
            }
        }
    }

    async fn emit_local(
        &self,
        account_id: AccountId,
        kind: CounterKind,
        emitter: &Emitter<CountersResult>,
    ) {
        let item = match self.store.list_counters(account_id, kind).await {
            Ok(counters) => DataResult::local(counters),
            Err(e) => DataResult::local_error(e.message()),
        };
        emitter.emit(item);
    }

    /// Replaces the stored counters of `kind` with the server's.
    ///
    /// Labels missing from the response are removed. Concurrent refreshes run
    /// one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or the store write fails.
    pub async fn refresh(&self, account_id: AccountId, kind: CounterKind) -> Result<()> {
        let _guard = self.refreshing.lock().await;

        let entries = self.api.fetch_unread_counts(account_id, kind).await?;
        let counters = UnreadCounter::from_entries(account_id, kind, &entries);
        debug!(
            "Replacing {} {} counters for account {account_id}",
            counters.len(),
            kind.as_str()
        );
        self.store.replace_counters(account_id, kind, counters).await
    }
}
