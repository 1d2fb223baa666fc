//! Offline-first conversation reads and optimistic mutations.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::mutation::{self, Mutation};
use super::observation::{Emitter, Observation};
use crate::model::{
    ActionResult, Conversation, ConversationId, DataResult, Location, Message, ResponseSource,
    system_labels,
};
use crate::remote::{
    ActionQueue, Connectivity, ConversationListParams, ConversationsPage, MailApi, RemoteAction,
};
use crate::store::{MailboxStore, StoreOp, WriteBatch};
use crate::{AccountId, Error, Result};

/// Conversations list observation item.
pub type ConversationsResult = DataResult<Vec<Conversation>>;

/// Single conversation observation item.
pub type ConversationResult = DataResult<Conversation>;

/// Reads conversations from the store first and the server second, and
/// applies user mutations locally before queueing them for the server.
#[derive(Clone)]
pub struct ConversationCache {
    store: Arc<MailboxStore>,
    api: Arc<dyn MailApi>,
    connectivity: Arc<dyn Connectivity>,
    actions: Arc<dyn ActionQueue>,
}

impl ConversationCache {
    /// Create a cache over the given collaborators.
    pub fn new(
        store: Arc<MailboxStore>,
        api: Arc<dyn MailApi>,
        connectivity: Arc<dyn Connectivity>,
        actions: Arc<dyn ActionQueue>,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
            actions,
        }
    }

    /// Observes the conversations under `params.label_id`.
    ///
    /// Emits the stored list, then either the server-confirmed list or a
    /// remote error. A cancelled remote call ends the stream without a second
    /// item.
    #[must_use]
    pub fn observe_conversations(
        &self,
        params: ConversationListParams,
    ) -> Observation<ConversationsResult> {
        let this = self.clone();
        Observation::spawn(move |emitter| async move {
            this.run_list(params, emitter).await;
        })
    }

    async fn run_list(
        &self,
        params: ConversationListParams,
        emitter: Emitter<ConversationsResult>,
    ) {
        let local = async {
            let item = match local_conversations(&self.store, &params).await {
                Ok(list) => DataResult::local(list),
                Err(e) => DataResult::local_error(e.message()),
            };
            emitter.emit(item);
        };
        let remote = self.fetch_page(&params);
        let ((), fetched) = tokio::join!(local, remote);

        let item = match fetched {
            Ok(page) => match self.store_page(&params, page).await {
                Ok(list) => DataResult::remote(list),
                Err(e) => DataResult::remote_error(e.message()),
            },
            Err(Error::Cancelled) => {
                debug!("Conversation list fetch cancelled");
                return;
            }
            Err(e) => {
                warn!("Conversation list fetch failed: {e}");
                DataResult::remote_error(e.message())
            }
        };
        emitter.emit(item);
    }

    async fn fetch_page(&self, params: &ConversationListParams) -> Result<ConversationsPage> {
        if !self.connectivity.is_reachable() {
            return Err(Error::Offline);
        }
        self.api.list_conversations(params).await
    }

    async fn store_page(
        &self,
        params: &ConversationListParams,
        page: ConversationsPage,
    ) -> Result<Vec<Conversation>> {
        let batch = page
            .conversations
            .into_iter()
            .map(|mut conversation| {
                conversation.account_id = params.account_id;
                StoreOp::UpsertConversation(conversation.without_messages())
            })
            .collect();
        self.store.commit(params.account_id, batch).await?;
        local_conversations(&self.store, params).await
    }

    /// Observes one conversation joined with its messages.
    ///
    /// Emits the stored value (or `Processing` when absent), then the
    /// server's, then every later change that alters the value.
    #[must_use]
    pub fn observe_conversation(
        &self,
        account_id: AccountId,
        id: ConversationId,
    ) -> Observation<ConversationResult> {
        let this = self.clone();
        Observation::spawn(move |emitter| async move {
            this.run_single(account_id, id, emitter).await;
        })
    }

    async fn run_single(
        &self,
        account_id: AccountId,
        id: ConversationId,
        emitter: Emitter<ConversationResult>,
    ) {
        let mut changes = self.store.subscribe();
        let mut last: Option<Conversation> = None;

        match self.store.load_conversation(account_id, &id).await {
            Ok(Some(conversation)) => {
                emitter.emit(DataResult::local(conversation.clone()));
                last = Some(conversation);
            }
            Ok(None) => {
                emitter.emit(DataResult::Processing {
                    source: ResponseSource::Remote,
                });
            }
            Err(e) => {
                emitter.emit(DataResult::local_error(e.message()));
            }
        }

        let fetch = self.fetch_conversation(account_id, &id);
        tokio::pin!(fetch);
        let mut fetching = true;

        loop {
            tokio::select! {
                fetched = &mut fetch, if fetching => {
                    fetching = false;
                    match fetched {
                        Ok(()) => match self.store.load_conversation(account_id, &id).await {
                            Ok(Some(conversation)) => {
                                emitter.emit(DataResult::remote(conversation.clone()));
                                last = Some(conversation);
                            }
                            Ok(None) => {
                                let missing = Error::NotFound(id.to_string());
                                emitter.emit(DataResult::remote_error(missing.message()));
                            }
                            Err(e) => {
                                emitter.emit(DataResult::remote_error(e.message()));
                            }
                        },
                        Err(Error::Cancelled) => {
                            debug!("Conversation {id} fetch cancelled");
                            return;
                        }
                        Err(e) => {
                            warn!("Conversation {id} fetch failed: {e}");
                            emitter.emit(DataResult::remote_error(e.message()));
                        }
                    }
                }
                change = changes.recv() => {
                    match change {
                        Ok(change) if !change.touches_conversation(account_id, &id) => continue,
                        Ok(_) | Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => return,
                    }
                    match self.store.load_conversation(account_id, &id).await {
                        Ok(Some(conversation)) if last.as_ref() != Some(&conversation) => {
                            emitter.emit(DataResult::local(conversation.clone()));
                            last = Some(conversation);
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Failed to reload conversation {id}: {e}"),
                    }
                }
            }

            if emitter.is_closed() {
                return;
            }
        }
    }

    async fn fetch_conversation(&self, account_id: AccountId, id: &ConversationId) -> Result<()> {
        if !self.connectivity.is_reachable() {
            return Err(Error::Offline);
        }
        let detail = self.api.fetch_conversation(account_id, id).await?;

        let mut conversation = detail.conversation.without_messages();
        conversation.account_id = account_id;
        let mut batch: WriteBatch = detail
            .messages
            .into_iter()
            .map(StoreOp::UpsertMessage)
            .collect();
        batch.push(StoreOp::UpsertConversation(conversation));
        self.store.commit(account_id, batch).await
    }

    /// Loads one conversation with its messages from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn load_conversation(
        &self,
        account_id: AccountId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>> {
        self.store.load_conversation(account_id, id).await
    }

    /// Marks every message of the conversations read.
    pub async fn mark_read(&self, account_id: AccountId, ids: &[ConversationId]) -> ActionResult {
        let action = RemoteAction::MarkRead {
            conversation_ids: ids.to_vec(),
        };
        self.apply(account_id, ids, action, mutation::mark_read).await
    }

    /// Marks the latest message of each conversation in `location` unread.
    pub async fn mark_unread(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        location: &Location,
    ) -> ActionResult {
        let action = RemoteAction::MarkUnread {
            conversation_ids: ids.to_vec(),
            location_id: location.label_id().to_string(),
        };
        self.apply(account_id, ids, action, |conversation, messages| {
            mutation::mark_unread(conversation, messages, location)
        })
        .await
    }

    /// Stars the conversations.
    pub async fn star(&self, account_id: AccountId, ids: &[ConversationId]) -> ActionResult {
        self.label(account_id, ids, system_labels::STARRED).await
    }

    /// Unstars the conversations.
    pub async fn unstar(&self, account_id: AccountId, ids: &[ConversationId]) -> ActionResult {
        self.unlabel(account_id, ids, system_labels::STARRED).await
    }

    /// Applies `label_id` to the conversations.
    pub async fn label(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        label_id: &str,
    ) -> ActionResult {
        let action = RemoteAction::Label {
            conversation_ids: ids.to_vec(),
            label_id: label_id.to_string(),
        };
        self.apply(account_id, ids, action, |conversation, messages| {
            mutation::add_label(conversation, messages, label_id)
        })
        .await
    }

    /// Removes `label_id` from the conversations.
    pub async fn unlabel(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        label_id: &str,
    ) -> ActionResult {
        let action = RemoteAction::Unlabel {
            conversation_ids: ids.to_vec(),
            label_id: label_id.to_string(),
        };
        self.apply(account_id, ids, action, |conversation, messages| {
            mutation::remove_label(conversation, messages, label_id)
        })
        .await
    }

    /// Moves the conversations into `folder_id`.
    pub async fn move_to_folder(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        folder_id: &str,
    ) -> ActionResult {
        let custom_folders: BTreeSet<String> = match self.store.folder_ids(account_id).await {
            Ok(folders) => folders,
            Err(e) => {
                warn!("Failed to load folders for account {account_id}: {e}");
                return ActionResult::Error;
            }
        };
        let action = RemoteAction::Move {
            conversation_ids: ids.to_vec(),
            folder_id: folder_id.to_string(),
        };
        self.apply(account_id, ids, action, |conversation, messages| {
            mutation::move_to_folder(conversation, messages, folder_id, &custom_folders)
        })
        .await
    }

    /// Deletes the messages of the conversations found in `current_folder_id`.
    pub async fn delete(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        current_folder_id: &str,
    ) -> ActionResult {
        let action = RemoteAction::Delete {
            conversation_ids: ids.to_vec(),
            folder_id: current_folder_id.to_string(),
        };
        self.apply(account_id, ids, action, |conversation, messages| {
            mutation::delete(conversation, messages, current_folder_id)
        })
        .await
    }

    /// Applies `mutate` to each conversation in turn, then queues `action`.
    ///
    /// Stops at the first conversation that cannot be updated. Conversations
    /// before it keep their changes, and `action` is queued either way so the
    /// server sees what was committed.
    async fn apply<F>(
        &self,
        account_id: AccountId,
        ids: &[ConversationId],
        action: RemoteAction,
        mutate: F,
    ) -> ActionResult
    where
        F: Fn(Conversation, Vec<Message>) -> Mutation,
    {
        let mut result = ActionResult::Success;
        for id in ids {
            if let Err(e) = self.apply_one(account_id, id, &mutate).await {
                warn!("{} failed for conversation {id}: {e}", action.type_str());
                result = ActionResult::Error;
                break;
            }
        }

        if let Err(e) = self.actions.enqueue(account_id, action).await {
            warn!("Failed to queue remote action: {e}");
            return ActionResult::Error;
        }
        result
    }

    async fn apply_one<F>(
        &self,
        account_id: AccountId,
        id: &ConversationId,
        mutate: &F,
    ) -> Result<()>
    where
        F: Fn(Conversation, Vec<Message>) -> Mutation,
    {
        let conversation = self
            .store
            .get_conversation(account_id, id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let messages = self.store.list_messages(account_id, id).await?;

        let mutation = mutate(conversation, messages);
        self.store.commit(account_id, mutation.into_batch()).await
    }
}

/// Stored conversations carrying the requested label, highest order first.
async fn local_conversations(
    store: &MailboxStore,
    params: &ConversationListParams,
) -> Result<Vec<Conversation>> {
    let conversations = store.list_conversations(params.account_id).await?;
    Ok(conversations
        .into_iter()
        .filter(|c| c.has_label(&params.label_id))
        .filter(|c| params.end.is_none_or(|end| c.order < end))
        .collect())
}
