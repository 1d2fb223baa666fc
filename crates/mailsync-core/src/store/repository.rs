//! Mailbox storage repository.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{StoreChange, StoreOp, WriteBatch};
use crate::model::{
    Conversation, ConversationId, CounterKind, Label, LabelKind, Message, MessageId, UnreadCounter,
};
use crate::config::SyncConfig;
use crate::remote::{ActionQueue, RemoteAction};
use crate::{AccountId, Result};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A remote action waiting to be replayed against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    /// Queue row id.
    pub id: i64,
    /// Owning account.
    pub account_id: AccountId,
    /// The action.
    pub action: RemoteAction,
    /// When it was queued.
    pub queued_at: DateTime<Utc>,
}

/// Repository for conversations, messages, labels, unread counters and
/// pending remote actions.
pub struct MailboxStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
}

/// Change notifications collected while a transaction is open.
#[derive(Default)]
struct ChangeSet {
    conversations: BTreeSet<ConversationId>,
    counters: Vec<CounterKind>,
    labels: bool,
    reset: bool,
}

impl ChangeSet {
    fn counters(&mut self, kind: CounterKind) {
        if !self.counters.contains(&kind) {
            self.counters.push(kind);
        }
    }

    fn into_changes(self, account_id: AccountId) -> Vec<StoreChange> {
        let mut changes = Vec::new();
        if self.reset {
            changes.push(StoreChange::Reset { account_id });
        }
        if !self.conversations.is_empty() {
            changes.push(StoreChange::Conversations {
                account_id,
                ids: self.conversations,
            });
        }
        for kind in self.counters {
            changes.push(StoreChange::Counters { account_id, kind });
        }
        if self.labels {
            changes.push(StoreChange::Labels { account_id });
        }
        changes
    }
}

impl MailboxStore {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        Self::with_pool(pool).await
    }

    /// Opens the database at `config.database_path`, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub async fn from_config(config: &SyncConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        info!("Opening mailbox store at {:?}", config.database_path);
        Self::new(&config.database_path_str()).await
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let repo = Self { pool, changes };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                account_id INTEGER NOT NULL,
                id TEXT NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                senders TEXT NOT NULL DEFAULT '[]',
                recipients TEXT NOT NULL DEFAULT '[]',
                num_messages INTEGER NOT NULL DEFAULT 0,
                num_unread INTEGER NOT NULL DEFAULT 0,
                num_attachments INTEGER NOT NULL DEFAULT 0,
                expiration_time INTEGER NOT NULL DEFAULT 0,
                size INTEGER NOT NULL DEFAULT 0,
                labels TEXT NOT NULL DEFAULT '{}',
                sort_order INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (account_id, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                account_id INTEGER NOT NULL,
                id TEXT NOT NULL,
                conversation_id TEXT NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                unread INTEGER NOT NULL DEFAULT 0,
                sender TEXT NOT NULL DEFAULT '{}',
                recipients TEXT NOT NULL DEFAULT '[]',
                time INTEGER NOT NULL DEFAULT 0,
                size INTEGER NOT NULL DEFAULT 0,
                num_attachments INTEGER NOT NULL DEFAULT 0,
                expiration_time INTEGER NOT NULL DEFAULT 0,
                is_replied INTEGER NOT NULL DEFAULT 0,
                is_replied_all INTEGER NOT NULL DEFAULT 0,
                is_forwarded INTEGER NOT NULL DEFAULT 0,
                label_ids TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (account_id, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS unread_counters (
                account_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                label_id TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (account_id, kind, label_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS labels (
                account_id INTEGER NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL DEFAULT 'label',
                PRIMARY KEY (account_id, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS pending_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                action_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                queued_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for efficient lookups
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_conversations_order
            ON conversations(account_id, sort_order DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(account_id, conversation_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_pending_actions_account
            ON pending_actions(account_id, id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Subscribe to change notifications for every commit after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn publish(&self, changes: Vec<StoreChange>) {
        for change in changes {
            // No receivers is not an error.
            let _ = self.changes.send(change);
        }
    }

    /// Applies every write in `batch` in a single transaction, then notifies
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is committed in that case.
    pub async fn commit(&self, account_id: AccountId, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let ops = batch.len();
        let mut tx = self.pool.begin().await?;
        let mut changes = ChangeSet::default();
        for op in batch {
            apply_op(&mut tx, account_id, op, &mut changes).await?;
        }
        tx.commit().await?;

        debug!("Committed {ops} store writes for account {account_id}");
        self.publish(changes.into_changes(account_id));
        Ok(())
    }

    /// Insert or replace conversations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert_conversations(
        &self,
        account_id: AccountId,
        conversations: &[Conversation],
    ) -> Result<()> {
        let batch = conversations
            .iter()
            .cloned()
            .map(StoreOp::UpsertConversation)
            .collect();
        self.commit(account_id, batch).await
    }

    /// Replace the full set of counters of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn replace_counters(
        &self,
        account_id: AccountId,
        kind: CounterKind,
        counters: Vec<UnreadCounter>,
    ) -> Result<()> {
        let batch = WriteBatch::new().with(StoreOp::ReplaceCounters { kind, counters });
        self.commit(account_id, batch).await
    }

    /// Get a conversation without its messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_conversation(
        &self,
        account_id: AccountId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT account_id, id, subject, senders, recipients, num_messages, num_unread,
                   num_attachments, expiration_time, size, labels, sort_order
            FROM conversations
            WHERE account_id = ? AND id = ?
            ",
        )
        .bind(account_id.0)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_conversation).transpose()
    }

    /// Get a conversation with its messages joined.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_conversation(
        &self,
        account_id: AccountId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>> {
        let Some(conversation) = self.get_conversation(account_id, id).await? else {
            return Ok(None);
        };
        let messages = self.list_messages(account_id, id).await?;
        Ok(Some(conversation.with_messages(messages)))
    }

    /// List every conversation of the account, highest order first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_conversations(&self, account_id: AccountId) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(
            r"
            SELECT account_id, id, subject, senders, recipients, num_messages, num_unread,
                   num_attachments, expiration_time, size, labels, sort_order
            FROM conversations
            WHERE account_id = ?
            ORDER BY sort_order DESC, id ASC
            ",
        )
        .bind(account_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_conversation).collect()
    }

    /// List messages of a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_messages(
        &self,
        account_id: AccountId,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, subject, unread, sender, recipients, time, size,
                   num_attachments, expiration_time, is_replied, is_replied_all,
                   is_forwarded, label_ids
            FROM messages
            WHERE account_id = ? AND conversation_id = ?
            ORDER BY time ASC, id ASC
            ",
        )
        .bind(account_id.0)
        .bind(conversation_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    /// Get a single message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_message(&self, account_id: AccountId, id: &MessageId) -> Result<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT id, conversation_id, subject, unread, sender, recipients, time, size,
                   num_attachments, expiration_time, is_replied, is_replied_all,
                   is_forwarded, label_ids
            FROM messages
            WHERE account_id = ? AND id = ?
            ",
        )
        .bind(account_id.0)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_message).transpose()
    }

    /// List the unread counters of `kind`, ordered by label id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_counters(
        &self,
        account_id: AccountId,
        kind: CounterKind,
    ) -> Result<Vec<UnreadCounter>> {
        let rows = sqlx::query(
            r"
            SELECT label_id, count
            FROM unread_counters
            WHERE account_id = ? AND kind = ?
            ORDER BY label_id ASC
            ",
        )
        .bind(account_id.0)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| UnreadCounter {
                account_id,
                kind,
                label_id: row.get("label_id"),
                count: row.get::<u32, _>("count"),
            })
            .collect())
    }

    /// List the registry labels of the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_labels(&self, account_id: AccountId) -> Result<Vec<Label>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, kind
            FROM labels
            WHERE account_id = ?
            ORDER BY name ASC
            ",
        )
        .bind(account_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Label {
                id: row.get("id"),
                name: row.get("name"),
                kind: LabelKind::parse(row.get::<&str, _>("kind")),
            })
            .collect())
    }

    /// Get a registry label by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_label(&self, account_id: AccountId, id: &str) -> Result<Option<Label>> {
        let row = sqlx::query(r"SELECT id, name, kind FROM labels WHERE account_id = ? AND id = ?")
            .bind(account_id.0)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Label {
            id: row.get("id"),
            name: row.get("name"),
            kind: LabelKind::parse(row.get::<&str, _>("kind")),
        }))
    }

    /// Ids of the account's custom folders.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn folder_ids(&self, account_id: AccountId) -> Result<BTreeSet<String>> {
        let rows = sqlx::query(r"SELECT id FROM labels WHERE account_id = ? AND kind = 'folder'")
            .bind(account_id.0)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<String, _>("id")).collect())
    }

    /// Queue a remote action.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the action cannot be serialized.
    pub async fn enqueue_action(&self, account_id: AccountId, action: &RemoteAction) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO pending_actions (account_id, action_type, payload, queued_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(account_id.0)
        .bind(action.type_str())
        .bind(serde_json::to_string(action)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            "Queued {} action for {} conversations",
            action.type_str(),
            action.conversation_ids().len()
        );
        Ok(result.last_insert_rowid())
    }

    /// List pending actions of the account in queue order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_actions(&self, account_id: AccountId) -> Result<Vec<PendingAction>> {
        let rows = sqlx::query(
            r"
            SELECT id, account_id, payload, queued_at
            FROM pending_actions
            WHERE account_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(account_id.0)
        .fetch_all(&self.pool)
        .await?;

        let actions = rows
            .iter()
            .filter_map(|row| {
                let payload: String = row.get("payload");
                let action = match serde_json::from_str(&payload) {
                    Ok(action) => action,
                    Err(e) => {
                        warn!("Skipping unreadable pending action: {e}");
                        return None;
                    }
                };
                let queued_at_str: String = row.get("queued_at");
                let queued_at = DateTime::parse_from_rfc3339(&queued_at_str)
                    .ok()?
                    .with_timezone(&Utc);

                Some(PendingAction {
                    id: row.get("id"),
                    account_id: AccountId(row.get::<i64, _>("account_id")),
                    action,
                    queued_at,
                })
            })
            .collect();

        Ok(actions)
    }

    /// Remove a pending action once the server acknowledged it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove_action(&self, id: i64) -> Result<()> {
        sqlx::query(r"DELETE FROM pending_actions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete every row belonging to an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_account(&self, account_id: AccountId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in [
            "conversations",
            "messages",
            "unread_counters",
            "labels",
            "pending_actions",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE account_id = ?"))
                .bind(account_id.0)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("Cleared stored mailbox for account {account_id}");
        self.publish(vec![
            StoreChange::Reset { account_id },
            StoreChange::Labels { account_id },
        ]);
        Ok(())
    }
}

#[async_trait]
impl ActionQueue for MailboxStore {
    async fn enqueue(&self, account_id: AccountId, action: RemoteAction) -> Result<()> {
        self.enqueue_action(account_id, &action).await.map(|_| ())
    }
}

async fn apply_op(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    op: StoreOp,
    changes: &mut ChangeSet,
) -> Result<()> {
    match op {
        StoreOp::ClearMailbox => {
            for table in ["conversations", "messages", "unread_counters"] {
                sqlx::query(&format!("DELETE FROM {table} WHERE account_id = ?"))
                    .bind(account_id.0)
                    .execute(&mut *conn)
                    .await?;
            }
            changes.reset = true;
        }
        StoreOp::UpsertConversation(conversation) => {
            upsert_conversation(conn, account_id, &conversation).await?;
            changes.conversations.insert(conversation.id);
        }
        StoreOp::DeleteConversation(id) => {
            sqlx::query(r"DELETE FROM messages WHERE account_id = ? AND conversation_id = ?")
                .bind(account_id.0)
                .bind(id.as_str())
                .execute(&mut *conn)
                .await?;
            sqlx::query(r"DELETE FROM conversations WHERE account_id = ? AND id = ?")
                .bind(account_id.0)
                .bind(id.as_str())
                .execute(&mut *conn)
                .await?;
            changes.conversations.insert(id);
        }
        StoreOp::UpsertMessage(message) => {
            upsert_message(conn, account_id, &message).await?;
            changes.conversations.insert(message.conversation_id);
        }
        StoreOp::DeleteMessage(id) => {
            let row = sqlx::query(
                r"DELETE FROM messages WHERE account_id = ? AND id = ? RETURNING conversation_id",
            )
            .bind(account_id.0)
            .bind(id.as_str())
            .fetch_optional(&mut *conn)
            .await?;
            if let Some(row) = row {
                changes
                    .conversations
                    .insert(ConversationId(row.get("conversation_id")));
            }
        }
        StoreOp::UpsertLabel(label) => {
            sqlx::query(
                r"
                INSERT INTO labels (account_id, id, name, kind)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(account_id, id) DO UPDATE SET
                    name = excluded.name,
                    kind = excluded.kind
                ",
            )
            .bind(account_id.0)
            .bind(&label.id)
            .bind(&label.name)
            .bind(label.kind.as_str())
            .execute(&mut *conn)
            .await?;
            changes.labels = true;
        }
        StoreOp::DeleteLabel(id) => {
            sqlx::query(r"DELETE FROM labels WHERE account_id = ? AND id = ?")
                .bind(account_id.0)
                .bind(&id)
                .execute(&mut *conn)
                .await?;
            changes.labels = true;
        }
        StoreOp::ReplaceCounters { kind, counters } => {
            sqlx::query(r"DELETE FROM unread_counters WHERE account_id = ? AND kind = ?")
                .bind(account_id.0)
                .bind(kind.as_str())
                .execute(&mut *conn)
                .await?;
            for counter in &counters {
                sqlx::query(
                    r"
                    INSERT INTO unread_counters (account_id, kind, label_id, count)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(account_id, kind, label_id) DO UPDATE SET
                        count = excluded.count
                    ",
                )
                .bind(account_id.0)
                .bind(kind.as_str())
                .bind(&counter.label_id)
                .bind(counter.count)
                .execute(&mut *conn)
                .await?;
            }
            changes.counters(kind);
        }
    }
    Ok(())
}

async fn upsert_conversation(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    conversation: &Conversation,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO conversations
            (account_id, id, subject, senders, recipients, num_messages, num_unread,
             num_attachments, expiration_time, size, labels, sort_order)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(account_id, id) DO UPDATE SET
            subject = excluded.subject,
            senders = excluded.senders,
            recipients = excluded.recipients,
            num_messages = excluded.num_messages,
            num_unread = excluded.num_unread,
            num_attachments = excluded.num_attachments,
            expiration_time = excluded.expiration_time,
            size = excluded.size,
            labels = excluded.labels,
            sort_order = excluded.sort_order
        ",
    )
    .bind(account_id.0)
    .bind(conversation.id.as_str())
    .bind(&conversation.subject)
    .bind(serde_json::to_string(&conversation.senders)?)
    .bind(serde_json::to_string(&conversation.recipients)?)
    .bind(conversation.num_messages)
    .bind(conversation.num_unread)
    .bind(conversation.num_attachments)
    .bind(conversation.expiration_time)
    .bind(conversation.size)
    .bind(serde_json::to_string(&conversation.labels)?)
    .bind(conversation.order)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn upsert_message(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    message: &Message,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO messages
            (account_id, id, conversation_id, subject, unread, sender, recipients, time, size,
             num_attachments, expiration_time, is_replied, is_replied_all, is_forwarded,
             label_ids)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(account_id, id) DO UPDATE SET
            conversation_id = excluded.conversation_id,
            subject = excluded.subject,
            unread = excluded.unread,
            sender = excluded.sender,
            recipients = excluded.recipients,
            time = excluded.time,
            size = excluded.size,
            num_attachments = excluded.num_attachments,
            expiration_time = excluded.expiration_time,
            is_replied = excluded.is_replied,
            is_replied_all = excluded.is_replied_all,
            is_forwarded = excluded.is_forwarded,
            label_ids = excluded.label_ids
        ",
    )
    .bind(account_id.0)
    .bind(message.id.as_str())
    .bind(message.conversation_id.as_str())
    .bind(&message.subject)
    .bind(message.unread)
    .bind(serde_json::to_string(&message.sender)?)
    .bind(serde_json::to_string(&message.recipients)?)
    .bind(message.time)
    .bind(message.size)
    .bind(message.num_attachments)
    .bind(message.expiration_time)
    .bind(message.is_replied)
    .bind(message.is_replied_all)
    .bind(message.is_forwarded)
    .bind(serde_json::to_string(&message.label_ids)?)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.get(column);
    Ok(serde_json::from_str(&raw)?)
}

fn row_to_conversation(row: &SqliteRow) -> Result<Conversation> {
    Ok(Conversation {
        id: ConversationId(row.get("id")),
        account_id: AccountId(row.get::<i64, _>("account_id")),
        subject: row.get("subject"),
        senders: json_column(row, "senders")?,
        recipients: json_column(row, "recipients")?,
        num_messages: row.get::<u32, _>("num_messages"),
        num_unread: row.get::<u32, _>("num_unread"),
        num_attachments: row.get::<u32, _>("num_attachments"),
        expiration_time: row.get("expiration_time"),
        size: row.get("size"),
        labels: json_column(row, "labels")?,
        order: row.get("sort_order"),
        messages: None,
    })
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    Ok(Message {
        id: MessageId(row.get("id")),
        conversation_id: ConversationId(row.get("conversation_id")),
        subject: row.get("subject"),
        unread: row.get::<bool, _>("unread"),
        sender: json_column(row, "sender")?,
        recipients: json_column(row, "recipients")?,
        time: row.get("time"),
        size: row.get("size"),
        num_attachments: row.get::<u32, _>("num_attachments"),
        expiration_time: row.get("expiration_time"),
        is_replied: row.get::<bool, _>("is_replied"),
        is_replied_all: row.get::<bool, _>("is_replied_all"),
        is_forwarded: row.get::<bool, _>("is_forwarded"),
        label_ids: json_column(row, "label_ids")?,
    })
}
