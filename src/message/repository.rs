use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::models::{Mailbox, MessageFilter, MessageModel, NewMessage};
use crate::db::{db_error, InMemoryDatabase};
use crate::pagination::{Page, PageRequest};
use crate::shared::AppError;

/// Trait for message repository operations
#[async_trait]
pub trait MessageRepository {
    /// Persists the message and returns it with its generated id
    async fn create_message(&self, message: NewMessage) -> Result<MessageModel, AppError>;

    /// One page of the `owner`'s inbox or outbox, in id order
    async fn find_mailbox_page(
        &self,
        owner: &str,
        mailbox: Mailbox,
        filter: Option<&MessageFilter>,
        request: PageRequest,
    ) -> Result<Page<MessageModel>, AppError>;
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    database: InMemoryDatabase,
}

impl InMemoryMessageRepository {
    pub fn new(database: InMemoryDatabase) -> Self {
        Self { database }
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message), fields(sender = %message.sender, receiver = %message.receiver))]
    async fn create_message(&self, message: NewMessage) -> Result<MessageModel, AppError> {
        let mut tables = self.database.write().await;
        let id = tables.next_message_id();
        let stored = message.with_id(id);
        tables.messages.push(stored.clone());

        debug!(message_id = id, "Message stored in memory");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn find_mailbox_page(
        &self,
        owner: &str,
        mailbox: Mailbox,
        filter: Option<&MessageFilter>,
        request: PageRequest,
    ) -> Result<Page<MessageModel>, AppError> {
        let tables = self.database.read().await;
        let matching = tables
            .messages
            .iter()
            .filter(|m| mailbox.owner_of(m) == owner)
            .filter(|m| filter.map_or(true, |f| f.matches(m)))
            .cloned();

        let page = request.slice(matching);
        debug!(
            total = page.total_elements,
            returned = page.number_of_elements,
            "Listed mailbox from memory"
        );
        Ok(page)
    }
}

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_mailbox_clause(
    builder: &mut QueryBuilder<'_, Postgres>,
    owner: &str,
    mailbox: Mailbox,
    filter: Option<&MessageFilter>,
) {
    builder
        .push(format!(" WHERE {} = ", mailbox.owner_column()))
        .push_bind(owner.to_string());

    if let Some(filter) = filter {
        builder
            .push(format!(" AND strpos(LOWER({}), LOWER(", filter.column()))
            .push_bind(filter.needle().to_string())
            .push(")) > 0");
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message), fields(sender = %message.sender, receiver = %message.receiver))]
    async fn create_message(&self, message: NewMessage) -> Result<MessageModel, AppError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO messages (sender, receiver, content, timestamp) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.content)
        .bind(message.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to store message"))?;

        debug!(message_id = id, "Message stored in database");
        Ok(message.with_id(id))
    }

    #[instrument(skip(self))]
    async fn find_mailbox_page(
        &self,
        owner: &str,
        mailbox: Mailbox,
        filter: Option<&MessageFilter>,
        request: PageRequest,
    ) -> Result<Page<MessageModel>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM messages");
        push_mailbox_clause(&mut count, owner, mailbox, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count messages"))?;

        let Some(offset) = request.sql_offset() else {
            debug!(total, "Page offset beyond any row");
            return Ok(Page::new(Vec::new(), request, total.max(0) as u64));
        };

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT id, sender, receiver, content, timestamp FROM messages",
        );
        push_mailbox_clause(&mut select, owner, mailbox, filter);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(i64::from(request.size()))
            .push(" OFFSET ")
            .push_bind(offset);

        let messages = select
            .build_query_as::<MessageModel>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list messages"))?;

        debug!(total, returned = messages.len(), "Listed mailbox from database");
        Ok(Page::new(messages, request, total.max(0) as u64))
    }
}
