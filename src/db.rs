use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, instrument, warn};

use crate::message::models::MessageModel;
use crate::shared::AppError;
use crate::user::models::UserModel;

/// Both relations of the in-memory store
///
/// Users keep insertion order and messages keep id order, which is the
/// natural order the list endpoints page over.
#[derive(Debug, Default)]
pub struct Tables {
    pub users: Vec<UserModel>,
    pub messages: Vec<MessageModel>,
    pub last_message_id: i64,
}

impl Tables {
    pub fn next_message_id(&mut self) -> i64 {
        self.last_message_id += 1;
        self.last_message_id
    }
}

/// In-memory database shared by the in-memory repositories
///
/// One lock guards both relations so a multi-table mutation is atomic
/// with respect to every reader.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

/// Maps a sqlx failure to `DatabaseError`, logging it under `context`
pub fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}

/// Connects to PostgreSQL and applies pending migrations
#[instrument(skip(database_url))]
pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to connect to database");
            AppError::DatabaseError(e.to_string())
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to run database migrations");
            AppError::DatabaseError(e.to_string())
        })?;

    info!("Database connected and migrated");
    Ok(pool)
}
