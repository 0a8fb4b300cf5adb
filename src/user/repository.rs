use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};

use super::models::{UserFilter, UserModel};
use crate::db::{db_error, InMemoryDatabase};
use crate::pagination::{Page, PageRequest};
use crate::shared::AppError;

/// Counts reported by the user-delete cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemovalSummary {
    pub sent_rewritten: u64,
    pub received_rewritten: u64,
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError>;
    async fn find_page(
        &self,
        filter: Option<&UserFilter>,
        request: PageRequest,
    ) -> Result<Page<UserModel>, AppError>;
    async fn list_usernames(&self) -> Result<Vec<String>, AppError>;

    /// Replaces the row currently keyed by `username` with `user`
    async fn update_user(&self, username: &str, user: &UserModel) -> Result<(), AppError>;

    /// Atomically rewrites sender and receiver of every message that names
    /// `username` to `sentinel`, then deletes the user row
    async fn remove_user(
        &self,
        username: &str,
        sentinel: &str,
    ) -> Result<RemovalSummary, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    database: InMemoryDatabase,
}

impl InMemoryUserRepository {
    pub fn new(database: InMemoryDatabase) -> Self {
        Self { database }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut tables = self.database.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            warn!("User already exists in memory");
            return Err(AppError::DatabaseError(format!(
                "duplicate username {}",
                user.username
            )));
        }
        tables.users.push(user.clone());

        debug!("User created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let tables = self.database.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    #[instrument(skip(self))]
    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        let tables = self.database.read().await;
        Ok(tables.users.iter().any(|u| u.username == username))
    }

    #[instrument(skip(self))]
    async fn find_page(
        &self,
        filter: Option<&UserFilter>,
        request: PageRequest,
    ) -> Result<Page<UserModel>, AppError> {
        let tables = self.database.read().await;
        let matching = tables
            .users
            .iter()
            .filter(|u| filter.map_or(true, |f| f.matches(u)))
            .cloned();

        let page = request.slice(matching);
        debug!(
            total = page.total_elements,
            returned = page.number_of_elements,
            "Listed users from memory"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn list_usernames(&self) -> Result<Vec<String>, AppError> {
        let tables = self.database.read().await;
        Ok(tables.users.iter().map(|u| u.username.clone()).collect())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, username: &str, user: &UserModel) -> Result<(), AppError> {
        let mut tables = self.database.write().await;

        if user.username != username && tables.users.iter().any(|u| u.username == user.username)
        {
            warn!(new_username = %user.username, "Rename collides with existing user");
            return Err(AppError::DatabaseError(format!(
                "duplicate username {}",
                user.username
            )));
        }

        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
        *slot = user.clone();

        debug!("User updated in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_user(
        &self,
        username: &str,
        sentinel: &str,
    ) -> Result<RemovalSummary, AppError> {
        let mut tables = self.database.write().await;

        let position = tables
            .users
            .iter()
            .position(|u| u.username == username)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        let mut summary = RemovalSummary::default();
        for message in tables.messages.iter_mut() {
            if message.sender == username {
                message.sender = sentinel.to_string();
                summary.sent_rewritten += 1;
            }
            if message.receiver == username {
                message.receiver = sentinel.to_string();
                summary.received_rewritten += 1;
            }
        }
        tables.users.remove(position);

        info!(?summary, "User removed from memory");
        Ok(summary)
    }
}

const USER_COLUMNS: &str =
    "username, password, name, surname, birthdate, gender, email, location, is_admin";

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: Option<&UserFilter>) {
    let Some(filter) = filter else {
        return;
    };

    builder.push(" WHERE ");
    match filter {
        UserFilter::Contains(column, needle) => {
            builder
                .push(format!("strpos(LOWER({}), LOWER(", column.column()))
                .push_bind(needle.clone())
                .push(")) > 0");
        }
        UserFilter::GenderIs(gender) => {
            builder
                .push("LOWER(gender) = LOWER(")
                .push_bind(gender.clone())
                .push(")");
        }
        UserFilter::BirthdateContains(needle) => {
            builder
                .push("strpos(CAST(birthdate AS TEXT), ")
                .push_bind(needle.clone())
                .push(") > 0");
        }
        UserFilter::IsAdmin(admin) => {
            builder.push("is_admin = ").push_bind(*admin);
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (username, password, name, surname, birthdate, gender, email, location, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(user.birthdate)
        .bind(&user.gender)
        .bind(&user.email)
        .bind(&user.location)
        .bind(user.admin)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create user in database"))?;

        debug!("User created in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch user from database"))
    }

    #[instrument(skip(self))]
    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check user existence"))
    }

    #[instrument(skip(self))]
    async fn find_page(
        &self,
        filter: Option<&UserFilter>,
        request: PageRequest,
    ) -> Result<Page<UserModel>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count users"))?;

        let Some(offset) = request.sql_offset() else {
            debug!(total, "Page offset beyond any row");
            return Ok(Page::new(Vec::new(), request, total.max(0) as u64));
        };

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(i64::from(request.size()))
            .push(" OFFSET ")
            .push_bind(offset);

        let users = select
            .build_query_as::<UserModel>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list users"))?;

        debug!(total, returned = users.len(), "Listed users from database");
        Ok(Page::new(users, request, total.max(0) as u64))
    }

    #[instrument(skip(self))]
    async fn list_usernames(&self) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list usernames"))
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, username: &str, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, password = $3, name = $4, surname = $5, birthdate = $6, \
             gender = $7, email = $8, location = $9, is_admin = $10 WHERE username = $1",
        )
        .bind(username)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(user.birthdate)
        .bind(&user.gender)
        .bind(&user.email)
        .bind(&user.location)
        .bind(user.admin)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update user in database"))?;

        if result.rows_affected() == 0 {
            warn!("User not found for update");
            return Err(AppError::NotFound(format!("User {} not found", username)));
        }

        debug!("User updated in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_user(
        &self,
        username: &str,
        sentinel: &str,
    ) -> Result<RemovalSummary, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to open transaction"))?;

        let sent_rewritten = sqlx::query("UPDATE messages SET sender = $1 WHERE sender = $2")
            .bind(sentinel)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to rewrite sent messages"))?
            .rows_affected();

        let received_rewritten =
            sqlx::query("UPDATE messages SET receiver = $1 WHERE receiver = $2")
                .bind(sentinel)
                .bind(username)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to rewrite received messages"))?
                .rows_affected();

        let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete user"))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back transaction"))?;
            return Err(AppError::NotFound(format!("User {} not found", username)));
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit user removal"))?;

        let summary = RemovalSummary {
            sent_rewritten,
            received_rewritten,
        };
        info!(?summary, "User removed from database");
        Ok(summary)
    }
}
