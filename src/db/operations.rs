use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::db::models::{
    Message, NewMessage, NewTicket, NewUser, Ticket, TicketChanges, TicketFilter, User,
    UserChanges, DEFAULT_TICKET_STATUS,
};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, email, hashed_password, full_name, is_active, is_agent, created_at, updated_at";
const TICKET_COLUMNS: &str =
    "id, title, description, status, creator_id, assignee_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, ticket_id, author_id, content, created_at";

#[derive(Clone)]
pub struct DbOperations {
    pool: SqlitePool,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout);

        // Every new connection to `:memory:` is a fresh empty database, so keep exactly one alive.
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| crate::error::DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ---- users ----

    pub async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, hashed_password, full_name, is_active, is_agent, created_at, updated_at)
             VALUES (?, ?, ?, 1, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.is_agent)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Returns the user with `email`, inserting it first if it does not exist.
    pub async fn get_or_create_user(&self, user: &NewUser) -> Result<(User, bool), AppError> {
        if let Some(existing) = self.get_user_by_email(&user.email).await? {
            return Ok((existing, false));
        }
        match self.create_user(user).await {
            Ok(created) => Ok((created, true)),
            // Lost a race with a concurrent insert of the same email.
            Err(AppError::DatabaseError(crate::error::DatabaseError::Duplicate)) => {
                let existing = self
                    .get_user_by_email(&user.email)
                    .await?
                    .ok_or(AppError::DatabaseError(crate::error::DatabaseError::NotFound))?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET full_name = COALESCE(?, full_name),
                 hashed_password = COALESCE(?, hashed_password),
                 updated_at = ?
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&changes.full_name)
        .bind(&changes.hashed_password)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    // ---- tickets ----

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, AppError> {
        let now = Utc::now();
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (title, description, status, creator_id, assignee_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(DEFAULT_TICKET_STATUS)
        .bind(ticket.creator_id)
        .bind(ticket.assignee_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    pub async fn get_ticket_by_id(&self, id: i64) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Newest first.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, AppError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE 1 = 1"));

        if let Some(status) = &filter.status {
            query.push(" AND status = ").push_bind(status.clone());
        }
        if let Some(creator_id) = filter.creator_id {
            query.push(" AND creator_id = ").push_bind(creator_id);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let tickets = query
            .build_query_as::<Ticket>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    pub async fn update_ticket(&self, id: i64, changes: &TicketChanges) -> Result<Ticket, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "UPDATE tickets
             SET title = COALESCE(?, title),
                 description = COALESCE(?, description),
                 status = COALESCE(?, status),
                 assignee_id = COALESCE(?, assignee_id),
                 updated_at = ?
             WHERE id = ?
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.status)
        .bind(changes.assignee_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    // ---- messages ----

    pub async fn create_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (ticket_id, author_id, content, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.ticket_id)
        .bind(message.author_id)
        .bind(&message.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Oldest first.
    pub async fn list_messages_for_ticket(&self, ticket_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE ticket_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
