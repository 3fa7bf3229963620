use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Session, User};
use crate::db::retry_once;
use crate::error::{AppError, Result};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; an already registered email yields `DuplicateIdentity`.
    async fn create(&self, username: &str, email: &str, password_hash: &str) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Session>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Drop sessions that expired without a logout. Returns how many went.
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pub db: PgPool,
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, username: &str, email: &str, password_hash: &str) -> Result<()> {
        let db = &self.db;
        let res = retry_once("insert user", move || {
            sqlx::query(
                r#"
                INSERT INTO users (username, email, password_hash)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .execute(db)
        })
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateIdentity)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let user = retry_once("find user", move || {
            sqlx::query_as::<_, User>(
                r#"
                SELECT username, email, password_hash
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(db)
        })
        .await?;
        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgSessionStore {
    pub db: PgPool,
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let db = &self.db;
        retry_once("insert session", move || {
            sqlx::query(
                r#"
                INSERT INTO sessions (id, email, username, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(session.id)
            .bind(&session.email)
            .bind(&session.username)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(db)
        })
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>> {
        let db = &self.db;
        let session = retry_once("find session", move || {
            sqlx::query_as::<_, Session>(
                r#"
                SELECT id, email, username, created_at, expires_at
                FROM sessions
                WHERE id = $1 AND expires_at > $2
                "#,
            )
            .bind(id)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(db)
        })
        .await?;
        Ok(session)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let db = &self.db;
        retry_once("delete session", move || {
            sqlx::query("DELETE FROM sessions WHERE id = $1")
                .bind(id)
                .execute(db)
        })
        .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64> {
        let db = &self.db;
        let res = retry_once("prune sessions", move || {
            sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
                .bind(now)
                .execute(db)
        })
        .await?;
        Ok(res.rows_affected())
    }
}
