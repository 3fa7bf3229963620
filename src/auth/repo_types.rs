use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,      // display label
    pub email: String,         // identity key
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, never rendered
}

/// Server-side session row; the cookie only carries its id.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
