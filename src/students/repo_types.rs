use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Student record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub roll_no: String,
    pub name: String,
    pub class: String,
    pub is_active: bool,
    pub created_by: String, // creator email, immutable
    pub created_on: OffsetDateTime,
    pub updated_by: Option<String>,
    pub updated_on: Option<OffsetDateTime>,
}

/// Values for a new record; the store stamps nothing itself.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub roll_no: String,
    pub name: String,
    pub class: String,
    pub created_by: String,
    pub created_on: OffsetDateTime,
}
