use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Stored lowercase; uniqueness is case-insensitive by construction.
    pub email: String,
    pub password_hash: String,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
