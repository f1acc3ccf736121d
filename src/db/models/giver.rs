use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person who gave gifts. Owned by exactly one user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Giver {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub contact: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
