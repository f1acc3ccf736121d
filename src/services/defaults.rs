use sqlx::SqlitePool;

use crate::db::{CategoryRepository, GiverRepository};
use crate::error::AppResult;

/// Categories every new account starts with.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Food", "Cosmetics", "Household", "Other"];

/// Givers every new account starts with.
pub const DEFAULT_GIVERS: [&str; 2] = ["Father", "Mother"];

/// Insert any missing default categories and givers for the account.
///
/// Called on registration and on every login. Name-keyed, so a record that
/// already exists (seeded earlier, or recreated by the user under the same
/// name) is never duplicated.
pub async fn ensure_default_records(pool: &SqlitePool, user_id: &str) -> AppResult<()> {
    let existing: Vec<String> = CategoryRepository::list_by_user(pool, user_id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    for name in DEFAULT_CATEGORIES {
        if !existing.iter().any(|n| n == name) {
            CategoryRepository::create(pool, user_id, name).await?;
        }
    }

    let existing: Vec<String> = GiverRepository::list_by_user(pool, user_id)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect();
    for name in DEFAULT_GIVERS {
        if !existing.iter().any(|n| n == name) {
            GiverRepository::create(pool, user_id, name, None).await?;
        }
    }

    Ok(())
}
