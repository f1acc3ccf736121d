use chrono::Utc;

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Giver Repository
// ============================================================================
//
// All queries are scoped by user_id: a row belonging to another account is
// indistinguishable from a missing row.

pub struct GiverRepository;

impl GiverRepository {
    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        name: &str,
        contact: Option<&str>,
    ) -> AppResult<Giver> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO givers (id, user_id, name, contact, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(contact)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(Giver {
            id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            contact: contact.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> AppResult<Option<Giver>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, contact, created_at, updated_at
            FROM givers
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::from_row))
    }

    pub async fn find_by_name(
        pool: &SqlitePool,
        user_id: &str,
        name: &str,
    ) -> AppResult<Option<Giver>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, contact, created_at, updated_at
            FROM givers
            WHERE user_id = ? AND name = ?
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::from_row))
    }

    pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Giver>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, contact, created_at, updated_at
            FROM givers
            WHERE user_id = ?
            ORDER BY name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        name: &str,
        contact: Option<&str>,
    ) -> AppResult<Giver> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE givers
            SET name = ?, contact = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name)
        .bind(contact)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Giver not found".to_string()));
        }

        Self::find_by_id(pool, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Giver not found".to_string()))
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM givers
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Giver not found".to_string()));
        }

        Ok(())
    }

    fn from_row(r: sqlx::sqlite::SqliteRow) -> Giver {
        Giver {
            id: r.get("id"),
            user_id: r.get("user_id"),
            name: r.get("name"),
            contact: r.get("contact"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
