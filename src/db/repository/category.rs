use chrono::Utc;

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Category Repository
// ============================================================================

pub struct CategoryRepository;

impl CategoryRepository {
    pub async fn create(pool: &SqlitePool, user_id: &str, name: &str) -> AppResult<Category> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO categories (id, user_id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(Category {
            id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> AppResult<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM categories
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
    ) -> AppResult<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM categories
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

    pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM categories
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
    ) -> AppResult<Category> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        Self::find_by_id(pool, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        Ok(())
    }

    fn from_row(r: sqlx::sqlite::SqliteRow) -> Category {
        Category {
            id: r.get("id"),
            user_id: r.get("user_id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
