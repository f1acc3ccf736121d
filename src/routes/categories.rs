use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{Category, CategoryRepository};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            axum::routing::put(update_category).delete(delete_category),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_categories(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let categories = CategoryRepository::list_by_user(&state.db, &user.id).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CategoryPayload>,
) -> AppResult<Json<CategoryResponse>> {
    let name = validated_name(&payload)?;
    let category = CategoryRepository::create(&state.db, &user.id, &name).await?;
    Ok(Json(category.into()))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(category_id): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> AppResult<Json<CategoryResponse>> {
    let name = validated_name(&payload)?;
    let category = CategoryRepository::update(&state.db, &user.id, &category_id, &name).await?;
    Ok(Json(category.into()))
}

/// Delete a category. Gifts that referenced it keep their rows with the
/// reference nulled (schema-level SET NULL).
async fn delete_category(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(category_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    CategoryRepository::delete(&state.db, &user.id, &category_id).await?;
    Ok(Json(serde_json::json!({ "message": "Category deleted" })))
}

// ============================================================================
// Helper functions
// ============================================================================

fn validated_name(payload: &CategoryPayload) -> AppResult<String> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let payload = CategoryPayload {
            name: String::new(),
        };
        assert!(validated_name(&payload).is_err());

        let payload = CategoryPayload {
            name: " Stationery ".to_string(),
        };
        assert_eq!(validated_name(&payload).unwrap(), "Stationery");
    }
}
