use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{Giver, GiverRepository};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_givers).post(create_giver))
        .route("/:id", axum::routing::put(update_giver).delete(delete_giver))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GiverPayload {
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GiverResponse {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Giver> for GiverResponse {
    fn from(g: Giver) -> Self {
        Self {
            id: g.id,
            name: g.name,
            contact: g.contact,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_givers(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<GiverResponse>>> {
    let givers = GiverRepository::list_by_user(&state.db, &user.id).await?;
    Ok(Json(givers.into_iter().map(Into::into).collect()))
}

async fn create_giver(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<GiverPayload>,
) -> AppResult<Json<GiverResponse>> {
    let (name, contact) = validate_payload(&payload)?;
    let giver = GiverRepository::create(&state.db, &user.id, &name, contact.as_deref()).await?;
    Ok(Json(giver.into()))
}

async fn update_giver(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(giver_id): Path<String>,
    Json(payload): Json<GiverPayload>,
) -> AppResult<Json<GiverResponse>> {
    let (name, contact) = validate_payload(&payload)?;
    let giver =
        GiverRepository::update(&state.db, &user.id, &giver_id, &name, contact.as_deref()).await?;
    Ok(Json(giver.into()))
}

/// Delete a giver. Gifts that referenced it keep their rows with the
/// reference nulled (schema-level SET NULL).
async fn delete_giver(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(giver_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    GiverRepository::delete(&state.db, &user.id, &giver_id).await?;
    Ok(Json(serde_json::json!({ "message": "Giver deleted" })))
}

// ============================================================================
// Helper functions
// ============================================================================

fn validate_payload(payload: &GiverPayload) -> AppResult<(String, Option<String>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let contact = payload
        .contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string());
    Ok((name.to_string(), contact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let payload = GiverPayload {
            name: "   ".to_string(),
            contact: None,
        };
        assert!(validate_payload(&payload).is_err());
    }

    #[test]
    fn name_and_contact_are_trimmed() {
        let payload = GiverPayload {
            name: " Aunt May ".to_string(),
            contact: Some("  ".to_string()),
        };
        let (name, contact) = validate_payload(&payload).unwrap();
        assert_eq!(name, "Aunt May");
        assert_eq!(contact, None);
    }
}
