use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{CategoryRepository, GiftRepository, GiverRepository};
use crate::db::models::{GiftData, GiftFilter, GiftWithNames};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_gifts).post(create_gift))
        .route(
            "/:id",
            get(get_gift).put(update_gift).delete(delete_gift),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GiftPayload {
    pub title: Option<String>,
    pub memo: Option<String>,
    pub giver_id: Option<String>,
    /// Alternative to `giver_id`: the giver is looked up by name and created
    /// on the fly if missing.
    pub giver_name: Option<String>,
    pub category_id: Option<String>,
    pub received_date: Option<NaiveDate>,
    #[serde(default)]
    pub thank_you_sent: bool,
    pub return_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_done: bool,
    pub amount: Option<i64>,
}

/// Query parameters accepted by the gift listing (and the report summary,
/// which filters the same way).
#[derive(Debug, Default, Deserialize)]
pub struct GiftListQuery {
    /// Substring match on the title.
    pub q: Option<String>,
    pub giver_id: Option<String>,
    pub category_id: Option<String>,
    /// `true` restricts to gifts with a pending reciprocation.
    pub todo: Option<bool>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    /// `true` restricts to gifts with a recorded amount.
    pub amount_only: Option<bool>,
}

impl From<GiftListQuery> for GiftFilter {
    fn from(q: GiftListQuery) -> Self {
        GiftFilter {
            title_query: q.q.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            giver_id: q.giver_id.filter(|s| !s.is_empty()),
            category_id: q.category_id.filter(|s| !s.is_empty()),
            pending_return_only: q.todo.unwrap_or(false),
            min_amount: q.min_amount,
            max_amount: q.max_amount,
            with_amount_only: q.amount_only.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GiftResponse {
    pub id: String,
    pub title: String,
    pub memo: Option<String>,
    pub giver_id: Option<String>,
    pub giver_name: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub received_date: NaiveDate,
    pub thank_you_sent: bool,
    pub return_due_date: Option<NaiveDate>,
    pub return_done: bool,
    pub amount: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<GiftWithNames> for GiftResponse {
    fn from(g: GiftWithNames) -> Self {
        Self {
            id: g.id,
            title: g.title,
            memo: g.memo,
            giver_id: g.giver_id,
            giver_name: g.giver_name,
            category_id: g.category_id,
            category_name: g.category_name,
            received_date: g.received_date,
            thank_you_sent: g.thank_you_sent,
            return_due_date: g.return_due_date,
            return_done: g.return_done,
            amount: g.amount,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Filtered listing, newest received date first.
async fn list_gifts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GiftListQuery>,
) -> AppResult<Json<Vec<GiftResponse>>> {
    let filter: GiftFilter = query.into();
    let gifts = GiftRepository::list(&state.db, &user.id, &filter).await?;
    Ok(Json(gifts.into_iter().map(Into::into).collect()))
}

async fn get_gift(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(gift_id): Path<String>,
) -> AppResult<Json<GiftResponse>> {
    let gift = GiftRepository::find_by_id(&state.db, &user.id, &gift_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift not found".to_string()))?;
    Ok(Json(gift.into()))
}

async fn create_gift(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<GiftPayload>,
) -> AppResult<Json<GiftResponse>> {
    let title = normalized_title(payload.title.as_deref())
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
    validate_amount(payload.amount)?;

    let giver_id = resolve_giver(&state, &user.id, &payload).await?;
    let category_id = resolve_category(&state, &user.id, payload.category_id.as_deref()).await?;

    let data = GiftData {
        title,
        memo: normalized_memo(payload.memo),
        giver_id,
        category_id,
        received_date: payload
            .received_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        thank_you_sent: payload.thank_you_sent,
        return_due_date: payload.return_due_date,
        return_done: payload.return_done,
        amount: payload.amount,
    };

    let created = GiftRepository::create(&state.db, &user.id, &data).await?;
    tracing::debug!("Created gift {} for user {}", created.id, user.id);

    let gift = GiftRepository::find_by_id(&state.db, &user.id, &created.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift not found".to_string()))?;
    Ok(Json(gift.into()))
}

/// Full-record update. A blank or missing title keeps the stored one; all
/// other fields are replaced by the payload.
async fn update_gift(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(gift_id): Path<String>,
    Json(payload): Json<GiftPayload>,
) -> AppResult<Json<GiftResponse>> {
    let existing = GiftRepository::find_by_id(&state.db, &user.id, &gift_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift not found".to_string()))?;

    validate_amount(payload.amount)?;

    let giver_id = resolve_giver(&state, &user.id, &payload).await?;
    let category_id = resolve_category(&state, &user.id, payload.category_id.as_deref()).await?;

    let data = GiftData {
        title: normalized_title(payload.title.as_deref()).unwrap_or(existing.title),
        memo: normalized_memo(payload.memo),
        giver_id,
        category_id,
        received_date: payload.received_date.unwrap_or(existing.received_date),
        thank_you_sent: payload.thank_you_sent,
        return_due_date: payload.return_due_date,
        return_done: payload.return_done,
        amount: payload.amount,
    };

    let updated = GiftRepository::update(&state.db, &user.id, &gift_id, &data).await?;
    Ok(Json(updated.into()))
}

async fn delete_gift(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(gift_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    GiftRepository::delete(&state.db, &user.id, &gift_id).await?;
    Ok(Json(serde_json::json!({ "message": "Gift deleted" })))
}

// ============================================================================
// Helper functions
// ============================================================================

fn normalized_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

fn normalized_memo(memo: Option<String>) -> Option<String> {
    memo.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())
}

fn validate_amount(amount: Option<i64>) -> AppResult<()> {
    if let Some(a) = amount {
        if a < 0 {
            return Err(AppError::Validation(
                "Amount must be non-negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// Resolve the gift's giver reference.
///
/// An explicit `giver_id` must point at a giver owned by the caller; a
/// `giver_name` is looked up (and created if missing) under the caller's
/// account. Neither present means no giver.
async fn resolve_giver(
    state: &Arc<AppState>,
    user_id: &str,
    payload: &GiftPayload,
) -> AppResult<Option<String>> {
    if let Some(giver_id) = payload.giver_id.as_deref().filter(|s| !s.is_empty()) {
        let giver = GiverRepository::find_by_id(&state.db, user_id, giver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Giver not found".to_string()))?;
        return Ok(Some(giver.id));
    }

    if let Some(name) = payload
        .giver_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        let giver = match GiverRepository::find_by_name(&state.db, user_id, name).await? {
            Some(giver) => giver,
            None => GiverRepository::create(&state.db, user_id, name, None).await?,
        };
        return Ok(Some(giver.id));
    }

    Ok(None)
}

async fn resolve_category(
    state: &Arc<AppState>,
    user_id: &str,
    category_id: Option<&str>,
) -> AppResult<Option<String>> {
    match category_id.filter(|s| !s.is_empty()) {
        Some(id) => {
            let category = CategoryRepository::find_by_id(&state.db, user_id, id)
                .await?
                .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
            Ok(Some(category.id))
        }
        None => Ok(None),
    }
}
