use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::db::models::GiftFilter;
use crate::db::GiftRepository;
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::routes::gifts::GiftListQuery;
use crate::services::reports::{summarize, GiftSummary};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/summary", get(summary))
}

/// Aggregate totals over the gift set selected by the same filter parameters
/// as the gift listing.
async fn summary(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GiftListQuery>,
) -> AppResult<Json<GiftSummary>> {
    let filter: GiftFilter = query.into();
    let gifts = GiftRepository::list(&state.db, &user.id, &filter).await?;
    Ok(Json(summarize(&gifts)))
}
