use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use chrono::Utc;

use crate::db::GiftRepository;
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::calendar::CalendarFeed;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/feed.ics", get(feed))
}

/// iCalendar export: one all-day event per gift still owing a return gift.
async fn feed(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<impl IntoResponse> {
    let gifts = GiftRepository::list_pending_return(&state.db, &user.id).await?;
    let ics = CalendarFeed::build(&gifts, Utc::now());

    Ok((
        http::StatusCode::OK,
        [
            (
                http::header::CONTENT_TYPE,
                "text/calendar; charset=utf-8",
            ),
            (
                http::header::CONTENT_DISPOSITION,
                "attachment; filename=giftlog.ics",
            ),
        ],
        ics,
    ))
}
