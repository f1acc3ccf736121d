use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The central record: one received gift.
///
/// `giver_id` and `category_id` are nullable; when set they always reference a
/// row owned by the same user (checked at write time).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Gift {
    pub id: String,
    pub user_id: String,

    pub title: String,
    pub memo: Option<String>,

    pub giver_id: Option<String>,
    pub category_id: Option<String>,

    pub received_date: NaiveDate,

    pub thank_you_sent: bool,
    pub return_due_date: Option<NaiveDate>,
    pub return_done: bool,
    pub amount: Option<i64>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A gift joined with the display names of its giver and category.
/// This is what list/detail reads return.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GiftWithNames {
    pub id: String,
    pub user_id: String,

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

/// Validated field set for inserting or fully replacing a gift.
#[derive(Debug, Clone)]
pub struct GiftData {
    pub title: String,
    pub memo: Option<String>,
    pub giver_id: Option<String>,
    pub category_id: Option<String>,
    pub received_date: NaiveDate,
    pub thank_you_sent: bool,
    pub return_due_date: Option<NaiveDate>,
    pub return_done: bool,
    pub amount: Option<i64>,
}

/// Filter applied to gift listing and summary queries. All criteria are ANDed.
#[derive(Debug, Clone, Default)]
pub struct GiftFilter {
    /// Substring match on the gift title.
    pub title_query: Option<String>,
    pub giver_id: Option<String>,
    pub category_id: Option<String>,
    /// Only gifts with a pending reciprocation: return_done = false and a due date set.
    pub pending_return_only: bool,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    /// Only gifts that have an amount recorded. Implied by either amount bound.
    pub with_amount_only: bool,
}
