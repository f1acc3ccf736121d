use chrono::Utc;

use sqlx::Row;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Gift Repository
// ============================================================================

const SELECT_WITH_NAMES: &str = r#"
SELECT
    g.id, g.user_id, g.title, g.memo,
    g.giver_id, gv.name AS giver_name,
    g.category_id, c.name AS category_name,
    g.received_date, g.thank_you_sent, g.return_due_date, g.return_done,
    g.amount, g.created_at, g.updated_at
FROM gifts g
LEFT JOIN givers gv ON gv.id = g.giver_id
LEFT JOIN categories c ON c.id = g.category_id
"#;

pub struct GiftRepository;

impl GiftRepository {
    pub async fn create(pool: &SqlitePool, user_id: &str, data: &GiftData) -> AppResult<Gift> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO gifts (
                id, user_id, title, memo, giver_id, category_id,
                received_date, thank_you_sent, return_due_date, return_done, amount,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.memo)
        .bind(&data.giver_id)
        .bind(&data.category_id)
        .bind(data.received_date)
        .bind(data.thank_you_sent)
        .bind(data.return_due_date)
        .bind(data.return_done)
        .bind(data.amount)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(Gift {
            id,
            user_id: user_id.to_string(),
            title: data.title.clone(),
            memo: data.memo.clone(),
            giver_id: data.giver_id.clone(),
            category_id: data.category_id.clone(),
            received_date: data.received_date,
            thank_you_sent: data.thank_you_sent,
            return_due_date: data.return_due_date,
            return_done: data.return_done,
            amount: data.amount,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> AppResult<Option<GiftWithNames>> {
        let sql = format!("{} WHERE g.id = ? AND g.user_id = ?", SELECT_WITH_NAMES);

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row.map(Self::from_row))
    }

    /// Filtered listing, newest received date first.
    pub async fn list(
        pool: &SqlitePool,
        user_id: &str,
        filter: &GiftFilter,
    ) -> AppResult<Vec<GiftWithNames>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_WITH_NAMES);
        qb.push(" WHERE g.user_id = ");
        qb.push_bind(user_id);

        if let Some(q) = filter.title_query.as_deref().filter(|q| !q.is_empty()) {
            qb.push(" AND g.title LIKE ");
            qb.push_bind(format!("%{}%", q));
        }
        if let Some(giver_id) = &filter.giver_id {
            qb.push(" AND g.giver_id = ");
            qb.push_bind(giver_id);
        }
        if let Some(category_id) = &filter.category_id {
            qb.push(" AND g.category_id = ");
            qb.push_bind(category_id);
        }
        if filter.pending_return_only {
            qb.push(" AND g.return_done = 0 AND g.return_due_date IS NOT NULL");
        }

        // Either amount bound narrows the set to gifts that have an amount at all.
        if filter.with_amount_only || filter.min_amount.is_some() || filter.max_amount.is_some() {
            qb.push(" AND g.amount IS NOT NULL");
        }
        if let Some(min) = filter.min_amount {
            qb.push(" AND g.amount >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_amount {
            qb.push(" AND g.amount <= ");
            qb.push_bind(max);
        }

        qb.push(" ORDER BY g.received_date DESC, g.created_at DESC");

        let rows = qb
            .build()
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Gifts still owing a return gift, ordered by due date. Feeds the calendar export.
    pub async fn list_pending_return(
        pool: &SqlitePool,
        user_id: &str,
    ) -> AppResult<Vec<GiftWithNames>> {
        let sql = format!(
            "{} WHERE g.user_id = ? AND g.return_done = 0 AND g.return_due_date IS NOT NULL \
             ORDER BY g.return_due_date",
            SELECT_WITH_NAMES
        );

        let rows = sqlx::query(&sql)
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
        data: &GiftData,
    ) -> AppResult<GiftWithNames> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE gifts
            SET title = ?, memo = ?, giver_id = ?, category_id = ?,
                received_date = ?, thank_you_sent = ?, return_due_date = ?,
                return_done = ?, amount = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&data.title)
        .bind(&data.memo)
        .bind(&data.giver_id)
        .bind(&data.category_id)
        .bind(data.received_date)
        .bind(data.thank_you_sent)
        .bind(data.return_due_date)
        .bind(data.return_done)
        .bind(data.amount)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Gift not found".to_string()));
        }

        Self::find_by_id(pool, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift not found".to_string()))
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM gifts
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Gift not found".to_string()));
        }

        Ok(())
    }

    fn from_row(r: sqlx::sqlite::SqliteRow) -> GiftWithNames {
        GiftWithNames {
            id: r.get("id"),
            user_id: r.get("user_id"),
            title: r.get("title"),
            memo: r.get("memo"),
            giver_id: r.get("giver_id"),
            giver_name: r.get("giver_name"),
            category_id: r.get("category_id"),
            category_name: r.get("category_name"),
            received_date: r.get("received_date"),
            thank_you_sent: r.get("thank_you_sent"),
            return_due_date: r.get("return_due_date"),
            return_done: r.get("return_done"),
            amount: r.get("amount"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CategoryRepository, GiverRepository, UserRepository};
    use chrono::NaiveDate;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn gift_data(title: &str, received: &str) -> GiftData {
        GiftData {
            title: title.to_string(),
            memo: None,
            giver_id: None,
            category_id: None,
            received_date: date(received),
            thank_you_sent: false,
            return_due_date: None,
            return_done: false,
            amount: None,
        }
    }

    #[tokio::test]
    async fn filters_by_giver_and_category() {
        let pool = test_pool().await;
        let user = UserRepository::create(&pool, "a@example.com", "hash")
            .await
            .unwrap();
        let giver = GiverRepository::create(&pool, &user.id, "Aunt May", None)
            .await
            .unwrap();
        let category = CategoryRepository::create(&pool, &user.id, "Food")
            .await
            .unwrap();

        let mut with_refs = gift_data("Cookies", "2024-03-01");
        with_refs.giver_id = Some(giver.id.clone());
        with_refs.category_id = Some(category.id.clone());
        let created = GiftRepository::create(&pool, &user.id, &with_refs)
            .await
            .unwrap();
        GiftRepository::create(&pool, &user.id, &gift_data("Socks", "2024-03-02"))
            .await
            .unwrap();

        let by_giver = GiftRepository::list(
            &pool,
            &user.id,
            &GiftFilter {
                giver_id: Some(giver.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_giver.len(), 1);
        assert_eq!(by_giver[0].id, created.id);
        assert_eq!(by_giver[0].giver_name.as_deref(), Some("Aunt May"));

        let by_category = GiftRepository::list(
            &pool,
            &user.id,
            &GiftFilter {
                category_id: Some(category.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].category_name.as_deref(), Some("Food"));
    }

    #[tokio::test]
    async fn pending_return_filter_matches_exact_set() {
        let pool = test_pool().await;
        let user = UserRepository::create(&pool, "b@example.com", "hash")
            .await
            .unwrap();

        let mut pending = gift_data("Wine", "2024-01-10");
        pending.return_due_date = Some(date("2024-02-01"));
        let pending = GiftRepository::create(&pool, &user.id, &pending).await.unwrap();

        let mut done = gift_data("Tea", "2024-01-11");
        done.return_due_date = Some(date("2024-02-02"));
        done.return_done = true;
        GiftRepository::create(&pool, &user.id, &done).await.unwrap();

        // No due date at all: not pending, even though return_done is false.
        GiftRepository::create(&pool, &user.id, &gift_data("Card", "2024-01-12"))
            .await
            .unwrap();

        let listed = GiftRepository::list(
            &pool,
            &user.id,
            &GiftFilter {
                pending_return_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending.id);

        let feed = GiftRepository::list_pending_return(&pool, &user.id)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].return_due_date, Some(date("2024-02-01")));
    }

    #[tokio::test]
    async fn amount_bounds_imply_amount_present() {
        let pool = test_pool().await;
        let user = UserRepository::create(&pool, "c@example.com", "hash")
            .await
            .unwrap();

        let mut cheap = gift_data("Pen", "2024-04-01");
        cheap.amount = Some(500);
        GiftRepository::create(&pool, &user.id, &cheap).await.unwrap();

        let mut pricey = gift_data("Watch", "2024-04-02");
        pricey.amount = Some(20000);
        GiftRepository::create(&pool, &user.id, &pricey).await.unwrap();

        // No amount recorded; excluded from any amount-scoped query.
        GiftRepository::create(&pool, &user.id, &gift_data("Note", "2024-04-03"))
            .await
            .unwrap();

        let bounded = GiftRepository::list(
            &pool,
            &user.id,
            &GiftFilter {
                min_amount: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].title, "Watch");

        let with_amount = GiftRepository::list(
            &pool,
            &user.id,
            &GiftFilter {
                with_amount_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(with_amount.len(), 2);
    }

    #[tokio::test]
    async fn listing_is_newest_received_first() {
        let pool = test_pool().await;
        let user = UserRepository::create(&pool, "d@example.com", "hash")
            .await
            .unwrap();

        GiftRepository::create(&pool, &user.id, &gift_data("Old", "2023-12-24"))
            .await
            .unwrap();
        GiftRepository::create(&pool, &user.id, &gift_data("New", "2024-06-01"))
            .await
            .unwrap();

        let listed = GiftRepository::list(&pool, &user.id, &GiftFilter::default())
            .await
            .unwrap();
        let titles: Vec<&str> = listed.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn rows_are_invisible_across_users() {
        let pool = test_pool().await;
        let alice = UserRepository::create(&pool, "alice@example.com", "hash")
            .await
            .unwrap();
        let bob = UserRepository::create(&pool, "bob@example.com", "hash")
            .await
            .unwrap();

        let gift = GiftRepository::create(&pool, &alice.id, &gift_data("Scarf", "2024-05-05"))
            .await
            .unwrap();

        assert!(GiftRepository::find_by_id(&pool, &bob.id, &gift.id)
            .await
            .unwrap()
            .is_none());
        assert!(GiftRepository::list(&pool, &bob.id, &GiftFilter::default())
            .await
            .unwrap()
            .is_empty());

        // Mutations scoped to the wrong user touch nothing.
        let err = GiftRepository::delete(&pool, &bob.id, &gift.id).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
        assert!(GiftRepository::find_by_id(&pool, &alice.id, &gift.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let pool = test_pool().await;
        let user = UserRepository::create(&pool, "e@example.com", "hash")
            .await
            .unwrap();
        let created = GiftRepository::create(&pool, &user.id, &gift_data("Draft", "2024-07-01"))
            .await
            .unwrap();

        let mut replacement = gift_data("Final", "2024-07-02");
        replacement.memo = Some("handwritten note".to_string());
        replacement.amount = Some(3000);
        replacement.thank_you_sent = true;

        let updated = GiftRepository::update(&pool, &user.id, &created.id, &replacement)
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.memo.as_deref(), Some("handwritten note"));
        assert_eq!(updated.amount, Some(3000));
        assert!(updated.thank_you_sent);
        assert_eq!(updated.received_date, date("2024-07-02"));
    }
}
