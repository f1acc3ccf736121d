use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::models::GiftWithNames;

/// Aggregates over a (possibly filtered) set of gifts.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GiftSummary {
    /// Number of gifts in the set, with or without an amount.
    pub count: usize,
    /// Sum of recorded amounts; 0 when none are recorded.
    pub total_amount: i64,
    /// Rounded mean of recorded amounts; None when none are recorded.
    pub average_amount: Option<i64>,
    /// Per-category sums of recorded amounts, ordered by category name.
    /// Gifts without a category are excluded from the breakdown.
    pub category_totals: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: i64,
}

pub fn summarize(gifts: &[GiftWithNames]) -> GiftSummary {
    let amounts: Vec<i64> = gifts.iter().filter_map(|g| g.amount).collect();

    let total_amount: i64 = amounts.iter().sum();
    let average_amount = if amounts.is_empty() {
        None
    } else {
        Some((total_amount as f64 / amounts.len() as f64).round() as i64)
    };

    let mut per_category: BTreeMap<String, i64> = BTreeMap::new();
    for gift in gifts {
        if let (Some(amount), Some(name)) = (gift.amount, gift.category_name.as_deref()) {
            *per_category.entry(name.to_string()).or_insert(0) += amount;
        }
    }

    GiftSummary {
        count: gifts.len(),
        total_amount,
        average_amount,
        category_totals: per_category
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn gift(amount: Option<i64>, category: Option<&str>) -> GiftWithNames {
        let now = Utc::now().naive_utc();
        GiftWithNames {
            id: "id".to_string(),
            user_id: "u1".to_string(),
            title: "t".to_string(),
            memo: None,
            giver_id: None,
            giver_name: None,
            category_id: category.map(|_| "cid".to_string()),
            category_name: category.map(|c| c.to_string()),
            received_date: NaiveDate::parse_from_str("2024-01-01", "%Y-%m-%d").unwrap(),
            thank_you_sent: false,
            return_due_date: None,
            return_done: false,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn totals_match_hand_computed_values() {
        let gifts = vec![
            gift(Some(1000), Some("Food")),
            gift(Some(2500), Some("Food")),
            gift(Some(4000), Some("Cosmetics")),
            gift(None, Some("Other")),
        ];

        let summary = summarize(&gifts);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_amount, 7500);
        // mean of 1000, 2500, 4000 = 2500
        assert_eq!(summary.average_amount, Some(2500));
        assert_eq!(
            summary.category_totals,
            vec![
                CategoryTotal {
                    category: "Cosmetics".to_string(),
                    total: 4000
                },
                CategoryTotal {
                    category: "Food".to_string(),
                    total: 3500
                },
            ]
        );
    }

    #[test]
    fn average_rounds_to_nearest() {
        let gifts = vec![gift(Some(100), None), gift(Some(101), None)];
        // 100.5 rounds away from zero
        assert_eq!(summarize(&gifts).average_amount, Some(101));

        let gifts = vec![gift(Some(100), None), gift(Some(102), None), gift(Some(103), None)];
        // 101.666... -> 102
        assert_eq!(summarize(&gifts).average_amount, Some(102));
    }

    #[test]
    fn empty_and_amountless_sets() {
        let summary = summarize(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_amount, 0);
        assert_eq!(summary.average_amount, None);
        assert!(summary.category_totals.is_empty());

        let summary = summarize(&[gift(None, Some("Food"))]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_amount, 0);
        assert_eq!(summary.average_amount, None);
        assert!(summary.category_totals.is_empty());
    }

    #[test]
    fn uncategorized_amounts_count_in_total_but_not_breakdown() {
        let gifts = vec![gift(Some(500), None), gift(Some(700), Some("Food"))];
        let summary = summarize(&gifts);
        assert_eq!(summary.total_amount, 1200);
        assert_eq!(
            summary.category_totals,
            vec![CategoryTotal {
                category: "Food".to_string(),
                total: 700
            }]
        );
    }
}
