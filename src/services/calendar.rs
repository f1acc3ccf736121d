use chrono::{DateTime, NaiveDate, Utc};

use crate::db::models::GiftWithNames;

/// Builds the iCalendar feed of reciprocation due dates.
///
/// Each gift with a pending return (due date set, not done) becomes one
/// all-day VEVENT on the due date. Callers pass `now` so the DTSTAMP is
/// deterministic in tests.
pub struct CalendarFeed;

impl CalendarFeed {
    pub fn build(gifts: &[GiftWithNames], now: DateTime<Utc>) -> String {
        let mut lines: Vec<String> = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//GiftLog//EN".to_string(),
            "CALSCALE:GREGORIAN".to_string(),
            "METHOD:PUBLISH".to_string(),
        ];

        let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();

        for gift in gifts {
            let due = match gift.return_due_date {
                Some(d) => d,
                None => continue,
            };

            let summary = format!("Return gift due: {}", gift.title);
            let description = format!(
                "Giver: {} / Category: {}",
                gift.giver_name.as_deref().unwrap_or(""),
                gift.category_name.as_deref().unwrap_or("")
            );

            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!("UID:giftlog-{}@local", gift.id));
            lines.push(format!("DTSTAMP:{}", stamp));
            lines.push(format!("SUMMARY:{}", escape_text(&summary)));
            lines.push(format!("DESCRIPTION:{}", escape_text(&description)));
            lines.push(format!("DTSTART;VALUE=DATE:{}", format_date(due)));
            lines.push(format!("DTEND;VALUE=DATE:{}", format_date(due)));
            lines.push("END:VEVENT".to_string());
        }

        lines.push("END:VCALENDAR".to_string());

        // RFC 5545 requires CRLF line endings.
        lines.join("\r\n")
    }
}

fn format_date(d: NaiveDate) -> String {
    d.format("%Y%m%d").to_string()
}

/// Escape TEXT values per RFC 5545 §3.3.11.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn gift(id: &str, title: &str, due: Option<&str>) -> GiftWithNames {
        let now = Utc::now().naive_utc();
        GiftWithNames {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: title.to_string(),
            memo: None,
            giver_id: Some("g1".to_string()),
            giver_name: Some("Aunt May".to_string()),
            category_id: Some("c1".to_string()),
            category_name: Some("Food".to_string()),
            received_date: date("2024-01-01"),
            thank_you_sent: false,
            return_due_date: due.map(date),
            return_done: false,
            amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn escapes_special_text() {
        assert_eq!(escape_text("a,b;c"), "a\\,b\\;c");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn one_event_per_due_gift_with_matching_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let gifts = vec![
            gift("g-1", "Wine", Some("2024-04-01")),
            gift("g-2", "Tea", Some("2024-04-15")),
        ];

        let feed = CalendarFeed::build(&gifts, now);

        assert_eq!(feed.matches("BEGIN:VEVENT").count(), 2);
        assert!(feed.contains("UID:giftlog-g-1@local"));
        assert!(feed.contains("DTSTART;VALUE=DATE:20240401"));
        assert!(feed.contains("DTSTART;VALUE=DATE:20240415"));
        assert!(feed.contains("DTSTAMP:20240315T120000Z"));
        assert!(feed.contains("SUMMARY:Return gift due: Wine"));
        assert!(feed.contains("DESCRIPTION:Giver: Aunt May / Category: Food"));
        assert!(feed.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(feed.ends_with("END:VCALENDAR"));
    }

    #[test]
    fn gift_without_due_date_is_skipped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let feed = CalendarFeed::build(&[gift("g-1", "Card", None)], now);
        assert_eq!(feed.matches("BEGIN:VEVENT").count(), 0);
    }

    #[test]
    fn summary_with_commas_is_escaped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let feed = CalendarFeed::build(&[gift("g-1", "Cheese, aged", Some("2024-05-01"))], now);
        assert!(feed.contains("SUMMARY:Return gift due: Cheese\\, aged"));
    }
}
