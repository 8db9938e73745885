//! Reminder message text and idempotency keys.

use chrono::{NaiveDate, NaiveTime, Timelike};

/// Drop seconds and sub-seconds from a wall time.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Deduplication key for one habit's reminder in one local minute.
///
/// Format: `"{habit_id}_{YYYY-MM-DD}_{HHMM}"`. The date and time are the
/// local values the scheduler matched on, so a redelivered reminder for the
/// same tick produces the same key.
pub fn idempotency_key(habit_id: i64, local_date: NaiveDate, local_time: NaiveTime) -> String {
    format!(
        "{}_{}_{:02}{:02}",
        habit_id,
        local_date.format("%Y-%m-%d"),
        local_time.hour(),
        local_time.minute()
    )
}

/// Build the reminder body for one user's due habits (Telegram HTML).
pub fn reminder_text<S: AsRef<str>>(habit_names: &[S]) -> String {
    let mut text = String::from("⏰ <b>Reminder!</b>\n");
    if habit_names.len() == 1 {
        text.push_str("Time to do your habit: ");
        text.push_str(&format!("<b>{}</b>", escape_html(habit_names[0].as_ref())));
        return text;
    }

    text.push_str("Time to do your habits:");
    for name in habit_names {
        text.push_str(&format!("\n• <b>{}</b>", escape_html(name.as_ref())));
    }
    text
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
