#![allow(dead_code)]

use daily_briefing::models::calendar_event::CalendarEventRecord;
use daily_briefing::models::context::Context;
use daily_briefing::models::email::EmailRecord;
use daily_briefing::models::weather::WeatherSnapshot;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn clear_day() -> WeatherSnapshot {
    WeatherSnapshot {
        daily_high: 75.2,
        daily_low: 58.0,
        daily_humidity: 60.0,
        daily_summary: "clear".to_string(),
        current_humidity: 55.0,
        current_feels_like: 74.0,
    }
}

pub fn sample_emails() -> Vec<EmailRecord> {
    vec![
        EmailRecord {
            sender: "alice@example.com".to_string(),
            subject: "Meeting tomorrow".to_string(),
            snippet: "Hi, can we meet tomorrow to discuss the project?".to_string(),
            date: "Wed, 14 Oct 2026 10:00:00 -0400".to_string(),
        },
        EmailRecord {
            sender: "bob@example.com".to_string(),
            subject: "Urgent: Report submission".to_string(),
            snippet: "I need the quarterly report by end of day.".to_string(),
            date: "Thu, 15 Oct 2026 07:30:00 -0400".to_string(),
        },
    ]
}

pub fn sample_events() -> Vec<CalendarEventRecord> {
    vec![
        CalendarEventRecord {
            title: "[Holidays] Fall Break".to_string(),
            date: "2026-10-15".to_string(),
            time_label: "All Day".to_string(),
            location: None,
        },
        CalendarEventRecord {
            title: "[Work] Team Meeting".to_string(),
            date: "2026-10-15".to_string(),
            time_label: "2:00 PM".to_string(),
            location: Some("Room 4".to_string()),
        },
    ]
}

pub fn full_context() -> Context {
    Context {
        weather: Some(clear_day()),
        emails: sample_emails(),
        events: sample_events(),
    }
}
