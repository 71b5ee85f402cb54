use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};

use crate::models::calendar_event::CalendarEventRecord;
use crate::models::context::Context;
use crate::models::email::EmailRecord;
use crate::models::prompt::{PromptDocument, Section};
use crate::models::weather::WeatherSnapshot;

pub const EMAILS_HEADER: &str = "--- Recent Emails ---";
pub const SCHEDULE_HEADER: &str = "--- Today's Schedule ---";
pub const NO_EVENTS_LINE: &str = "No events scheduled for today.";

/// Renders a [`Context`] into the prompt sent to the model.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    prefix: Option<String>,
    location_name: String,
}

impl PromptAssembler {
    pub fn new(prefix: Option<String>, location_name: impl Into<String>) -> Self {
        PromptAssembler {
            prefix: prefix.filter(|text| !text.trim().is_empty()),
            location_name: location_name.into(),
        }
    }

    pub fn weather_header(&self) -> String {
        format!("Here is the daily weather forecast for {}:", self.location_name)
    }

    /// Pure: the same context always yields the same document.
    pub fn render(&self, context: &Context) -> PromptDocument {
        let mut sections = Vec::with_capacity(4);
        if let Some(ref prefix) = self.prefix {
            sections.push(Section::untitled(
                prefix.trim_end_matches(&['\r', '\n'][..]).lines().map(String::from).collect(),
            ));
        }
        if let Some(ref weather) = context.weather {
            sections.push(Section::new(self.weather_header(), weather_lines(weather)));
        }
        sections.push(Section::new(EMAILS_HEADER, email_lines(&context.emails)));
        sections.push(Section::new(SCHEDULE_HEADER, schedule_lines(&context.events)));
        PromptDocument::new(sections)
    }
}

/// Reads the optional prompt prefix. A missing file means no prefix.
pub fn load_prefix(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => {
            info!("Loaded prompt prefix from {}", path.display());
            Some(text)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No prompt prefix at {}", path.display());
            None
        }
        Err(e) => {
            warn!("Could not read prompt prefix {}: {}", path.display(), e);
            None
        }
    }
}

/// Shortest representation that reads back to the same value: 58.0 -> "58", 75.2 -> "75.2".
fn number(value: f64) -> String {
    format!("{}", value)
}

fn weather_lines(weather: &WeatherSnapshot) -> Vec<String> {
    vec![
        format!("Daily summary: {}", weather.daily_summary),
        format!("Daily High: {}\u{00B0}F", number(weather.daily_high)),
        format!("Daily Low: {}\u{00B0}F", number(weather.daily_low)),
        format!("Daily Humidity: {}%", number(weather.daily_humidity)),
        format!("Current Humidity: {}%", number(weather.current_humidity)),
        format!("Current Feels Like: {}\u{00B0}F", number(weather.current_feels_like)),
    ]
}

fn email_lines(emails: &[EmailRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(emails.len() * 4);
    for (i, email) in emails.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("From: {}", email.sender));
        lines.push(format!("Subject: {}", email.subject));
        lines.push(format!("Snippet: {}", email.snippet));
    }
    lines
}

fn schedule_lines(events: &[CalendarEventRecord]) -> Vec<String> {
    if events.is_empty() {
        return vec![NO_EVENTS_LINE.to_string()];
    }
    events.iter().map(event_line).collect()
}

fn event_line(event: &CalendarEventRecord) -> String {
    match event.location.as_deref().filter(|loc| !loc.is_empty()) {
        Some(location) => format!("{} @ {} (Loc: {})", event.title, event.time_label, location),
        None => format!("{} @ {}", event.title, event.time_label),
    }
}
