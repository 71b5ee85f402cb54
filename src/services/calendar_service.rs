//! Today's events across every calendar the account can see.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeZone};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::errors::FetchError;
use crate::models::calendar_event::{CalendarEventRecord, ALL_DAY_LABEL};
use crate::models::credential::Credential;

const CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
const PAGE_SIZE: &str = "250";

// ============================================================================
// Provider types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

/// Local `[00:00:00, 23:59:59]` bounds of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DayWindow {
    pub fn today() -> Self {
        Self::containing(&Local::now())
    }

    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        let last_second = midnight + chrono::Duration::days(1) - chrono::Duration::seconds(1);

        // Fall back to the UTC reading when local midnight falls in a DST gap.
        let start = tz
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight));
        let end = tz
            .from_local_datetime(&last_second)
            .latest()
            .unwrap_or_else(|| tz.from_utc_datetime(&last_second));

        DayWindow {
            start: start.fixed_offset(),
            end: end.fixed_offset(),
        }
    }
}

// ============================================================================
// Calendar API
// ============================================================================

/// The two calendar operations the briefing needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_calendars(&self, access_token: &str) -> Result<Vec<CalendarEntry>, FetchError>;

    /// Non-deleted events with recurrences expanded, ordered by start time.
    async fn list_events_in_window(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &DayWindow,
    ) -> Result<Vec<RawEvent>, FetchError>;
}

pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(CALENDAR_API_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(GoogleCalendarClient {
            http,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("Invalid provider URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(access_token)
                .query(query);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let page: Page<T> = response.json().await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_calendars(&self, access_token: &str) -> Result<Vec<CalendarEntry>, FetchError> {
        let url = self.endpoint(&["users", "me", "calendarList"])?;
        self.get_all_pages(url, access_token, &[("maxResults", PAGE_SIZE.to_string())])
            .await
    }

    async fn list_events_in_window(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &DayWindow,
    ) -> Result<Vec<RawEvent>, FetchError> {
        let url = self.endpoint(&["calendars", calendar_id, "events"])?;
        self.get_all_pages(
            url,
            access_token,
            &[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("showDeleted", "false".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ],
        )
        .await
    }
}

// ============================================================================
// Fetcher
// ============================================================================

pub struct CalendarFetcher {
    api: Box<dyn CalendarApi>,
    excluded_calendar: String,
}

impl CalendarFetcher {
    pub fn new(api: Box<dyn CalendarApi>, excluded_calendar: impl Into<String>) -> Self {
        CalendarFetcher {
            api,
            excluded_calendar: excluded_calendar.into(),
        }
    }

    pub async fn fetch(&self, credential: &Credential) -> Result<Vec<CalendarEventRecord>, FetchError> {
        self.fetch_window(credential, &DayWindow::today(), &Local).await
    }

    /// Events inside `window`, in calendar-list order then start-time order, rendered in `tz`.
    pub async fn fetch_window<Tz>(
        &self,
        credential: &Credential,
        window: &DayWindow,
        tz: &Tz,
    ) -> Result<Vec<CalendarEventRecord>, FetchError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        info!("Fetching calendar events for today...");
        let calendars = self.api.list_calendars(&credential.access_token).await?;

        let mut records = Vec::new();
        for calendar in &calendars {
            if calendar.summary == self.excluded_calendar {
                debug!("Skipping excluded calendar {}", calendar.summary);
                continue;
            }

            let events = match self
                .api
                .list_events_in_window(&credential.access_token, &calendar.id, window)
                .await
            {
                Ok(events) => events,
                Err(e) => {
                    warn!("Could not fetch events for calendar {}: {}", calendar.summary, e);
                    continue;
                }
            };

            records.extend(
                events
                    .iter()
                    .filter_map(|event| to_record(&calendar.summary, event, tz)),
            );
        }

        info!("Found {} events across {} calendars", records.len(), calendars.len());
        Ok(records)
    }
}

/// Normalizes one provider event. Cancelled or undatable events yield `None`.
pub fn to_record<Tz>(calendar_name: &str, event: &RawEvent, tz: &Tz) -> Option<CalendarEventRecord>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let summary = event.summary.as_deref().unwrap_or("(No title)");
    let start = event.start.as_ref();
    let date_time = start
        .and_then(|s| s.date_time.as_deref())
        .filter(|dt| !dt.is_empty());

    let (date, time_label) = match date_time {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => {
                let local = parsed.with_timezone(tz);
                (
                    local.format("%Y-%m-%d").to_string(),
                    local.format("%-I:%M %p").to_string(),
                )
            }
            Err(e) => {
                warn!("Skipping event {:?} with unreadable start {}: {}", summary, raw, e);
                return None;
            }
        },
        None => match start.and_then(|s| s.date.as_deref()).filter(|d| !d.is_empty()) {
            Some(day) => (day.to_string(), ALL_DAY_LABEL.to_string()),
            None => {
                warn!("Skipping event {:?} without a start", summary);
                return None;
            }
        },
    };

    Some(CalendarEventRecord {
        title: format!("[{}] {}", calendar_name, summary),
        date,
        time_label,
        location: event
            .location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    fn credential() -> Credential {
        Credential {
            access_token: "ya29.calendar".to_string(),
            refresh_token: None,
            expiry: None,
            scopes: vec![],
        }
    }

    fn timed(summary: &str, start: &str, location: Option<&str>) -> RawEvent {
        RawEvent {
            summary: Some(summary.to_string()),
            location: location.map(String::from),
            start: Some(EventDateTime {
                date_time: Some(start.to_string()),
                date: None,
            }),
            status: Some("confirmed".to_string()),
        }
    }

    fn all_day(summary: &str, date: &str) -> RawEvent {
        RawEvent {
            summary: Some(summary.to_string()),
            location: None,
            start: Some(EventDateTime {
                date_time: None,
                date: Some(date.to_string()),
            }),
            status: None,
        }
    }

    fn entry(id: &str, summary: &str) -> CalendarEntry {
        CalendarEntry {
            id: id.to_string(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn day_window_spans_local_day() {
        let now = eastern().with_ymd_and_hms(2026, 10, 15, 13, 45, 0).unwrap();
        let window = DayWindow::containing(&now);
        assert_eq!(window.start.to_rfc3339(), "2026-10-15T00:00:00-04:00");
        assert_eq!(window.end.to_rfc3339(), "2026-10-15T23:59:59-04:00");
    }

    #[test]
    fn timed_event_uses_local_twelve_hour_clock() {
        let event = timed("Team Meeting", "2026-10-15T18:00:00Z", Some("Room 4"));
        let record = to_record("Work", &event, &eastern()).unwrap();
        assert_eq!(record.title, "[Work] Team Meeting");
        assert_eq!(record.date, "2026-10-15");
        assert_eq!(record.time_label, "2:00 PM");
        assert_eq!(record.location.as_deref(), Some("Room 4"));
        assert!(!record.is_all_day());
    }

    #[test]
    fn all_day_event_gets_sentinel_label_and_date_only() {
        let record = to_record("Holidays", &all_day("Fall Break", "2026-10-15"), &eastern()).unwrap();
        assert_eq!(record.time_label, "All Day");
        assert_eq!(record.date, "2026-10-15");
        assert!(record.is_all_day());
        assert!(!record.date.contains(':'));
    }

    #[test]
    fn blank_location_becomes_none() {
        let record = to_record("Work", &timed("Sync", "2026-10-15T09:30:00-04:00", Some("  ")), &eastern())
            .unwrap();
        assert_eq!(record.location, None);
        assert_eq!(record.time_label, "9:30 AM");
    }

    #[test]
    fn cancelled_and_undatable_events_are_dropped() {
        let mut cancelled = timed("Gone", "2026-10-15T09:00:00Z", None);
        cancelled.status = Some("cancelled".to_string());
        assert!(to_record("Work", &cancelled, &eastern()).is_none());

        let garbled = timed("Garbled", "tomorrow-ish", None);
        assert!(to_record("Work", &garbled, &eastern()).is_none());

        let no_start = RawEvent {
            summary: Some("Floating".to_string()),
            ..RawEvent::default()
        };
        assert!(to_record("Work", &no_start, &eastern()).is_none());
    }

    #[tokio::test]
    async fn excluded_calendar_is_never_queried() {
        let mut api = MockCalendarApi::new();
        api.expect_list_calendars()
            .returning(|_| Ok(vec![entry("primary", "Me"), entry("school", "SCHOOL")]));
        api.expect_list_events_in_window()
            .withf(|_, id, _| id.to_string() == "primary")
            .times(1)
            .returning(|_, _, _| Ok(vec![timed("Dentist", "2026-10-15T15:00:00Z", None)]));

        let fetcher = CalendarFetcher::new(Box::new(api), "SCHOOL");
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        let records = fetcher
            .fetch_window(&credential(), &DayWindow::containing(&now), &Utc)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "[Me] Dentist");
        assert_eq!(records[0].time_label, "3:00 PM");
    }

    #[tokio::test]
    async fn exclusion_requires_exact_name() {
        let mut api = MockCalendarApi::new();
        api.expect_list_calendars()
            .returning(|_| Ok(vec![entry("school", "School")]));
        api.expect_list_events_in_window()
            .times(1)
            .returning(|_, _, _| Ok(vec![all_day("Exam", "2026-10-15")]));

        let fetcher = CalendarFetcher::new(Box::new(api), "SCHOOL");
        let records = fetcher
            .fetch_window(&credential(), &DayWindow::containing(&Utc::now()), &Utc)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn failing_calendar_is_skipped() {
        let mut api = MockCalendarApi::new();
        api.expect_list_calendars()
            .returning(|_| Ok(vec![entry("a", "Broken"), entry("b", "Family")]));
        api.expect_list_events_in_window().returning(|_, id, _| {
            if id == "a" {
                Err(FetchError::Status { status: 403, body: "forbidden".to_string() })
            } else {
                Ok(vec![all_day("Birthday", "2026-10-15"), timed("Dinner", "2026-10-15T23:00:00Z", None)])
            }
        });

        let fetcher = CalendarFetcher::new(Box::new(api), "SCHOOL");
        let records = fetcher
            .fetch_window(&credential(), &DayWindow::containing(&Utc::now()), &Utc)
            .await
            .unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["[Family] Birthday", "[Family] Dinner"]);
    }

    #[tokio::test]
    async fn calendar_list_failure_fails_the_fetch() {
        let mut api = MockCalendarApi::new();
        api.expect_list_calendars()
            .returning(|_| Err(FetchError::Timeout));
        api.expect_list_events_in_window().never();

        let fetcher = CalendarFetcher::new(Box::new(api), "SCHOOL");
        let result = fetcher
            .fetch_window(&credential(), &DayWindow::containing(&Utc::now()), &Utc)
            .await;
        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[test]
    fn calendar_ids_are_path_encoded() {
        let client = GoogleCalendarClient::with_base_url(CALENDAR_API_URL, Duration::from_secs(5)).unwrap();
        let url = client
            .endpoint(&["calendars", "en.usa#holiday@group.v.calendar.google.com", "events"])
            .unwrap();
        assert!(url.path().starts_with("/calendar/v3/calendars/en.usa%23holiday"));
        assert!(url.path().ends_with("/events"));
        assert!(url.fragment().is_none());
    }

    #[tokio::test]
    async fn client_follows_pages_and_sends_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "primary", "summary": "Me" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("showDeleted", "false"))
            .and(query_param("timeMin", "2026-10-15T00:00:00+00:00"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "summary": "Second", "start": { "date": "2026-10-15" } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("timeMax", "2026-10-15T23:59:59+00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "summary": "First", "start": { "dateTime": "2026-10-15T08:00:00Z" }, "location": "Gym" }],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap();
        let fetcher = CalendarFetcher::new(Box::new(client), "SCHOOL");
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 7, 0, 0).unwrap();
        let records = fetcher
            .fetch_window(&credential(), &DayWindow::containing(&now), &Utc)
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                CalendarEventRecord {
                    title: "[Me] First".to_string(),
                    date: "2026-10-15".to_string(),
                    time_label: "8:00 AM".to_string(),
                    location: Some("Gym".to_string()),
                },
                CalendarEventRecord {
                    title: "[Me] Second".to_string(),
                    date: "2026-10-15".to_string(),
                    time_label: "All Day".to_string(),
                    location: None,
                },
            ]
        );
    }
    #[tokio::test]
    async fn page_without_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "calendar#calendarList" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap();
        let calendars = client.list_calendars("token").await.unwrap();
        assert!(calendars.is_empty());
    }

    #[tokio::test]
    async fn slow_provider_surfaces_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "items": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri(), Duration::from_millis(200)).unwrap();
        let err = client.list_calendars("token").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
