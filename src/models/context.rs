use crate::models::calendar_event::CalendarEventRecord;
use crate::models::email::EmailRecord;
use crate::models::weather::WeatherSnapshot;

/// Everything gathered for one briefing. Any field may be empty when its source failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub weather: Option<WeatherSnapshot>,
    pub emails: Vec<EmailRecord>,
    pub events: Vec<CalendarEventRecord>,
}
