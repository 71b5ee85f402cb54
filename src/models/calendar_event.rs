use serde::{Deserialize, Serialize};

pub const ALL_DAY_LABEL: &str = "All Day";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRecord {
    pub title: String,
    pub date: String,
    /// Local wall-clock time such as `3:00 PM`, or [`ALL_DAY_LABEL`].
    pub time_label: String,
    pub location: Option<String>,
}

impl CalendarEventRecord {
    pub fn is_all_day(&self) -> bool {
        self.time_label == ALL_DAY_LABEL
    }
}
