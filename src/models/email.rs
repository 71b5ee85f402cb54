use serde::{Deserialize, Serialize};

/// One inbox message reduced to the fields the briefing uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    pub date: String,
}
