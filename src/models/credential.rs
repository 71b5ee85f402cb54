use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are refreshed rather than reused.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Delegated-access token pair persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// True when every required scope was granted to this credential.
    pub fn covers(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// A credential without a recorded expiry is treated as still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .map(|expiry| expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS))
            .unwrap_or(false)
    }
}
