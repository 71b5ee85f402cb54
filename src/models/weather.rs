use serde::{Deserialize, Serialize};

/// Today's forecast plus current conditions, in imperial units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub daily_high: f64,
    pub daily_low: f64,
    pub daily_humidity: f64,
    pub daily_summary: String,
    pub current_humidity: f64,
    pub current_feels_like: f64,
}
