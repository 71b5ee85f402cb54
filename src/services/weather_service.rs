use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use crate::errors::FetchError;
use crate::models::weather::WeatherSnapshot;

const OPENWEATHER_API_URL: &str = "https://api.openweathermap.org";

/// Narrow view of the weather provider: one forecast call for a fixed location.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<Value, FetchError>;
}

/// OpenWeather One Call 3.0 over HTTP.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(OPENWEATHER_API_URL, api_key, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(OpenWeatherClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<Value, FetchError> {
        let url = format!("{}/data/3.0/onecall", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("exclude", "minutely,hourly,alerts".to_string()),
                ("units", "imperial".to_string()),
                ("lang", "en".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

/// Fetches the forecast and reduces it to a [`WeatherSnapshot`].
pub struct WeatherFetcher {
    api: Box<dyn WeatherApi>,
    latitude: f64,
    longitude: f64,
}

impl WeatherFetcher {
    pub fn new(api: Box<dyn WeatherApi>, latitude: f64, longitude: f64) -> Self {
        WeatherFetcher {
            api,
            latitude,
            longitude,
        }
    }

    pub async fn fetch(&self) -> Result<WeatherSnapshot, FetchError> {
        info!("Fetching Weather...");
        let body = self.api.one_call(self.latitude, self.longitude).await?;
        let snapshot = parse_snapshot(&body)?;
        debug!("Weather snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

/// Extracts the snapshot fields by their fixed key paths.
pub fn parse_snapshot(body: &Value) -> Result<WeatherSnapshot, FetchError> {
    Ok(WeatherSnapshot {
        daily_high: number_at(body, "/daily/0/temp/max")?,
        daily_low: number_at(body, "/daily/0/temp/min")?,
        daily_humidity: number_at(body, "/daily/0/humidity")?,
        daily_summary: string_at(body, "/daily/0/summary")?,
        current_humidity: number_at(body, "/current/humidity")?,
        current_feels_like: number_at(body, "/current/feels_like")?,
    })
}

fn number_at(body: &Value, pointer: &str) -> Result<f64, FetchError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| FetchError::Malformed(format!("missing {}", pointer)))?;
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FetchError::Malformed(format!("{} is not a number: {}", pointer, value)))
}

fn string_at(body: &Value, pointer: &str) -> Result<String, FetchError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| FetchError::Malformed(format!("missing {}", pointer)))?;
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| FetchError::Malformed(format!("{} is not a string: {}", pointer, value)))
}
