use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

pub const MODEL_NAME: &str = "llama3.1";
const OLLAMA_HOST: &str = "http://localhost";
const OLLAMA_PORT: u16 = 11434;

// Columbia, SC
const DEFAULT_LATITUDE: f64 = 34.0007;
const DEFAULT_LONGITUDE: f64 = -81.0348;
const DEFAULT_LOCATION_NAME: &str = "Columbia, SC";

const CLIENT_SECRET_FILE: &str = "credentials.json";
const TOKEN_FILE: &str = "token.json";
const PROMPT_PREFIX_FILE: &str = "prompt.txt";
const EXCLUDED_CALENDAR: &str = "SCHOOL";
const EMAIL_LIMIT: u32 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for one run, read from the process environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub weather_api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub client_secret_file: PathBuf,
    pub token_file: PathBuf,
    pub prompt_prefix_file: PathBuf,
    pub excluded_calendar: String,
    pub email_limit: u32,
    pub ollama_url: Url,
    pub model: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }

        let weather_api_key = env::var("WEATHER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("WEATHER_API_KEY"))?;

        Ok(Config {
            weather_api_key,
            latitude: parsed_var("WEATHER_LAT", DEFAULT_LATITUDE)?,
            longitude: parsed_var("WEATHER_LON", DEFAULT_LONGITUDE)?,
            location_name: string_var("WEATHER_LOCATION_NAME", DEFAULT_LOCATION_NAME),
            client_secret_file: PathBuf::from(string_var("GOOGLE_CLIENT_SECRET_FILE", CLIENT_SECRET_FILE)),
            token_file: PathBuf::from(string_var("GOOGLE_TOKEN_FILE", TOKEN_FILE)),
            prompt_prefix_file: PathBuf::from(string_var("PROMPT_PREFIX_FILE", PROMPT_PREFIX_FILE)),
            excluded_calendar: string_var("EXCLUDED_CALENDAR", EXCLUDED_CALENDAR),
            email_limit: parsed_var("EMAIL_LIMIT", EMAIL_LIMIT)?,
            ollama_url: ollama_url(
                string_var("OLLAMA_HOST", OLLAMA_HOST),
                parsed_var("OLLAMA_PORT", OLLAMA_PORT)?,
            )?,
            model: string_var("OLLAMA_MODEL", MODEL_NAME),
            request_timeout: Duration::from_secs(parsed_var("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?),
        })
    }

    /// Union of the scopes the mail and calendar fetchers need.
    pub fn required_scopes() -> Vec<String> {
        vec![GMAIL_SCOPE.to_string(), CALENDAR_SCOPE.to_string()]
    }
}

fn string_var(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Joins `OLLAMA_HOST` and `OLLAMA_PORT`; the host must carry an http(s) scheme.
fn ollama_url(host: String, port: u16) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::Invalid {
        var: "OLLAMA_HOST",
        value: host.clone(),
    };
    let mut url = Url::parse(host.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    url.set_port(Some(port)).map_err(|_| invalid())?;
    Ok(url)
}

fn parsed_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        _ => Ok(default),
    }
}
