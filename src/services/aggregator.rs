use log::{info, warn};

use crate::errors::AuthError;
use crate::models::context::Context;
use crate::services::calendar_service::CalendarFetcher;
use crate::services::credential_store::CredentialStore;
use crate::services::gmail_service::MailFetcher;
use crate::services::weather_service::WeatherFetcher;

/// Gathers all three sources into one [`Context`].
pub struct Aggregator {
    credentials: CredentialStore,
    required_scopes: Vec<String>,
    weather: WeatherFetcher,
    mail: MailFetcher,
    calendar: CalendarFetcher,
}

impl Aggregator {
    pub fn new(
        credentials: CredentialStore,
        required_scopes: Vec<String>,
        weather: WeatherFetcher,
        mail: MailFetcher,
        calendar: CalendarFetcher,
    ) -> Self {
        Aggregator {
            credentials,
            required_scopes,
            weather,
            mail,
            calendar,
        }
    }

    /// Only a missing credential fails the aggregation. A failing source is logged
    /// and left empty so the other sections still render.
    pub async fn aggregate(&self) -> Result<Context, AuthError> {
        let credential = self.credentials.obtain(&self.required_scopes).await?;

        // Requests go out weather, mail, calendar; results land in fixed fields.
        let (weather, emails, events) = tokio::join!(
            self.weather.fetch(),
            self.mail.fetch(&credential),
            self.calendar.fetch(&credential),
        );

        let weather = match weather {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Weather unavailable, omitting forecast: {}", e);
                None
            }
        };
        let emails = emails.unwrap_or_else(|e| {
            warn!("Mail unavailable, omitting messages: {}", e);
            Vec::new()
        });
        let events = events.unwrap_or_else(|e| {
            warn!("Calendar unavailable, omitting schedule: {}", e);
            Vec::new()
        });

        info!(
            "Aggregated context: weather={}, emails={}, events={}",
            weather.is_some(),
            emails.len(),
            events.len()
        );
        Ok(Context {
            weather,
            emails,
            events,
        })
    }
}
