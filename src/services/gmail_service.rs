use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::errors::FetchError;
use crate::models::credential::Credential;
use crate::models::email::EmailRecord;

const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GmailMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

impl GmailMessage {
    /// Exact, case-sensitive header lookup. Missing headers read as empty.
    pub fn header(&self, name: &str) -> String {
        self.payload
            .as_ref()
            .and_then(|payload| payload.headers.iter().find(|h| h.name == name))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    }

    pub fn to_record(&self) -> EmailRecord {
        EmailRecord {
            sender: self.header("From"),
            subject: self.header("Subject"),
            snippet: self.snippet.clone(),
            date: self.header("Date"),
        }
    }
}

/// The two mail operations the briefing needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailApi: Send + Sync {
    /// IDs of the `limit` most recent inbox messages, newest first.
    async fn list_recent_message_ids(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<String>, FetchError>;

    async fn get_message(&self, access_token: &str, id: &str) -> Result<GmailMessage, FetchError>;
}

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(GMAIL_API_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(GmailClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
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

#[async_trait]
impl MailApi for GmailClient {
    async fn list_recent_message_ids(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<String>, FetchError> {
        let list: MessageListResponse = self
            .get_json(
                &self.base_url,
                access_token,
                &[("labelIds", "INBOX".to_string()), ("maxResults", limit.to_string())],
            )
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, access_token: &str, id: &str) -> Result<GmailMessage, FetchError> {
        let url = format!("{}/{}", self.base_url, id);
        self.get_json(&url, access_token, &[("format", "full".to_string())])
            .await
    }
}

/// Lists recent inbox messages and loads each one, skipping messages that fail.
pub struct MailFetcher {
    api: Box<dyn MailApi>,
    limit: u32,
}

impl MailFetcher {
    pub fn new(api: Box<dyn MailApi>, limit: u32) -> Self {
        MailFetcher { api, limit }
    }

    pub async fn fetch(&self, credential: &Credential) -> Result<Vec<EmailRecord>, FetchError> {
        info!("Fetching latest emails...");
        let ids = self
            .api
            .list_recent_message_ids(&credential.access_token, self.limit)
            .await?;
        if ids.is_empty() {
            info!("No messages found.");
            return Ok(Vec::new());
        }

        let mut emails = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.api.get_message(&credential.access_token, id).await {
                Ok(message) => {
                    debug!("Fetched message {}", id);
                    emails.push(message.to_record());
                }
                Err(e) => warn!("Could not fetch message {}: {}", id, e),
            }
        }
        info!("Loaded {} of {} messages", emails.len(), ids.len());
        Ok(emails)
    }
}
