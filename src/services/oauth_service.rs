use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use url::Url;

use crate::errors::AuthError;
use crate::models::credential::Credential;
use crate::services::credential_store::AuthorizationFlow;

const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

#[derive(Deserialize)]
struct OAuthConfig {
    installed: InstalledConfig,
}

#[derive(Deserialize)]
struct InstalledConfig {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// Installed-application consent flow: the user opens the printed URL and pastes the code back.
pub struct InstalledAppFlow {
    client: BasicClient,
}

impl InstalledAppFlow {
    /// Builds the flow from a downloaded `credentials.json` client secret.
    pub fn from_client_secret_file(path: &Path) -> Result<Self, AuthError> {
        info!("Reading application secrets from '{}'", path.display());
        let data = fs::read_to_string(path).map_err(|source| AuthError::ClientSecretMissing {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_client_secret_json(&data)
    }

    pub fn from_client_secret_json(data: &str) -> Result<Self, AuthError> {
        let config: OAuthConfig =
            serde_json::from_str(data).map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;
        let installed = config.installed;
        let redirect = installed
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| OOB_REDIRECT.to_string());

        let client = BasicClient::new(
            ClientId::new(installed.client_id),
            Some(ClientSecret::new(installed.client_secret)),
            AuthUrl::new(installed.auth_uri).map_err(invalid_secret)?,
            Some(TokenUrl::new(installed.token_uri).map_err(invalid_secret)?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::new(redirect).map_err(invalid_secret)?);

        Ok(InstalledAppFlow { client })
    }

    /// Consent URL requesting offline access so a refresh token is issued.
    pub fn authorize_url(&self, scopes: &[String]) -> Url {
        let (auth_url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .url();
        auth_url
    }
}

#[async_trait]
impl AuthorizationFlow for InstalledAppFlow {
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthError> {
        let auth_url = self.authorize_url(scopes);
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        );

        let code = read_authorization_code().await?;
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        info!("Authorization exchange completed");
        Ok(credential_from_token(&token, scopes, None))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::Refresh("No refresh token available".to_string()))?;

        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        info!("Token successfully refreshed.");
        Ok(credential_from_token(
            &token,
            &credential.scopes,
            credential.refresh_token.as_deref(),
        ))
    }
}

async fn read_authorization_code() -> Result<String, AuthError> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(|e| AuthError::ConsentAborted(e.to_string()))??;

    let code = line.trim().to_string();
    if code.is_empty() {
        return Err(AuthError::ConsentAborted("no authorization code entered".to_string()));
    }
    Ok(code)
}

/// Providers may omit the granted scopes or the refresh token on refresh; keep what we had.
fn credential_from_token(
    token: &BasicTokenResponse,
    requested_scopes: &[String],
    previous_refresh_token: Option<&str>,
) -> Credential {
    let scopes = token
        .scopes()
        .map(|granted| granted.iter().map(|scope| scope.to_string()).collect())
        .unwrap_or_else(|| requested_scopes.to_vec());
    let expiry = token
        .expires_in()
        .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
        .map(|lifetime| Utc::now() + lifetime);

    Credential {
        access_token: token.access_token().secret().clone(),
        refresh_token: token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh_token.map(String::from)),
        expiry,
        scopes,
    }
}

fn invalid_secret(error: url::ParseError) -> AuthError {
    AuthError::InvalidClientSecret(error.to_string())
}
