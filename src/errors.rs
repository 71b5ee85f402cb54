use std::path::PathBuf;

/// Failure of a single provider call or of parsing its response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_decode() {
            FetchError::Malformed(error.to_string())
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(error: url::ParseError) -> Self {
        FetchError::Transport(format!("Invalid provider URL: {}", error))
    }
}

/// Errors from obtaining a delegated-access credential. All of them are fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Client secret not readable at {path}: {source}")]
    ClientSecretMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid client secret: {0}")]
    InvalidClientSecret(String),

    #[error("Authorization exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Authorization was not completed: {0}")]
    ConsentAborted(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Transport(String),

    #[error("Generation request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed generation reply: {0}")]
    Malformed(String),
}

impl From<ollama_rs::error::OllamaError> for GenerationError {
    fn from(error: ollama_rs::error::OllamaError) -> Self {
        use ollama_rs::error::OllamaError;
        match error {
            OllamaError::JsonError(e) => GenerationError::Malformed(e.to_string()),
            OllamaError::ReqwestError(e) if e.is_decode() => GenerationError::Malformed(e.to_string()),
            OllamaError::ReqwestError(e) => GenerationError::Transport(e.to_string()),
            OllamaError::InternalError(e) => GenerationError::Transport(e.message),
            OllamaError::Other(message) => GenerationError::Transport(message),
            other => GenerationError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Fatal outcomes of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
