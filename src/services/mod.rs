pub mod aggregator;
pub mod calendar_service;
pub mod credential_store;
pub mod gmail_service;
pub mod llm_service;
pub mod oauth_service;
pub mod pipeline;
pub mod prompt_service;
pub mod weather_service;
