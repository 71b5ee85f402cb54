use anyhow::Context as _;
use log::info;

use crate::config::Config;
use crate::errors::PipelineError;
use crate::models::prompt::{GenerationReply, PromptDocument};
use crate::services::aggregator::Aggregator;
use crate::services::calendar_service::{CalendarFetcher, GoogleCalendarClient};
use crate::services::credential_store::CredentialStore;
use crate::services::gmail_service::{GmailClient, MailFetcher};
use crate::services::llm_service::{GenerationClient, OllamaGenerator};
use crate::services::oauth_service::InstalledAppFlow;
use crate::services::prompt_service::{load_prefix, PromptAssembler};
use crate::services::weather_service::{OpenWeatherClient, WeatherFetcher};

/// Result of one run: the prompt that was sent and what came back.
#[derive(Debug, Clone)]
pub struct Briefing {
    pub document: PromptDocument,
    pub reply: GenerationReply,
}

pub struct Pipeline {
    aggregator: Aggregator,
    assembler: PromptAssembler,
    generator: Box<dyn GenerationClient>,
}

impl Pipeline {
    pub fn new(
        aggregator: Aggregator,
        assembler: PromptAssembler,
        generator: Box<dyn GenerationClient>,
    ) -> Self {
        Pipeline {
            aggregator,
            assembler,
            generator,
        }
    }

    /// Wires the real provider clients from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let flow = InstalledAppFlow::from_client_secret_file(&config.client_secret_file)
            .context("Unable to load OAuth client secret")?;
        let credentials = CredentialStore::new(&config.token_file, Box::new(flow));

        let weather = OpenWeatherClient::new(&config.weather_api_key, config.request_timeout)
            .context("Unable to build weather client")?;
        let gmail = GmailClient::new(config.request_timeout).context("Unable to build Gmail client")?;
        let calendar = GoogleCalendarClient::new(config.request_timeout)
            .context("Unable to build Calendar client")?;

        let aggregator = Aggregator::new(
            credentials,
            Config::required_scopes(),
            WeatherFetcher::new(Box::new(weather), config.latitude, config.longitude),
            MailFetcher::new(Box::new(gmail), config.email_limit),
            CalendarFetcher::new(Box::new(calendar), config.excluded_calendar.clone()),
        );
        let assembler = PromptAssembler::new(
            load_prefix(&config.prompt_prefix_file),
            config.location_name.clone(),
        );
        let generator = OllamaGenerator::new(
            config.ollama_url.clone(),
            config.model.clone(),
            config.request_timeout,
        );

        Ok(Pipeline::new(aggregator, assembler, Box::new(generator)))
    }

    /// Aggregates every source and renders the prompt.
    pub async fn prepare(&self) -> Result<PromptDocument, PipelineError> {
        let context = self.aggregator.aggregate().await?;
        Ok(self.assembler.render(&context))
    }

    pub async fn generate(&self, document: &PromptDocument) -> Result<GenerationReply, PipelineError> {
        let reply = self.generator.generate(document).await?;
        info!("Received {} characters from the model", reply.text.len());
        Ok(reply)
    }

    pub async fn run(&self) -> Result<Briefing, PipelineError> {
        let document = self.prepare().await?;
        let reply = self.generate(&document).await?;
        Ok(Briefing { document, reply })
    }
}
