//! Text generation: the outline and image-query requests.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use crate::config::Config;
use crate::error::DeckError;
use crate::outline::{Outline, parse_outline};

/// A service that turns a prompt into a free-text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, DeckError>;
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiTextGenerator {
    client: Client<OpenAIConfig>,
}

impl OpenAiTextGenerator {
    pub fn new(api_base: &str, api_key: &str) -> Result<Self, DeckError> {
        if api_key.trim().is_empty() {
            return Err(DeckError::CredentialMissing("GOOGLE_API_KEY".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                DeckError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, DeckError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: prompt.to_string().into(),
                    name: None,
                },
            )])
            .build()?;

        let response = self.client.chat().create(request).await?;

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

/// Ask for a slide outline. A single attempt; any failure is final.
pub async fn generate_outline(
    generator: &dyn TextGenerator,
    config: &Config,
    topic: &str,
    num_slides: usize,
) -> Result<Outline, DeckError> {
    if num_slides == 0 {
        return Err(DeckError::ConfigError(
            "Slide count must be at least 1".to_string(),
        ));
    }

    let prompt = config.outline_prompt(topic, num_slides);
    let response = generator
        .complete(&config.models.outline_model, &prompt)
        .await?;

    parse_outline(&response)
}

/// Search phrase for a slide's picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageQuery {
    Generated(String),
    /// The request failed and the configured fallback phrase is used.
    Fallback { phrase: String, reason: String },
}

impl ImageQuery {
    pub fn phrase(&self) -> &str {
        match self {
            ImageQuery::Generated(phrase) => phrase,
            ImageQuery::Fallback { phrase, .. } => phrase,
        }
    }
}

/// Ask for a short image search phrase. Never fails.
pub async fn generate_image_query(
    generator: &dyn TextGenerator,
    config: &Config,
    content: &str,
) -> ImageQuery {
    let prompt = config.image_query_prompt(content);
    let fallback = |reason: String| ImageQuery::Fallback {
        phrase: config.prompts.fallback_image_query.clone(),
        reason,
    };

    match generator
        .complete(&config.models.image_query_model, &prompt)
        .await
    {
        Ok(text) => {
            let phrase = text.trim().trim_matches(['"', '\'', '`']).trim();
            if phrase.is_empty() {
                fallback("empty completion".to_string())
            } else {
                ImageQuery::Generated(phrase.to_string())
            }
        }
        Err(e) => fallback(e.to_string()),
    }
}
