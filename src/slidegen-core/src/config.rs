//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::DeckError;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub photos: PhotosConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Text-generation models and endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// Model used for the slide outline.
    pub outline_model: String,
    /// Model used to turn slide content into an image search phrase.
    pub image_query_model: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            outline_model: "gemini-1.5-flash".to_string(),
            image_query_model: "gemini-1.5-pro".to_string(),
        }
    }
}

/// Prompt templates.
///
/// `{topic}` and `{num_slides}` are replaced in the outline prompt,
/// `{content}` in the image-query prompt.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub outline: String,
    pub image_query: String,
    /// Search phrase used when the image-query request fails.
    pub fallback_image_query: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            outline: DEFAULT_OUTLINE_PROMPT.to_string(),
            image_query: DEFAULT_IMAGE_QUERY_PROMPT.to_string(),
            fallback_image_query: FALLBACK_IMAGE_QUERY.to_string(),
        }
    }
}

/// Stock-photo search settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhotosConfig {
    pub endpoint: String,
    pub orientation: String,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.pexels.com/v1/search".to_string(),
            orientation: "landscape".to_string(),
        }
    }
}

/// Values used when the command line leaves them out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub topic: String,
    pub num_slides: usize,
    pub output: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            topic: "Animal Kingdom".to_string(),
            num_slides: 7,
            output: "AI_Presentation.pptx".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DeckError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, DeckError> {
        toml::from_str(content)
            .map_err(|e| DeckError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Get the outline prompt with placeholders replaced.
    pub fn outline_prompt(&self, topic: &str, num_slides: usize) -> String {
        self.prompts
            .outline
            .replace("{topic}", topic)
            .replace("{num_slides}", &num_slides.to_string())
    }

    /// Get the image-query prompt with placeholders replaced.
    pub fn image_query_prompt(&self, content: &str) -> String {
        self.prompts.image_query.replace("{content}", content)
    }
}

impl Default for Config {
    fn default() -> Self {
        default_config()
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config {
        models: ModelsConfig::default(),
        prompts: PromptsConfig::default(),
        photos: PhotosConfig::default(),
        defaults: DefaultsConfig::default(),
    }
}

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const FALLBACK_IMAGE_QUERY: &str = "abstract technology background";

const DEFAULT_OUTLINE_PROMPT: &str = r#"Create a content outline for a presentation on the topic '{topic}' with {num_slides} slides.
Provide a title slide, several content slides, and a conclusion slide.
Return the response as a valid JSON array with the following structure for each slide:
[
    {
        "title": "Slide Title",
        "content": "Main content points as bullet points, separated by newlines.",
        "slide_type": "title|content|image|conclusion"
    }
]
The response must be only the JSON array and nothing else.
"#;

const DEFAULT_IMAGE_QUERY_PROMPT: &str = r#"Based on the following slide content, suggest a relevant image search query.
Content: {content}
Return only a brief descriptive phrase suitable for an image search (max 5 words).
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.models.outline_model, "gemini-1.5-flash");
        assert_eq!(config.models.image_query_model, "gemini-1.5-pro");
        assert_eq!(config.photos.orientation, "landscape");
        assert_eq!(config.defaults.num_slides, 7);
        assert_eq!(config.prompts.fallback_image_query, FALLBACK_IMAGE_QUERY);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_str(
            r#"
            [models]
            outline_model = "gpt-4o-mini"

            [defaults]
            topic = "Volcanoes"
            "#,
        )
        .unwrap();

        assert_eq!(config.models.outline_model, "gpt-4o-mini");
        assert_eq!(config.models.image_query_model, "gemini-1.5-pro");
        assert_eq!(config.models.api_base, DEFAULT_API_BASE);
        assert_eq!(config.defaults.topic, "Volcanoes");
        assert_eq!(config.defaults.output, "AI_Presentation.pptx");
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_str("[models\noutline_model = 1").unwrap_err();
        assert!(matches!(err, DeckError::ConfigError(_)));
    }

    #[test]
    fn test_prompt_placeholders() {
        let config = default_config();
        let prompt = config.outline_prompt("Animal Kingdom", 3);
        assert!(prompt.contains("'Animal Kingdom' with 3 slides"));
        assert!(!prompt.contains("{topic}"));

        let prompt = config.image_query_prompt("- Warm blooded");
        assert!(prompt.contains("Content: - Warm blooded"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/slidegen.toml").unwrap_err();
        assert!(matches!(err, DeckError::ConfigError(_)));
    }
}
