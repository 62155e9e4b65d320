//! Stock-photo lookup and download.

use async_trait::async_trait;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::PhotosConfig;
use crate::error::DeckError;

/// A downloaded photo backed by a temporary file.
///
/// The file is removed when this value is dropped, whatever happens to the
/// slide it was meant for.
#[derive(Debug)]
pub struct DownloadedPhoto {
    file: NamedTempFile,
}

impl DownloadedPhoto {
    /// Write `bytes` to a fresh temp file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeckError> {
        let mut file = tempfile::Builder::new()
            .prefix("slidegen-img-")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the downloaded image back from disk.
    pub fn read(&self) -> Result<Vec<u8>, DeckError> {
        Ok(std::fs::read(self.file.path())?)
    }
}

/// Somewhere to find a picture for a search phrase.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<DownloadedPhoto, DeckError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PhotoSrc {
    original: String,
}

/// Pexels search client. Without a key every fetch fails softly.
pub struct PexelsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    settings: PhotosConfig,
}

impl PexelsClient {
    pub fn new(api_key: Option<String>, settings: PhotosConfig) -> Result<Self, DeckError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                DeckError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            settings,
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, api_key: &str, query: &str) -> Result<String, DeckError> {
        let response: SearchResponse = self
            .http
            .get(&self.settings.endpoint)
            .header("Authorization", api_key)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", self.settings.orientation.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_original_url(response, query)
    }
}

fn first_original_url(response: SearchResponse, query: &str) -> Result<String, DeckError> {
    response
        .photos
        .into_iter()
        .next()
        .map(|photo| photo.src.original)
        .ok_or_else(|| DeckError::ImageNotFound(query.to_string()))
}

#[async_trait]
impl PhotoSource for PexelsClient {
    async fn fetch(&self, query: &str) -> Result<DownloadedPhoto, DeckError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DeckError::CredentialMissing("PEXELS_API_KEY".to_string()))?;

        let url = self.lookup(api_key, query).await?;

        let bytes = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        DownloadedPhoto::from_bytes(&bytes)
    }
}
