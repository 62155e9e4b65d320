//! Deck building.
//!
//! Runs the whole pipeline for one topic: outline, per-slide pictures,
//! layout and the final package write. Progress is reported through an
//! optional event callback.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::DeckError;
use crate::generator::{
    ImageQuery, OpenAiTextGenerator, TextGenerator, generate_image_query, generate_outline,
};
use crate::layout::{
    EmbeddedImage, RenderedSlide, Renderer, render_content_slide, render_image_slide,
    render_title_slide,
};
use crate::outline::{Outline, SlideSpec};
use crate::photo::{PexelsClient, PhotoSource};
use crate::pptx::save_deck;

/// Callback for deck events.
pub type DeckCallback = Box<dyn Fn(DeckEvent) + Send + Sync>;

/// Events emitted while a deck is built.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    /// The outline request is about to be sent.
    OutlineRequested { topic: String, num_slides: usize },
    /// The outline was parsed.
    OutlineReady { slides: usize },
    /// A slide is being assembled. `index` counts from 1.
    SlideStarted {
        index: usize,
        total: usize,
        title: String,
        slide_type: String,
    },
    /// The image-query request failed and the fallback phrase is used instead.
    ImageQueryFallback {
        title: String,
        phrase: String,
        reason: String,
    },
    /// No picture for this slide.
    ImageSkipped { title: String, reason: String },
    /// A picture was placed on the slide.
    ImagePlaced { title: String, query: String },
    /// The presentation file was written.
    Saved { path: PathBuf, slides: usize },
}

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct DeckReport {
    pub outline: Outline,
    pub path: PathBuf,
    pub slides: usize,
    pub pictures: usize,
}

/// Builds presentations from a topic.
pub struct DeckBuilder {
    config: Config,
    text: Box<dyn TextGenerator>,
    photos: Box<dyn PhotoSource>,
    /// Whether slides that can carry a picture try to fetch one.
    images: bool,
    callback: Option<DeckCallback>,
}

impl DeckBuilder {
    /// Create a builder backed by the configured chat endpoint and Pexels.
    ///
    /// Without a Pexels key every slide is built without a picture.
    pub fn new(
        config: Config,
        api_key: &str,
        pexels_key: Option<String>,
    ) -> Result<Self, DeckError> {
        let text = OpenAiTextGenerator::new(&config.models.api_base, api_key)?;
        let photos = PexelsClient::new(pexels_key, config.photos.clone())?;
        let images = photos.has_key();

        Ok(Self::with_sources(config, Box::new(text), Box::new(photos)).with_images(images))
    }

    /// Create a builder from arbitrary text and photo sources.
    pub fn with_sources(
        config: Config,
        text: Box<dyn TextGenerator>,
        photos: Box<dyn PhotoSource>,
    ) -> Self {
        Self {
            config,
            text,
            photos,
            images: true,
            callback: None,
        }
    }

    /// Set a callback for deck events.
    pub fn with_callback(mut self, callback: DeckCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Turn picture fetching on or off.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.images = enabled;
        self
    }

    pub fn images_enabled(&self) -> bool {
        self.images
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a deck for `topic` and write it to `output`.
    ///
    /// Fails only when the outline cannot be obtained or the file cannot be
    /// written. Picture problems leave the slide without a picture.
    pub async fn build(
        &self,
        topic: &str,
        num_slides: usize,
        output: &Path,
    ) -> Result<DeckReport, DeckError> {
        self.emit_event(DeckEvent::OutlineRequested {
            topic: topic.to_string(),
            num_slides,
        });
        let outline = generate_outline(self.text.as_ref(), &self.config, topic, num_slides).await?;
        self.emit_event(DeckEvent::OutlineReady {
            slides: outline.len(),
        });

        let slides = self.render(&outline).await;
        let pictures = slides.iter().map(|slide| slide.pictures().count()).sum();

        save_deck(&slides, output)?;
        self.emit_event(DeckEvent::Saved {
            path: output.to_path_buf(),
            slides: slides.len(),
        });

        Ok(DeckReport {
            outline,
            path: output.to_path_buf(),
            slides: slides.len(),
            pictures,
        })
    }

    /// Lay out every slide of `outline`, in order, fetching pictures as needed.
    pub async fn render(&self, outline: &Outline) -> Vec<RenderedSlide> {
        let total = outline.len();
        let mut slides = Vec::with_capacity(total);

        for (position, spec) in outline.slides().iter().enumerate() {
            self.emit_event(DeckEvent::SlideStarted {
                index: position + 1,
                total,
                title: spec.title.clone(),
                slide_type: spec.slide_type.to_string(),
            });

            let renderer = Renderer::for_slide(spec, position);
            let picture = if self.images && renderer.wants_image() {
                self.fetch_picture(spec).await
            } else {
                None
            };

            let slide = match renderer {
                Renderer::Title => render_title_slide(spec),
                Renderer::Content { .. } => render_content_slide(spec, picture),
                Renderer::Image => render_image_slide(spec, picture),
            };
            slides.push(slide);
        }

        slides
    }

    /// Query, download and decode a picture for one slide.
    ///
    /// Every failure is reported and turns into `None`. The downloaded file
    /// is gone by the time this returns.
    async fn fetch_picture(&self, spec: &SlideSpec) -> Option<EmbeddedImage> {
        let query = generate_image_query(self.text.as_ref(), &self.config, &spec.content).await;
        if let ImageQuery::Fallback { phrase, reason } = &query {
            self.emit_event(DeckEvent::ImageQueryFallback {
                title: spec.title.clone(),
                phrase: phrase.clone(),
                reason: reason.clone(),
            });
        }

        let photo = match self.photos.fetch(query.phrase()).await {
            Ok(photo) => photo,
            Err(e) => {
                self.skip_picture(spec, &e);
                return None;
            }
        };

        let decoded = photo
            .read()
            .and_then(|bytes| EmbeddedImage::decode(bytes, query.phrase()));
        drop(photo);

        match decoded {
            Ok(image) => {
                self.emit_event(DeckEvent::ImagePlaced {
                    title: spec.title.clone(),
                    query: query.phrase().to_string(),
                });
                Some(image)
            }
            Err(e) => {
                self.skip_picture(spec, &e);
                None
            }
        }
    }

    fn skip_picture(&self, spec: &SlideSpec, error: &DeckError) {
        self.emit_event(DeckEvent::ImageSkipped {
            title: spec.title.clone(),
            reason: error.to_string(),
        });
    }

    fn emit_event(&self, event: DeckEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::layout::{Shape, SlideLayout};
    use crate::photo::DownloadedPhoto;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    const ANIMAL_KINGDOM: &str = r#"```json
[
  {"title": "Animal Kingdom", "content": "A tour of life on Earth", "slide_type": "title"},
  {"title": "Mammals", "content": "- Warm blooded\n- Hair or fur", "slide_type": "content"},
  {"title": "Summary", "content": "- Animals are diverse", "slide_type": "conclusion"}
]
```"#;

    /// Answers outline requests with `outline` and image-query requests with `query`.
    struct FakeText {
        outline: String,
        query: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TextGenerator for FakeText {
        async fn complete(&self, model: &str, _prompt: &str) -> Result<String, DeckError> {
            self.calls.lock().unwrap().push(model.to_string());
            if model == "gemini-1.5-flash" {
                return Ok(self.outline.clone());
            }
            self.query
                .clone()
                .ok_or_else(|| DeckError::ConfigError("quota exceeded".to_string()))
        }
    }

    /// Serves fixed bytes and remembers what it was asked for and where it wrote.
    #[derive(Default)]
    struct FakePhotos {
        bytes: Option<Vec<u8>>,
        queries: Arc<Mutex<Vec<String>>>,
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    #[async_trait]
    impl PhotoSource for FakePhotos {
        async fn fetch(&self, query: &str) -> Result<DownloadedPhoto, DeckError> {
            self.queries.lock().unwrap().push(query.to_string());
            let bytes = self
                .bytes
                .as_ref()
                .ok_or_else(|| DeckError::ImageNotFound(query.to_string()))?;
            let photo = DownloadedPhoto::from_bytes(bytes)?;
            self.paths.lock().unwrap().push(photo.path().to_path_buf());
            Ok(photo)
        }
    }

    fn png() -> Vec<u8> {
        let mut data = Vec::new();
        image::RgbImage::new(8, 6)
            .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        data
    }

    struct Harness {
        builder: DeckBuilder,
        text_calls: Arc<Mutex<Vec<String>>>,
        queries: Arc<Mutex<Vec<String>>>,
        paths: Arc<Mutex<Vec<PathBuf>>>,
        events: Arc<Mutex<Vec<DeckEvent>>>,
    }

    fn harness(outline: &str, query: Option<&str>, photo: Option<Vec<u8>>) -> Harness {
        let text = FakeText {
            outline: outline.to_string(),
            query: query.map(str::to_string),
            calls: Arc::default(),
        };
        let photos = FakePhotos {
            bytes: photo,
            ..Default::default()
        };
        let events: Arc<Mutex<Vec<DeckEvent>>> = Arc::default();

        let text_calls = Arc::clone(&text.calls);
        let queries = Arc::clone(&photos.queries);
        let paths = Arc::clone(&photos.paths);
        let sink = Arc::clone(&events);

        let builder = DeckBuilder::with_sources(default_config(), Box::new(text), Box::new(photos))
            .with_callback(Box::new(move |event: DeckEvent| sink.lock().unwrap().push(event)));

        Harness {
            builder,
            text_calls,
            queries,
            paths,
            events,
        }
    }

    fn outline(json: &str) -> Outline {
        crate::outline::parse_outline(json).unwrap()
    }

    #[tokio::test]
    async fn test_animal_kingdom_end_to_end() {
        let h = harness(ANIMAL_KINGDOM, Some("lion on savanna"), Some(png()));
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("AI_Presentation.pptx");

        let report = h.builder.build("Animal Kingdom", 3, &output).await.unwrap();
        assert_eq!(report.slides, 3);
        assert_eq!(report.pictures, 1);
        assert_eq!(report.outline.title_slide().title, "Animal Kingdom");
        assert!(output.exists());

        // Only the content slide asks for a picture.
        assert_eq!(*h.queries.lock().unwrap(), vec!["lion on savanna".to_string()]);
        assert_eq!(
            *h.text_calls.lock().unwrap(),
            vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()]
        );

        let events = h.events.lock().unwrap();
        let started: Vec<&DeckEvent> = events
            .iter()
            .filter(|e| matches!(e, DeckEvent::SlideStarted { .. }))
            .collect();
        assert_eq!(started.len(), 3);
        assert_eq!(
            started[1],
            &DeckEvent::SlideStarted {
                index: 2,
                total: 3,
                title: "Mammals".to_string(),
                slide_type: "content".to_string(),
            }
        );
        assert!(events.contains(&DeckEvent::ImagePlaced {
            title: "Mammals".to_string(),
            query: "lion on savanna".to_string(),
        }));
        assert!(matches!(events.last(), Some(DeckEvent::Saved { slides: 3, .. })));
    }

    #[tokio::test]
    async fn test_one_slide_per_spec_title_first() {
        let h = harness("", Some("x"), Some(png()));
        let outline = outline(
            r#"[
                {"title": "Oceans", "slide_type": "content"},
                {"title": "Tides", "slide_type": "image"},
                {"title": "Waves", "slide_type": "title"},
                {"title": "Reefs"},
                {"title": "End", "slide_type": "conclusion"}
            ]"#,
        );

        let slides = h.builder.render(&outline).await;
        assert_eq!(slides.len(), 5);
        assert_eq!(slides[0].layout, SlideLayout::TitleSlide);
        assert_eq!(slides[1].layout, SlideLayout::TitleOnly);
        assert_eq!(slides[2].layout, SlideLayout::TitleSlide);
        assert_eq!(slides[3].layout, SlideLayout::TitleAndContent);
        assert_eq!(slides[4].layout, SlideLayout::TitleAndContent);

        // The first slide never fetches, even though it says "content".
        assert_eq!(h.queries.lock().unwrap().len(), 2);
        assert_eq!(slides[4].pictures().count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_type_gets_content_with_image() {
        let h = harness("", Some("chart"), Some(png()));
        let outline = outline(
            r#"[{"title": "T"}, {"title": "Recap", "content": "- a", "slide_type": "summary"}]"#,
        );

        let slides = h.builder.render(&outline).await;
        assert_eq!(slides[1].layout, SlideLayout::TitleAndContent);
        assert_eq!(slides[1].pictures().count(), 1);
        assert_eq!(*h.queries.lock().unwrap(), vec!["chart".to_string()]);
    }

    #[tokio::test]
    async fn test_temp_files_removed_after_build() {
        let h = harness("", Some("owl"), Some(png()));
        let outline = outline(
            r#"[{"title": "T"}, {"title": "Owls", "slide_type": "image"}, {"title": "Bats"}]"#,
        );

        h.builder.render(&outline).await;
        let paths = h.paths.lock().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|path| !path.exists()));
    }

    #[tokio::test]
    async fn test_undecodable_photo_is_skipped() {
        let h = harness("", Some("owl"), Some(b"<html>not an image</html>".to_vec()));
        let outline = outline(r#"[{"title": "T"}, {"title": "Owls", "slide_type": "image"}]"#);

        let slides = h.builder.render(&outline).await;
        assert_eq!(slides.len(), 2);
        assert!(
            !slides[1]
                .shapes
                .iter()
                .any(|shape| matches!(shape, Shape::Picture { .. }))
        );
        assert!(h.paths.lock().unwrap().iter().all(|path| !path.exists()));
        assert!(
            h.events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, DeckEvent::ImageSkipped { title, .. } if title == "Owls"))
        );
    }

    #[tokio::test]
    async fn test_missing_photo_and_query_fallback() {
        let h = harness("", None, None);
        let outline = outline(r#"[{"title": "T"}, {"title": "Mammals", "content": "- Fur"}]"#);

        let slides = h.builder.render(&outline).await;
        assert_eq!(slides[1].pictures().count(), 0);
        assert_eq!(
            *h.queries.lock().unwrap(),
            vec![crate::config::FALLBACK_IMAGE_QUERY.to_string()]
        );

        let events = h.events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(e, DeckEvent::ImageQueryFallback { .. })));
        assert!(events.iter().any(|e| matches!(e, DeckEvent::ImageSkipped { .. })));
    }

    #[tokio::test]
    async fn test_images_disabled() {
        let h = harness("", Some("owl"), Some(png()));
        let builder = h.builder.with_images(false);
        let outline = outline(r#"[{"title": "T"}, {"title": "Owls", "slide_type": "image"}]"#);

        let slides = builder.render(&outline).await;
        assert_eq!(slides[1].pictures().count(), 0);
        assert!(h.queries.lock().unwrap().is_empty());
        assert!(h.text_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outline_failure_aborts_before_any_slide() {
        let h = harness("I'm sorry, I can't help with that.", Some("x"), Some(png()));
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deck.pptx");

        let err = h.builder.build("Animal Kingdom", 3, &output).await.unwrap_err();
        assert!(matches!(err, DeckError::OutlineParse(_)));
        assert!(!output.exists());
        assert!(h.queries.lock().unwrap().is_empty());
        assert!(
            !h.events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, DeckEvent::SlideStarted { .. }))
        );
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = DeckBuilder::new(default_config(), "", Some("pexels".to_string()));
        assert!(matches!(result, Err(DeckError::CredentialMissing(_))));
    }

    #[test]
    fn test_new_without_pexels_key_disables_images() {
        let builder = DeckBuilder::new(default_config(), "google-key", None).unwrap();
        assert!(!builder.images_enabled());

        let builder = DeckBuilder::new(default_config(), "google-key", Some("p".to_string())).unwrap();
        assert!(builder.images_enabled());
    }
}
