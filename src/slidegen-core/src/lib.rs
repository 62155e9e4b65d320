//! slidegen Core Library
//!
//! Turns a topic into a PowerPoint deck: outline generation, image search,
//! slide layout and the .pptx writer.

pub mod builder;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod outline;
pub mod photo;
pub mod pptx;

pub use builder::{DeckBuilder, DeckCallback, DeckEvent, DeckReport};
pub use config::{Config, default_config};
pub use error::DeckError;
pub use generator::{ImageQuery, OpenAiTextGenerator, TextGenerator};
pub use layout::RenderedSlide;
pub use outline::{Outline, SlideSpec, SlideType, parse_outline};
pub use photo::{DownloadedPhoto, PexelsClient, PhotoSource};
pub use pptx::{save_deck, write_deck};
