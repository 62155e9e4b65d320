//! Slide assembly.
//!
//! Renderers turn a [`SlideSpec`] into an immutable [`RenderedSlide`]
//! descriptor. Nothing here performs I/O: pictures arrive already fetched and
//! decoded, and the finished descriptors are handed to the `pptx` writer.

use image::ImageReader;
use std::io::Cursor;

use crate::error::DeckError;
use crate::outline::{SlideSpec, SlideType};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Slide size: 10in x 7.5in (4:3).
pub const SLIDE_WIDTH: i64 = 10 * EMU_PER_INCH;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

const NAVY: Rgb = Rgb(0, 0, 128);
const DIM_GRAY: Rgb = Rgb(105, 105, 105);

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Placeholder frames matching the bundled slide layouts.
pub mod frames {
    use super::Frame;

    pub const CENTERED_TITLE: Frame = Frame::new(685_800, 2_130_425, 7_772_400, 1_470_025);
    pub const SUBTITLE: Frame = Frame::new(1_371_600, 3_886_200, 6_400_800, 1_752_600);
    pub const TITLE: Frame = Frame::new(457_200, 274_638, 8_229_600, 1_143_000);
    pub const BODY: Frame = Frame::new(457_200, 1_600_200, 8_229_600, 4_525_963);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Character formatting. `None` keeps whatever the layout defines.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
}

impl TextStyle {
    pub fn sized(size: f64) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: TextStyle,
    pub align: Option<Align>,
    /// Outline level, 0 for top-level bullets.
    pub level: u8,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            align: None,
            level: 0,
        }
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }
}

/// Which layout placeholder a shape fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    CenteredTitle,
    Subtitle,
    Title,
    Body,
}

/// Encoding of an embedded picture, as stored in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::Tiff => "tiff",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Tiff => "image/tiff",
        }
    }
}

fn unreadable(e: impl std::fmt::Display) -> DeckError {
    DeckError::UnreadableImage(e.to_string())
}

/// Picture bytes ready to be embedded, with their pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub kind: ImageKind,
    pub width_px: u32,
    pub height_px: u32,
    /// Alt text written to the picture's description.
    pub description: String,
}

impl EmbeddedImage {
    /// Inspect downloaded bytes. Formats a presentation cannot embed
    /// directly (WebP and friends) are re-encoded as PNG.
    pub fn decode(data: Vec<u8>, description: impl Into<String>) -> Result<Self, DeckError> {
        let reader = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(unreadable)?;
        let format = reader.format();
        let (width_px, height_px) = reader.into_dimensions().map_err(unreadable)?;

        if width_px == 0 || height_px == 0 {
            return Err(DeckError::UnreadableImage("image has no pixels".to_string()));
        }

        let kind = match format {
            Some(image::ImageFormat::Png) => Some(ImageKind::Png),
            Some(image::ImageFormat::Jpeg) => Some(ImageKind::Jpeg),
            Some(image::ImageFormat::Gif) => Some(ImageKind::Gif),
            Some(image::ImageFormat::Bmp) => Some(ImageKind::Bmp),
            Some(image::ImageFormat::Tiff) => Some(ImageKind::Tiff),
            _ => None,
        };

        let (data, kind) = match kind {
            Some(kind) => (data, kind),
            None => {
                let decoded = image::load_from_memory(&data).map_err(unreadable)?;
                let mut png = Vec::new();
                decoded
                    .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                    .map_err(unreadable)?;
                (png, ImageKind::Png)
            }
        };

        Ok(Self {
            data,
            kind,
            width_px,
            height_px,
            description: description.into(),
        })
    }

    /// Width in EMU when scaled to `height`, keeping the aspect ratio.
    pub fn width_for_height(&self, height: i64) -> i64 {
        (height as f64 * self.width_px as f64 / self.height_px as f64).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Placeholder {
        role: Placeholder,
        frame: Frame,
        paragraphs: Vec<Paragraph>,
    },
    TextBox {
        frame: Frame,
        paragraphs: Vec<Paragraph>,
        word_wrap: bool,
    },
    Picture {
        frame: Frame,
        image: EmbeddedImage,
    },
}

/// Slide layouts bundled in the package, in package order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideLayout {
    TitleSlide,
    TitleAndContent,
    TitleOnly,
}

impl SlideLayout {
    pub const ALL: [SlideLayout; 3] = [
        SlideLayout::TitleSlide,
        SlideLayout::TitleAndContent,
        SlideLayout::TitleOnly,
    ];

    /// 1-based number of the layout part (`slideLayoutN.xml`).
    pub fn part_number(&self) -> usize {
        match self {
            SlideLayout::TitleSlide => 1,
            SlideLayout::TitleAndContent => 2,
            SlideLayout::TitleOnly => 3,
        }
    }
}

/// One finished slide.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub layout: SlideLayout,
    pub shapes: Vec<Shape>,
}

impl RenderedSlide {
    /// Text of the title placeholder, if any.
    pub fn title(&self) -> Option<&str> {
        self.shapes.iter().find_map(|shape| match shape {
            Shape::Placeholder {
                role: Placeholder::Title | Placeholder::CenteredTitle,
                paragraphs,
                ..
            } => paragraphs.first().map(|p| p.text.as_str()),
            _ => None,
        })
    }

    pub fn pictures(&self) -> impl Iterator<Item = &EmbeddedImage> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Picture { image, .. } => Some(image),
            _ => None,
        })
    }
}

/// Renderer chosen for a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Title,
    Content { include_image: bool },
    Image,
}

impl Renderer {
    /// Pick the renderer for the slide at `position` in the outline.
    ///
    /// The first slide is always a title slide. Unknown types get the full
    /// content treatment, picture included.
    pub fn for_slide(spec: &SlideSpec, position: usize) -> Self {
        if position == 0 {
            return Renderer::Title;
        }
        match spec.slide_type {
            SlideType::Title => Renderer::Title,
            SlideType::Image => Renderer::Image,
            SlideType::Conclusion => Renderer::Content {
                include_image: false,
            },
            SlideType::Content | SlideType::Other(_) => Renderer::Content {
                include_image: true,
            },
        }
    }

    pub fn wants_image(&self) -> bool {
        matches!(
            self,
            Renderer::Image
                | Renderer::Content {
                    include_image: true
                }
        )
    }
}

/// Title slide: large navy title, optional grey italic subtitle.
pub fn render_title_slide(spec: &SlideSpec) -> RenderedSlide {
    let mut shapes = vec![Shape::Placeholder {
        role: Placeholder::CenteredTitle,
        frame: frames::CENTERED_TITLE,
        paragraphs: vec![
            Paragraph::new(&spec.title, TextStyle::sized(40.0).bold().color(NAVY))
                .aligned(Align::Center),
        ],
    }];

    if !spec.content.is_empty() {
        shapes.push(Shape::Placeholder {
            role: Placeholder::Subtitle,
            frame: frames::SUBTITLE,
            paragraphs: vec![
                Paragraph::new(
                    &spec.content,
                    TextStyle::sized(24.0).italic().color(DIM_GRAY),
                )
                .aligned(Align::Center),
            ],
        });
    }

    RenderedSlide {
        layout: SlideLayout::TitleSlide,
        shapes,
    }
}

/// Title and bullets. With a picture the bullets move left to make room.
pub fn render_content_slide(spec: &SlideSpec, picture: Option<EmbeddedImage>) -> RenderedSlide {
    let bullets = bullet_points(&spec.content)
        .into_iter()
        .map(|point| Paragraph::new(point, TextStyle::sized(18.0)))
        .collect();

    let mut body = frames::BODY;
    if picture.is_some() {
        body.width = inches(5.5);
    }

    let mut shapes = vec![
        Shape::Placeholder {
            role: Placeholder::Title,
            frame: frames::TITLE,
            paragraphs: vec![Paragraph::new(
                &spec.title,
                TextStyle::sized(32.0).bold().color(NAVY),
            )],
        },
        Shape::Placeholder {
            role: Placeholder::Body,
            frame: body,
            paragraphs: bullets,
        },
    ];

    if let Some(image) = picture {
        let height = inches(4.0);
        let frame = Frame::new(
            inches(4.25),
            inches(1.75),
            image.width_for_height(height),
            height,
        );
        shapes.push(Shape::Picture { frame, image });
    }

    RenderedSlide {
        layout: SlideLayout::TitleAndContent,
        shapes,
    }
}

/// Title, a centered picture and the content as a caption underneath.
pub fn render_image_slide(spec: &SlideSpec, picture: Option<EmbeddedImage>) -> RenderedSlide {
    let mut shapes = vec![Shape::Placeholder {
        role: Placeholder::Title,
        frame: frames::TITLE,
        paragraphs: vec![Paragraph::new(&spec.title, TextStyle::default()).aligned(Align::Center)],
    }];

    if !spec.content.is_empty() {
        shapes.push(Shape::TextBox {
            frame: Frame::new(inches(0.5), inches(6.0), inches(9.0), inches(1.0)),
            paragraphs: vec![
                Paragraph::new(&spec.content, TextStyle::sized(16.0)).aligned(Align::Center),
            ],
            word_wrap: true,
        });
    }

    if let Some(image) = picture {
        let height = inches(4.5);
        let width = image.width_for_height(height);
        let x = ((SLIDE_WIDTH - width) / 2).max(0);
        shapes.push(Shape::Picture {
            frame: Frame::new(x, inches(1.5), width, height),
            image,
        });
    }

    RenderedSlide {
        layout: SlideLayout::TitleOnly,
        shapes,
    }
}

/// Split bullet text into points, dropping list markers.
pub fn bullet_points(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| line.trim_matches(['-', ' ']).trim().to_string())
        .collect()
}
