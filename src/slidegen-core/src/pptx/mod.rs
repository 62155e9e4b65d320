//! PowerPoint (.pptx) package writer.
//!
//! Serializes a finished list of [`RenderedSlide`]s into an OPC zip
//! package. The writer only ever sees complete slides, so a failure here
//! never leaves a half-built deck behind in memory.

pub mod slide;
pub mod template;

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::DeckError;
use crate::layout::{ImageKind, RenderedSlide, SlideLayout};
use slide::MediaRef;
use template::Relationship;

pub(crate) type PackageResult<T> = Result<T, DeckError>;

pub(crate) fn fmt_err(e: std::fmt::Error) -> DeckError {
    DeckError::Package(e.to_string())
}

pub(crate) fn package_error(message: impl Into<String>) -> DeckError {
    DeckError::Package(message.into())
}

fn zip_err(e: zip::result::ZipError) -> DeckError {
    DeckError::Package(e.to_string())
}

/// Escape XML special characters and drop control characters XML 1.0 forbids.
pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Write the deck to `path`, replacing any existing file.
pub fn save_deck<P: AsRef<Path>>(slides: &[RenderedSlide], path: P) -> Result<(), DeckError> {
    let file = File::create(path.as_ref())?;
    let mut writer = write_deck(slides, BufWriter::new(file))?;
    writer.flush()?;
    Ok(())
}

/// Write the deck as a zip package into `writer` and hand the writer back.
pub fn write_deck<W: Write + Seek>(slides: &[RenderedSlide], writer: W) -> Result<W, DeckError> {
    if slides.is_empty() {
        return Err(package_error("a presentation needs at least one slide"));
    }

    let mut zip = ZipWriter::new(writer);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    // Already-compressed image data is stored as is.
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let add_part = |zip: &mut ZipWriter<W>, name: &str, data: &[u8], opts: SimpleFileOptions| {
        zip.start_file(name, opts).map_err(zip_err)?;
        zip.write_all(data)?;
        Ok::<(), DeckError>(())
    };

    // Assign media names up front; content types need the full set.
    let mut media_counter = 0usize;
    let mut image_kinds: Vec<ImageKind> = Vec::new();
    let media_per_slide: Vec<Vec<MediaRef>> = slides
        .iter()
        .map(|slide| {
            slide
                .pictures()
                .enumerate()
                .map(|(i, image)| {
                    media_counter += 1;
                    image_kinds.push(image.kind);
                    MediaRef {
                        // rId1 is the slide layout
                        rel_id: format!("rId{}", i + 2),
                        file_name: format!("image{}.{}", media_counter, image.kind.extension()),
                    }
                })
                .collect()
        })
        .collect();

    let title = slides[0].title().unwrap_or_default();

    add_part(
        &mut zip,
        "[Content_Types].xml",
        template::content_types_xml(slides.len(), &image_kinds)?.as_bytes(),
        options,
    )?;
    add_part(
        &mut zip,
        "_rels/.rels",
        template::relationships_xml(&template::root_relationships())?.as_bytes(),
        options,
    )?;
    add_part(
        &mut zip,
        "docProps/core.xml",
        template::core_properties_xml(title)?.as_bytes(),
        options,
    )?;
    add_part(
        &mut zip,
        "docProps/app.xml",
        template::app_properties_xml(slides.len())?.as_bytes(),
        options,
    )?;

    add_part(
        &mut zip,
        "ppt/presentation.xml",
        template::presentation_xml(slides.len())?.as_bytes(),
        options,
    )?;
    add_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        template::relationships_xml(&template::presentation_relationships(slides.len()))?
            .as_bytes(),
        options,
    )?;
    add_part(&mut zip, "ppt/presProps.xml", template::PRES_PROPS.as_bytes(), options)?;
    add_part(&mut zip, "ppt/viewProps.xml", template::VIEW_PROPS.as_bytes(), options)?;
    add_part(&mut zip, "ppt/tableStyles.xml", template::TABLE_STYLES.as_bytes(), options)?;
    add_part(&mut zip, "ppt/theme/theme1.xml", template::THEME.as_bytes(), options)?;

    add_part(
        &mut zip,
        "ppt/slideMasters/slideMaster1.xml",
        template::SLIDE_MASTER.as_bytes(),
        options,
    )?;
    add_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        template::relationships_xml(&template::master_relationships())?.as_bytes(),
        options,
    )?;

    let layout_rels = template::relationships_xml(&template::layout_relationships())?;
    for layout in SlideLayout::ALL {
        let number = layout.part_number();
        add_part(
            &mut zip,
            &format!("ppt/slideLayouts/slideLayout{}.xml", number),
            template::slide_layout_xml(layout).as_bytes(),
            options,
        )?;
        add_part(
            &mut zip,
            &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", number),
            layout_rels.as_bytes(),
            options,
        )?;
    }

    for (index, (rendered, media)) in slides.iter().zip(&media_per_slide).enumerate() {
        let number = index + 1;
        add_part(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", number),
            slide::slide_xml(rendered, media)?.as_bytes(),
            options,
        )?;

        let rels: Vec<Relationship> = slide::slide_relationships(rendered, media);
        add_part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            template::relationships_xml(&rels)?.as_bytes(),
            options,
        )?;

        for (image, media_ref) in rendered.pictures().zip(media) {
            add_part(
                &mut zip,
                &format!("ppt/media/{}", media_ref.file_name),
                &image.data,
                stored,
            )?;
        }
    }

    zip.finish().map_err(zip_err)
}
