//! Slide part generation.

use std::fmt::Write as FmtWrite;

use super::template::{Relationship, rel_type};
use super::{PackageResult, escape_xml, fmt_err};
use crate::layout::{Align, Frame, Paragraph, Placeholder, RenderedSlide, Shape};

/// A picture of this slide stored under `ppt/media/`.
pub struct MediaRef {
    /// Relationship id inside the slide part.
    pub rel_id: String,
    /// File name under `ppt/media/`.
    pub file_name: String,
}

/// Generate `slideN.xml`. `media` holds one entry per picture, in shape order.
pub fn slide_xml(slide: &RenderedSlide, media: &[MediaRef]) -> PackageResult<String> {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
    xml.push_str("<p:cSld>");
    xml.push_str("<p:spTree>");

    // Group shape properties (required)
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str("<p:grpSpPr><a:xfrm>");
    xml.push_str(r#"<a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#);
    xml.push_str(r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/>"#);
    xml.push_str("</a:xfrm></p:grpSpPr>");

    let mut pictures = media.iter();
    for (index, shape) in slide.shapes.iter().enumerate() {
        // id 1 is the group
        let shape_id = index as u32 + 2;
        match shape {
            Shape::Placeholder {
                role,
                frame,
                paragraphs,
            } => write_placeholder(&mut xml, shape_id, *role, frame, paragraphs)?,
            Shape::TextBox {
                frame,
                paragraphs,
                word_wrap,
            } => write_text_box(&mut xml, shape_id, frame, paragraphs, *word_wrap)?,
            Shape::Picture { frame, image } => {
                let media_ref = pictures.next().ok_or_else(|| {
                    super::package_error("picture without a media relationship")
                })?;
                write_picture(&mut xml, shape_id, frame, &image.description, &media_ref.rel_id)?;
            }
        }
    }

    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");

    Ok(xml)
}

/// Relationships of one slide: its layout first, then its pictures.
pub fn slide_relationships(slide: &RenderedSlide, media: &[MediaRef]) -> Vec<Relationship> {
    let mut rels = vec![Relationship::new(
        "rId1",
        rel_type::of("slideLayout"),
        format!(
            "../slideLayouts/slideLayout{}.xml",
            slide.layout.part_number()
        ),
    )];
    for media_ref in media {
        rels.push(Relationship::new(
            media_ref.rel_id.clone(),
            rel_type::of("image"),
            format!("../media/{}", media_ref.file_name),
        ));
    }
    rels
}

fn write_placeholder(
    xml: &mut String,
    shape_id: u32,
    role: Placeholder,
    frame: &Frame,
    paragraphs: &[Paragraph],
) -> PackageResult<()> {
    let (name, ph) = match role {
        Placeholder::CenteredTitle => ("Title", r#"<p:ph type="ctrTitle"/>"#),
        Placeholder::Subtitle => ("Subtitle", r#"<p:ph type="subTitle" idx="1"/>"#),
        Placeholder::Title => ("Title", r#"<p:ph type="title"/>"#),
        Placeholder::Body => ("Content Placeholder", r#"<p:ph idx="1"/>"#),
    };

    xml.push_str("<p:sp><p:nvSpPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{}" name="{} {}"/>"#,
        shape_id,
        name,
        shape_id - 1
    )
    .map_err(fmt_err)?;
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    write!(xml, "<p:nvPr>{}</p:nvPr>", ph).map_err(fmt_err)?;
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame)?;
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    if role == Placeholder::Body {
        xml.push_str(r#"<a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr>"#);
    } else {
        xml.push_str("<a:bodyPr/>");
    }
    xml.push_str("<a:lstStyle/>");
    write_paragraphs(xml, paragraphs)?;
    xml.push_str("</p:txBody>");
    xml.push_str("</p:sp>");

    Ok(())
}

fn write_text_box(
    xml: &mut String,
    shape_id: u32,
    frame: &Frame,
    paragraphs: &[Paragraph],
    word_wrap: bool,
) -> PackageResult<()> {
    xml.push_str("<p:sp><p:nvSpPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{}" name="TextBox {}"/>"#,
        shape_id,
        shape_id - 1
    )
    .map_err(fmt_err)?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/>"#);
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    write!(
        xml,
        r#"<a:bodyPr wrap="{}" rtlCol="0"><a:spAutoFit/></a:bodyPr>"#,
        if word_wrap { "square" } else { "none" }
    )
    .map_err(fmt_err)?;
    xml.push_str("<a:lstStyle/>");
    write_paragraphs(xml, paragraphs)?;
    xml.push_str("</p:txBody>");
    xml.push_str("</p:sp>");

    Ok(())
}

fn write_picture(
    xml: &mut String,
    shape_id: u32,
    frame: &Frame,
    description: &str,
    rel_id: &str,
) -> PackageResult<()> {
    xml.push_str("<p:pic><p:nvPicPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
        shape_id,
        shape_id - 1,
        escape_xml(description)
    )
    .map_err(fmt_err)?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/>"#);
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{}"/>"#, rel_id).map_err(fmt_err)?;
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
    xml.push_str("</p:blipFill>");

    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");

    Ok(())
}

fn write_xfrm(xml: &mut String, frame: &Frame) -> PackageResult<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.width, frame.height
    )
    .map_err(fmt_err)
}

fn write_paragraphs(xml: &mut String, paragraphs: &[Paragraph]) -> PackageResult<()> {
    // A text body needs at least one paragraph.
    if paragraphs.is_empty() {
        xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
        return Ok(());
    }

    for paragraph in paragraphs {
        xml.push_str("<a:p>");

        let align = paragraph.align.map(|align| match align {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        });
        match (paragraph.level, align) {
            (0, None) => {}
            (0, Some(algn)) => write!(xml, r#"<a:pPr algn="{}"/>"#, algn).map_err(fmt_err)?,
            (lvl, None) => write!(xml, r#"<a:pPr lvl="{}"/>"#, lvl).map_err(fmt_err)?,
            (lvl, Some(algn)) => {
                write!(xml, r#"<a:pPr lvl="{}" algn="{}"/>"#, lvl, algn).map_err(fmt_err)?
            }
        }

        let run_props = character_properties("a:rPr", paragraph)?;
        for (i, line) in paragraph.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br/>");
            }
            if line.is_empty() {
                continue;
            }
            write!(xml, "<a:r>{}<a:t>{}</a:t></a:r>", run_props, escape_xml(line))
                .map_err(fmt_err)?;
        }
        xml.push_str(&character_properties("a:endParaRPr", paragraph)?);
        xml.push_str("</a:p>");
    }

    Ok(())
}

/// Character properties element (`a:rPr` or `a:endParaRPr`) for a paragraph's style.
fn character_properties(tag: &str, paragraph: &Paragraph) -> PackageResult<String> {
    let style = &paragraph.style;
    let mut props = String::with_capacity(128);
    write!(props, r#"<{} lang="en-US""#, tag).map_err(fmt_err)?;

    if let Some(size) = style.size {
        write!(props, r#" sz="{}""#, (size * 100.0).round() as u32).map_err(fmt_err)?;
    }
    if style.bold {
        props.push_str(r#" b="1""#);
    }
    if style.italic {
        props.push_str(r#" i="1""#);
    }
    props.push_str(r#" dirty="0""#);

    match style.color {
        Some(color) => {
            write!(
                props,
                r#"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></{}>"#,
                color.hex(),
                tag
            )
            .map_err(fmt_err)?;
        }
        None => props.push_str("/>"),
    }

    Ok(props)
}
