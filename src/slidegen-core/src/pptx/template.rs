//! Fixed package parts and the small generated ones around them.
//!
//! The master, layouts and theme are a trimmed-down version of the stock
//! 4:3 Office template: just enough for the three layouts the renderers use.

use std::fmt::Write as FmtWrite;

use super::{PackageResult, escape_xml, fmt_err};
use crate::layout::{ImageKind, SLIDE_HEIGHT, SLIDE_WIDTH, SlideLayout};

pub const SLIDE_MASTER: &str = include_str!("../../resources/slideMasters/slideMaster1.xml");
pub const THEME: &str = include_str!("../../resources/theme/theme1.xml");
pub const PRES_PROPS: &str = include_str!("../../resources/presProps.xml");
pub const VIEW_PROPS: &str = include_str!("../../resources/viewProps.xml");
pub const TABLE_STYLES: &str = include_str!("../../resources/tableStyles.xml");

pub fn slide_layout_xml(layout: SlideLayout) -> &'static str {
    match layout {
        SlideLayout::TitleSlide => {
            include_str!("../../resources/slideLayouts/slideLayout1.xml")
        }
        SlideLayout::TitleAndContent => {
            include_str!("../../resources/slideLayouts/slideLayout2.xml")
        }
        SlideLayout::TitleOnly => include_str!("../../resources/slideLayouts/slideLayout3.xml"),
    }
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub mod rel_type {
    const BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    pub fn of(kind: &str) -> String {
        format!("{}/{}", BASE, kind)
    }

    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

pub mod content_type {
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// A relationship entry in a `.rels` part.
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
        }
    }
}

pub fn relationships_xml(rels: &[Relationship]) -> PackageResult<String> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel.rel_type,
            escape_xml(&rel.target)
        )
        .map_err(fmt_err)?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Relationships of `ppt/presentation.xml`. Slides come after the fixed parts.
pub fn presentation_relationships(slide_count: usize) -> Vec<Relationship> {
    let mut rels = vec![
        Relationship::new("rId1", rel_type::of("slideMaster"), "slideMasters/slideMaster1.xml"),
        Relationship::new("rId2", rel_type::of("presProps"), "presProps.xml"),
        Relationship::new("rId3", rel_type::of("viewProps"), "viewProps.xml"),
        Relationship::new("rId4", rel_type::of("theme"), "theme/theme1.xml"),
        Relationship::new("rId5", rel_type::of("tableStyles"), "tableStyles.xml"),
    ];
    for number in 1..=slide_count {
        rels.push(Relationship::new(
            slide_rel_id(number),
            rel_type::of("slide"),
            format!("slides/slide{}.xml", number),
        ));
    }
    rels
}

/// Relationship id of slide `number` (1-based) in the presentation part.
pub fn slide_rel_id(number: usize) -> String {
    format!("rId{}", number + 5)
}

pub fn presentation_xml(slide_count: usize) -> PackageResult<String> {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1">"#);
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

    xml.push_str("<p:sldIdLst>");
    for number in 1..=slide_count {
        write!(
            xml,
            r#"<p:sldId id="{}" r:id="{}"/>"#,
            255 + number,
            slide_rel_id(number)
        )
        .map_err(fmt_err)?;
    }
    xml.push_str("</p:sldIdLst>");

    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/>"#,
        SLIDE_WIDTH, SLIDE_HEIGHT
    )
    .map_err(fmt_err)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

pub fn master_relationships() -> Vec<Relationship> {
    let mut rels: Vec<Relationship> = SlideLayout::ALL
        .iter()
        .map(|layout| {
            Relationship::new(
                format!("rId{}", layout.part_number()),
                rel_type::of("slideLayout"),
                format!("../slideLayouts/slideLayout{}.xml", layout.part_number()),
            )
        })
        .collect();
    rels.push(Relationship::new(
        format!("rId{}", rels.len() + 1),
        rel_type::of("theme"),
        "../theme/theme1.xml",
    ));
    rels
}

pub fn layout_relationships() -> Vec<Relationship> {
    vec![Relationship::new(
        "rId1",
        rel_type::of("slideMaster"),
        "../slideMasters/slideMaster1.xml",
    )]
}

pub fn root_relationships() -> Vec<Relationship> {
    vec![
        Relationship::new("rId1", rel_type::of("officeDocument"), "ppt/presentation.xml"),
        Relationship::new("rId2", rel_type::CORE_PROPERTIES, "docProps/core.xml"),
        Relationship::new("rId3", rel_type::of("extended-properties"), "docProps/app.xml"),
    ]
}

pub fn content_types_xml(slide_count: usize, image_kinds: &[ImageKind]) -> PackageResult<String> {
    let mut xml = String::with_capacity(2048 + slide_count * 160);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut seen: Vec<ImageKind> = Vec::new();
    for kind in image_kinds {
        if seen.contains(kind) {
            continue;
        }
        seen.push(*kind);
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            kind.extension(),
            kind.content_type()
        )
        .map_err(fmt_err)?;
    }

    let mut overrides: Vec<(String, &str)> = vec![
        ("/ppt/presentation.xml".to_string(), content_type::PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), content_type::SLIDE_MASTER),
        ("/ppt/theme/theme1.xml".to_string(), content_type::THEME),
        ("/ppt/presProps.xml".to_string(), content_type::PRES_PROPS),
        ("/ppt/viewProps.xml".to_string(), content_type::VIEW_PROPS),
        ("/ppt/tableStyles.xml".to_string(), content_type::TABLE_STYLES),
        ("/docProps/core.xml".to_string(), content_type::CORE),
        ("/docProps/app.xml".to_string(), content_type::APP),
    ];
    for layout in SlideLayout::ALL {
        overrides.push((
            format!("/ppt/slideLayouts/slideLayout{}.xml", layout.part_number()),
            content_type::SLIDE_LAYOUT,
        ));
    }
    for number in 1..=slide_count {
        overrides.push((format!("/ppt/slides/slide{}.xml", number), content_type::SLIDE));
    }

    for (part, ct) in overrides {
        write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct)
            .map_err(fmt_err)?;
    }

    xml.push_str("</Types>");
    Ok(xml)
}

pub fn core_properties_xml(title: &str) -> PackageResult<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    write!(xml, "<dc:title>{}</dc:title>", escape_xml(title)).map_err(fmt_err)?;
    xml.push_str("<dc:creator>slidegen</dc:creator>");
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

pub fn app_properties_xml(slide_count: usize) -> PackageResult<String> {
    let mut xml = String::with_capacity(384);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    xml.push_str("<Application>slidegen</Application>");
    write!(xml, "<Slides>{}</Slides>", slide_count).map_err(fmt_err)?;
    xml.push_str("</Properties>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_lists_every_slide() {
        let xml = presentation_xml(3).unwrap();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId6"/>"#));
        assert!(xml.contains(r#"<p:sldId id="258" r:id="rId8"/>"#));
        assert!(xml.contains(r#"cx="9144000" cy="6858000""#));

        let rels = presentation_relationships(3);
        assert_eq!(rels.len(), 8);
        assert_eq!(rels[7].target, "slides/slide3.xml");
        assert_eq!(rels[7].id, slide_rel_id(3));
    }

    #[test]
    fn test_content_types_deduplicate_images() {
        let xml =
            content_types_xml(2, &[ImageKind::Jpeg, ImageKind::Png, ImageKind::Jpeg]).unwrap();
        assert_eq!(xml.matches(r#"Extension="jpeg""#).count(), 1);
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains("/ppt/slides/slide2.xml"));
        assert!(!xml.contains("/ppt/slides/slide3.xml"));
        assert!(xml.contains("/ppt/slideLayouts/slideLayout3.xml"));
    }

    #[test]
    fn test_master_points_at_layouts_and_theme() {
        let rels = master_relationships();
        assert_eq!(rels.len(), 4);
        assert_eq!(rels[3].id, "rId4");
        assert_eq!(rels[3].target, "../theme/theme1.xml");
        for layout in SlideLayout::ALL {
            let id = format!(r#"r:id="rId{}""#, layout.part_number());
            assert!(SLIDE_MASTER.contains(&id));
        }
    }

    #[test]
    fn test_core_properties_escape_title() {
        let xml = core_properties_xml("Cats & Dogs").unwrap();
        assert!(xml.contains("<dc:title>Cats &amp; Dogs</dc:title>"));
    }

    #[test]
    fn test_resources_are_xml() {
        for part in [SLIDE_MASTER, THEME, PRES_PROPS, VIEW_PROPS, TABLE_STYLES] {
            assert!(part.starts_with("<?xml"));
        }
        for layout in SlideLayout::ALL {
            assert!(slide_layout_xml(layout).starts_with("<?xml"));
        }
    }
}
