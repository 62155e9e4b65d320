//! Outline model and parsing.
//!
//! The text-generation service is asked for a bare JSON array, but replies
//! frequently arrive wrapped in code fences or surrounded by prose. Parsing
//! therefore scans for balanced `[...]` spans instead of trusting the reply
//! to be clean.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::DeckError;

/// Declared type of a slide in the outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlideType {
    Title,
    #[default]
    Content,
    Image,
    Conclusion,
    /// Anything the service made up. Rendered like `Content`.
    Other(String),
}

impl SlideType {
    pub fn as_str(&self) -> &str {
        match self {
            SlideType::Title => "title",
            SlideType::Content => "content",
            SlideType::Image => "image",
            SlideType::Conclusion => "conclusion",
            SlideType::Other(name) => name,
        }
    }
}

impl From<String> for SlideType {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "title" => SlideType::Title,
            "content" => SlideType::Content,
            "image" => SlideType::Image,
            "conclusion" => SlideType::Conclusion,
            _ => SlideType::Other(normalized),
        }
    }
}

impl From<SlideType> for String {
    fn from(value: SlideType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slide as described by the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    #[serde(default, deserialize_with = "text_or_lines")]
    pub title: String,
    /// Bullet text, one point per line.
    #[serde(default, deserialize_with = "text_or_lines")]
    pub content: String,
    #[serde(default, deserialize_with = "slide_type_or_null")]
    pub slide_type: SlideType,
}

impl SlideSpec {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        slide_type: SlideType,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            slide_type,
        }
    }
}

/// Accepts `"a\nb"`, `["a", "b"]` or `null` for text fields.
fn text_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrLines {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Option::<TextOrLines>::deserialize(deserializer)? {
        Some(TextOrLines::Text(text)) => text,
        Some(TextOrLines::Lines(lines)) => lines.join("\n"),
        None => String::new(),
    })
}

/// `null` counts as a missing type.
fn slide_type_or_null<'de, D>(deserializer: D) -> Result<SlideType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SlideType>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered, non-empty list of slides. The first one is always the title slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Outline {
    slides: Vec<SlideSpec>,
}

impl Outline {
    pub fn new(slides: Vec<SlideSpec>) -> Result<Self, DeckError> {
        if slides.is_empty() {
            return Err(DeckError::OutlineParse("outline contains no slides".to_string()));
        }
        Ok(Self { slides })
    }

    /// The slide rendered as the deck's title slide.
    pub fn title_slide(&self) -> &SlideSpec {
        &self.slides[0]
    }

    /// Every slide after the title slide, in order.
    pub fn body(&self) -> &[SlideSpec] {
        &self.slides[1..]
    }

    pub fn slides(&self) -> &[SlideSpec] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Parse a raw completion into an outline.
///
/// Every balanced `[...]` span is tried in order and the first one that
/// deserializes into a list of slides wins.
pub fn parse_outline(response: &str) -> Result<Outline, DeckError> {
    let mut first_error = None;

    for start in response.match_indices('[').map(|(i, _)| i) {
        let Some(span) = balanced_array_at(response, start) else {
            continue;
        };

        match slides_in_span(span) {
            Ok(slides) => return Outline::new(slides),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or_else(|| {
        DeckError::OutlineParse(format!(
            "no JSON array found in response: {}",
            preview(response)
        ))
    }))
}

/// Slides in one candidate span. The span must be a non-empty JSON array of objects.
fn slides_in_span(span: &str) -> Result<Vec<SlideSpec>, DeckError> {
    let items: Vec<serde_json::Value> = serde_json::from_str(span)
        .map_err(|e| DeckError::OutlineParse(format!("not a JSON array of slides: {}", e)))?;

    if items.is_empty() {
        return Err(DeckError::OutlineParse("outline contains no slides".to_string()));
    }
    if let Some(position) = items.iter().position(|item| !item.is_object()) {
        return Err(DeckError::OutlineParse(format!(
            "slide {} is not a JSON object",
            position + 1
        )));
    }

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| DeckError::OutlineParse(format!("invalid slide: {}", e)))
        })
        .collect()
}

/// First balanced `[...]` span in `text`, ignoring brackets inside JSON strings.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    balanced_array_at(text, start)
}

fn balanced_array_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 80;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"[
        {"title": "Animal Kingdom", "content": "", "slide_type": "title"},
        {"title": "Mammals", "content": "- Warm blooded\n- Fur", "slide_type": "content"},
        {"title": "Summary", "content": "- Diverse", "slide_type": "conclusion"}
    ]"#;

    #[test]
    fn test_fenced_and_bare_parse_identically() {
        let fenced = format!("```json\n{}\n```", BARE);
        let plain_fence = format!("```\n{}\n```", BARE);

        let expected = parse_outline(BARE).unwrap();
        assert_eq!(parse_outline(&fenced).unwrap(), expected);
        assert_eq!(parse_outline(&plain_fence).unwrap(), expected);

        let titles: Vec<&str> = expected.slides().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Animal Kingdom", "Mammals", "Summary"]);
    }

    #[test]
    fn test_object_is_rejected() {
        let err = parse_outline(r#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, DeckError::OutlineParse(_)));
    }

    #[test]
    fn test_array_of_non_objects_is_rejected() {
        let err = parse_outline(r#"{"a":[1, 2]}"#).unwrap_err();
        assert!(matches!(err, DeckError::OutlineParse(_)));
    }

    #[test]
    fn test_prose_and_unbalanced_are_rejected() {
        for input in ["Sorry, I cannot help with that.", "[{\"title\": \"x\"", ""] {
            let err = parse_outline(input).unwrap_err();
            assert!(matches!(err, DeckError::OutlineParse(_)), "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_array_is_rejected() {
        assert!(matches!(
            parse_outline("[]").unwrap_err(),
            DeckError::OutlineParse(_)
        ));
    }

    #[test]
    fn test_skips_bracketed_prose_before_json() {
        let response = format!("Here is the outline [as requested]:\n{}", BARE);
        let outline = parse_outline(&response).unwrap();
        assert_eq!(outline.len(), 3);
    }

    #[test]
    fn test_array_of_arrays_is_rejected() {
        let err = parse_outline(r#"[["Intro", "a", "title"], []]"#).unwrap_err();
        assert!(matches!(err, DeckError::OutlineParse(_)));

        let err = parse_outline(r#"[{"title": "ok"}, "stray"]"#).unwrap_err();
        assert!(matches!(err, DeckError::OutlineParse(ref m) if m.contains("slide 2")));
    }

    #[test]
    fn test_empty_brackets_before_outline_are_skipped() {
        let response = "Slides (previous draft was []):\n[{\"title\": \"A\", \"content\": \"\", \"slide_type\": \"title\"}]";
        let outline = parse_outline(response).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline.title_slide().title, "A");
    }

    #[test]
    fn test_null_slide_type_defaults_to_content() {
        let outline =
            parse_outline(r#"[{"title": "a", "content": null, "slide_type": null}]"#).unwrap();
        assert_eq!(outline.title_slide().slide_type, SlideType::Content);
        assert_eq!(outline.title_slide().content, "");
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = r#"x ["a]", "b\"]"] y"#;
        assert_eq!(extract_json_array(text), Some(r#"["a]", "b\"]"]"#));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let outline = parse_outline(r#"[{"title": "Only title"}, {}]"#).unwrap();
        assert_eq!(outline.title_slide().content, "");
        assert_eq!(outline.body()[0].title, "");
        assert_eq!(outline.body()[0].slide_type, SlideType::Content);
    }

    #[test]
    fn test_slide_type_normalization() {
        let outline = parse_outline(
            r#"[{"title": "a", "slide_type": "IMAGE"}, {"title": "b", "slide_type": "Summary"}]"#,
        )
        .unwrap();
        assert_eq!(outline.slides()[0].slide_type, SlideType::Image);
        assert_eq!(
            outline.slides()[1].slide_type,
            SlideType::Other("summary".to_string())
        );
    }

    #[test]
    fn test_content_as_list() {
        let outline =
            parse_outline(r#"[{"title": "t", "content": ["- one", "- two"]}]"#).unwrap();
        assert_eq!(outline.title_slide().content, "- one\n- two");
    }

    #[test]
    fn test_outline_serializes_as_array() {
        let outline = parse_outline(BARE).unwrap();
        let json = serde_json::to_string(&outline).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(parse_outline(&json).unwrap(), outline);
    }
}
