//! Inline `{\tag...}` override resolution.
//!
//! An event's text is split into runs at each override block. Every run gets
//! its own copy of the style in effect at that point, starting from the
//! event's base style.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::color::{self, Rgb};
use crate::style::StyleRecord;

static OVERRIDE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\\[^}]*\}").expect("valid regex"));

/// Recognized override tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideTag {
    Bold(bool),
    Italic(bool),
    FontName(String),
    FontSize(u32),
    PrimaryColor(Rgb),
    OutlineColor(Rgb),
    /// `\r`: back to the base style.
    Reset,
    Unknown(String),
}

fn flag(value: &str) -> Option<bool> {
    match value {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

fn color_value(value: &str) -> Option<Rgb> {
    value.starts_with('&').then(|| color::decode(value))
}

impl OverrideTag {
    /// Parse one tag without its leading backslash, e.g. `b1` or `3c&HFF0000&`.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        let parsed = if tag == "r" {
            Some(Self::Reset)
        } else if let Some(v) = tag.strip_prefix("fn") {
            (!v.trim().is_empty()).then(|| Self::FontName(v.trim().to_string()))
        } else if let Some(v) = tag.strip_prefix("fs") {
            v.parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .map(Self::FontSize)
        } else if let Some(v) = tag.strip_prefix("3c") {
            color_value(v).map(Self::OutlineColor)
        } else if let Some(v) = tag.strip_prefix("1c").or_else(|| tag.strip_prefix('c')) {
            color_value(v).map(Self::PrimaryColor)
        } else if let Some(v) = tag.strip_prefix('b') {
            flag(v).map(Self::Bold)
        } else if let Some(v) = tag.strip_prefix('i') {
            flag(v).map(Self::Italic)
        } else {
            None
        };
        parsed.unwrap_or_else(|| Self::Unknown(tag.to_string()))
    }

    fn apply(&self, style: &mut StyleRecord, base: &StyleRecord) {
        match self {
            Self::Bold(on) => style.bold = *on,
            Self::Italic(on) => style.italic = *on,
            Self::FontName(name) => style.font_family = name.clone(),
            Self::FontSize(size) => style.font_size = *size,
            Self::PrimaryColor(rgb) => style.primary_color = *rgb,
            Self::OutlineColor(rgb) => style.outline_color = *rgb,
            Self::Reset => *style = base.clone(),
            Self::Unknown(tag) => tracing::trace!("Ignoring override tag \\{}", tag),
        }
    }
}

/// Tags of one `{...}` block, in order.
pub fn parse_block(block: &str) -> Vec<OverrideTag> {
    let inner = block.trim_start_matches('{').trim_end_matches('}');
    inner
        .split('\\')
        .skip(1)
        .filter(|tag| !tag.is_empty())
        .map(OverrideTag::parse)
        .collect()
}

/// A span of literal text and the style it is drawn with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRun {
    pub text: String,
    pub style: StyleRecord,
}

/// Split `text` into styled runs, applying override blocks left to right.
pub fn resolve_runs(text: &str, base: &StyleRecord) -> Vec<ResolvedRun> {
    let mut runs = Vec::new();
    let mut current = base.clone();
    let mut cursor = 0;

    let mut push_text = |span: &str, style: &StyleRecord| {
        if !span.is_empty() {
            runs.push(ResolvedRun {
                text: span.to_string(),
                style: style.clone(),
            });
        }
    };

    for block in OVERRIDE_BLOCK.find_iter(text) {
        push_text(&text[cursor..block.start()], &current);
        for tag in parse_block(block.as_str()) {
            tag.apply(&mut current, base);
        }
        cursor = block.end();
    }
    push_text(&text[cursor..], &current);

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Alignment;

    fn base() -> StyleRecord {
        StyleRecord {
            name: "Base".to_string(),
            font_family: "Arial".to_string(),
            font_size: 24,
            primary_color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            bold: false,
            italic: false,
            alignment: Alignment::BOTTOM_CENTER,
            outline_width: 1,
            shadow_offset: 0,
        }
    }

    #[test]
    fn test_overrides_accumulate() {
        let runs = resolve_runs("a{\\b1}b{\\c&H0000FF&}c", &base());
        assert_eq!(runs.len(), 3);

        assert_eq!(runs[0].text, "a");
        assert!(!runs[0].style.bold);
        assert_eq!(runs[0].style.primary_color, Rgb::WHITE);

        assert_eq!(runs[1].text, "b");
        assert!(runs[1].style.bold);
        assert_eq!(runs[1].style.primary_color, Rgb::WHITE);

        assert_eq!(runs[2].text, "c");
        assert!(runs[2].style.bold);
        assert_eq!(runs[2].style.primary_color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_multiple_tags_in_block() {
        let runs = resolve_runs("{\\i1\\fnVerdana\\fs40\\3c&HFF0000&}Hi", &base());
        assert_eq!(runs.len(), 1);
        let style = &runs[0].style;
        assert!(style.italic);
        assert_eq!(style.font_family, "Verdana");
        assert_eq!(style.font_size, 40);
        assert_eq!(style.outline_color, Rgb::new(0, 0, 255));
        assert_eq!(style.primary_color, Rgb::WHITE);
    }

    #[test]
    fn test_unknown_tags_ignored() {
        let runs = resolve_runs("{\\bord3\\fscx110\\blur2\\fsx}x", &base());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].style, base());
    }

    #[test]
    fn test_reset_returns_to_base() {
        let runs = resolve_runs("{\\b1\\c&H00FF00&}on{\\r}off", &base());
        assert!(runs[0].style.bold);
        assert_eq!(runs[1].style, base());
    }

    #[test]
    fn test_plain_braces_are_text() {
        let runs = resolve_runs("{note} and {\\b1 unclosed", &base());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "{note} and {\\b1 unclosed");
    }

    #[test]
    fn test_empty_spans_dropped() {
        let runs = resolve_runs("{\\b1}{\\i1}x{\\b0}", &base());
        assert_eq!(runs.len(), 1);
        assert!(runs[0].style.bold && runs[0].style.italic);
        assert!(resolve_runs("", &base()).is_empty());
    }

    #[test]
    fn test_parse_tag_variants() {
        assert_eq!(OverrideTag::parse("b0"), OverrideTag::Bold(false));
        assert_eq!(OverrideTag::parse("i1"), OverrideTag::Italic(true));
        assert_eq!(OverrideTag::parse("fs0"), OverrideTag::Unknown("fs0".to_string()));
        assert_eq!(
            OverrideTag::parse("1c&HFFFFFF&"),
            OverrideTag::PrimaryColor(Rgb::WHITE)
        );
        assert_eq!(OverrideTag::parse("b700"), OverrideTag::Unknown("b700".to_string()));
    }
}
