//! Named styles and the `[V4+ Styles]` section parser.
//!
//! The parser runs on every edit of an interactive document, so it never
//! fails: any field it cannot read falls back to a default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::color::{self, Rgb};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: u32 = 24;
pub const DEFAULT_OUTLINE_WIDTH: u32 = 1;
pub const DEFAULT_SHADOW_OFFSET: u32 = 0;

/// Largest outline width or shadow offset a style may carry. Larger values
/// fall back to the default.
pub const MAX_BORDER_SIZE: u32 = 64;

/// Minimum number of comma-separated fields for a `Style:` line to be used.
pub const MIN_STYLE_FIELDS: usize = 10;

const FIELD_NAME: usize = 0;
const FIELD_FONT: usize = 1;
const FIELD_SIZE: usize = 2;
const FIELD_PRIMARY: usize = 3;
const FIELD_OUTLINE_COLOR: usize = 5;
const FIELD_BOLD: usize = 7;
const FIELD_ITALIC: usize = 8;
const FIELD_OUTLINE: usize = 16;
const FIELD_SHADOW: usize = 17;
const FIELD_ALIGNMENT: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Bottom,
    Middle,
    Top,
}

/// Numpad-style alignment: 1-3 bottom row, 4-6 middle row, 7-9 top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alignment(u8);

impl Alignment {
    pub const BOTTOM_CENTER: Alignment = Alignment(2);

    /// Codes outside 1..=9 become bottom-center.
    pub fn from_code(code: i64) -> Self {
        match code {
            1..=9 => Alignment(code as u8),
            _ => Self::BOTTOM_CENTER,
        }
    }

    /// Lenient parse of a text field.
    pub fn parse(field: &str) -> Self {
        field
            .trim()
            .parse::<i64>()
            .map(Self::from_code)
            .unwrap_or(Self::BOTTOM_CENTER)
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn horizontal(&self) -> HorizontalAlign {
        match self.0 % 3 {
            1 => HorizontalAlign::Left,
            0 => HorizontalAlign::Right,
            _ => HorizontalAlign::Center,
        }
    }

    pub fn vertical(&self) -> VerticalAlign {
        match self.0 {
            1..=3 => VerticalAlign::Bottom,
            4..=6 => VerticalAlign::Middle,
            _ => VerticalAlign::Top,
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::BOTTOM_CENTER
    }
}

/// A named visual style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub name: String,
    pub font_family: String,
    pub font_size: u32,
    pub primary_color: Rgb,
    pub outline_color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub outline_width: u32,
    pub shadow_offset: u32,
}

impl StyleRecord {
    /// Style used for events that reference a name missing from the table.
    pub fn fallback() -> Self {
        Self {
            name: "Default".to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            primary_color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            bold: false,
            italic: false,
            alignment: Alignment::BOTTOM_CENTER,
            outline_width: 2,
            shadow_offset: 1,
        }
    }

    /// Parse the fields after the `Style:` prefix.
    ///
    /// Returns `None` when the line has fewer than [`MIN_STYLE_FIELDS`] fields.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < MIN_STYLE_FIELDS {
            return None;
        }
        let field = |i: usize| fields.get(i).map(|f| f.trim());

        let font_size = field(FIELD_SIZE)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|size| size.is_finite() && *size >= 1.0)
            .map(|size| size as u32)
            .unwrap_or(DEFAULT_FONT_SIZE);

        let border = |i: usize, default: u32| {
            match field(i).and_then(|s| s.parse::<u32>().ok()) {
                Some(v) if v <= MAX_BORDER_SIZE => v,
                Some(v) => {
                    tracing::debug!("Border size {} too large, using {}", v, default);
                    default
                }
                None => default,
            }
        };

        Some(Self {
            name: field(FIELD_NAME).unwrap_or_default().to_string(),
            font_family: field(FIELD_FONT).unwrap_or_default().to_string(),
            font_size,
            primary_color: color::decode(field(FIELD_PRIMARY).unwrap_or_default()),
            outline_color: color::decode(field(FIELD_OUTLINE_COLOR).unwrap_or_default()),
            bold: field(FIELD_BOLD) == Some("-1"),
            italic: field(FIELD_ITALIC) == Some("-1"),
            alignment: field(FIELD_ALIGNMENT)
                .map(Alignment::parse)
                .unwrap_or_default(),
            outline_width: border(FIELD_OUTLINE, DEFAULT_OUTLINE_WIDTH),
            shadow_offset: border(FIELD_SHADOW, DEFAULT_SHADOW_OFFSET),
        })
    }

    /// Render as a full 23-field `Style:` line.
    pub fn to_style_line(&self) -> String {
        let flag = |on: bool| if on { "-1" } else { "0" };
        format!(
            "Style: {},{},{},{},&H000000&,{},&H000000&,{},{},0,0,100,100,0,0,1,{},{},{},10,10,30,0",
            self.name,
            self.font_family,
            self.font_size,
            color::encode(self.primary_color),
            color::encode(self.outline_color),
            flag(self.bold),
            flag(self.italic),
            self.outline_width,
            self.shadow_offset,
            self.alignment.code(),
        )
    }
}

/// Styles of one document, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleTable {
    styles: HashMap<String, StyleRecord>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later definitions of the same name replace earlier ones.
    pub fn insert(&mut self, style: StyleRecord) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn get(&self, name: &str) -> Option<&StyleRecord> {
        self.styles.get(name)
    }

    /// Look up a style, falling back to [`StyleRecord::fallback`].
    pub fn resolve(&self, name: &str) -> StyleRecord {
        match self.styles.get(name) {
            Some(style) => style.clone(),
            None => {
                tracing::debug!("Unknown style {:?}, using fallback", name);
                StyleRecord::fallback()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Styles sorted by name, for stable output.
    pub fn sorted(&self) -> Vec<&StyleRecord> {
        let mut styles: Vec<&StyleRecord> = self.styles.values().collect();
        styles.sort_by(|a, b| a.name.cmp(&b.name));
        styles
    }
}

/// True for any `[Section]` header line.
pub(crate) fn section_header(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')?.strip_suffix(']')
}

/// Strip a case-insensitive `key:` prefix.
pub(crate) fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim_start();
    let (head, rest) = line.split_at_checked(key.len())?;
    if head.eq_ignore_ascii_case(key) {
        rest.strip_prefix(':')
    } else {
        None
    }
}

/// Build the style table from a whole document's text.
pub fn parse_styles(text: &str) -> StyleTable {
    let mut table = StyleTable::new();
    let mut in_styles = false;

    for line in text.lines() {
        if let Some(section) = section_header(line) {
            in_styles = section.trim().eq_ignore_ascii_case("v4+ styles");
            continue;
        }
        if !in_styles {
            continue;
        }
        if let Some(rest) = strip_key(line, "style") {
            let fields: Vec<&str> = rest.split(',').collect();
            match StyleRecord::from_fields(&fields) {
                Some(style) => table.insert(style),
                None => tracing::debug!(
                    "Skipping style line with {} fields: {:?}",
                    fields.len(),
                    line
                ),
            }
        }
    }

    table
}
