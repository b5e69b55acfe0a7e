//! Plain-timed captions to a styled document with a single `Default` style.

use serde::{Deserialize, Serialize};

use crate::color;
use crate::document::{ScriptInfo, StyledDocument, StyledEvent};
use crate::error::Result;
use crate::color::Rgb;
use crate::style::{Alignment, StyleRecord, StyleTable, MAX_BORDER_SIZE};
use crate::timestamp::Timestamp;

/// Explicit line break inside styled event text.
pub const LINE_BREAK: &str = "\\N";

pub const DEFAULT_STYLE_NAME: &str = "Default";

/// One caption of a plain-timed document. Multi-line text is joined with
/// [`LINE_BREAK`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    pub index: u32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

/// Parameters of the generated `Default` style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleParams {
    pub font: String,
    pub font_size: u32,
    /// `&HBBGGRR&` token
    pub primary_color: String,
    /// `&HBBGGRR&` token
    pub outline_color: String,
    pub outline: u32,
    pub shadow: u32,
    pub alignment: u8,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_size: 28,
            primary_color: "&HFFFFFF&".to_string(),
            outline_color: "&H000000&".to_string(),
            outline: 2,
            shadow: 0,
            alignment: 2,
        }
    }
}

/// Decode a caller-supplied color, warning when part of the token is lost.
fn param_color(name: &str, token: &str) -> Rgb {
    let rgb = color::decode(token);
    if !color::decodes_exactly(token) {
        tracing::warn!(
            "{} {:?} is not an &HBBGGRR& color, writing {}",
            name,
            token,
            color::encode(rgb)
        );
    }
    rgb
}

impl StyleParams {
    /// Outline and shadow are capped at [`MAX_BORDER_SIZE`].
    pub fn to_style_record(&self) -> StyleRecord {
        StyleRecord {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_family: self.font.clone(),
            font_size: self.font_size.max(1),
            primary_color: param_color("primary_color", &self.primary_color),
            outline_color: param_color("outline_color", &self.outline_color),
            bold: true,
            italic: false,
            alignment: Alignment::from_code(self.alignment as i64),
            outline_width: self.outline.min(MAX_BORDER_SIZE),
            shadow_offset: self.shadow.min(MAX_BORDER_SIZE),
        }
    }
}

fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}

/// Parse `start --> end`. `None` when the line has no arrow; an error when it
/// does but either side is malformed.
fn parse_time_range(line: &str) -> Option<Result<(Timestamp, Timestamp)>> {
    let (start, end) = line.split_once("-->")?;
    // Anything after the end stamp (position hints) is ignored.
    let end = end.split_whitespace().next().unwrap_or_default();
    Some(Timestamp::parse_plain(start).and_then(|s| Ok((s, Timestamp::parse_plain(end)?))))
}

/// Scan plain-timed text for caption blocks.
///
/// A block starts at a purely numeric line followed by a time-range line;
/// everything else outside a block is skipped. A malformed time range aborts
/// the parse.
pub fn parse_plain_timed(text: &str) -> Result<Vec<CaptionBlock>> {
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let range = lines.get(i + 1).and_then(|next| parse_time_range(next));
        let (true, Some(range)) = (is_index_line(line), range) else {
            i += 1;
            continue;
        };
        let (start, end) = range?;

        let mut j = i + 2;
        let mut text_lines = Vec::new();
        while j < lines.len() && !lines[j].is_empty() {
            text_lines.push(lines[j]);
            j += 1;
        }

        blocks.push(CaptionBlock {
            index: line.parse().unwrap_or(0),
            start,
            end,
            text: text_lines.join(LINE_BREAK),
        });
        i = j;
    }

    Ok(blocks)
}

/// Convert plain-timed text into a styled document.
pub fn plain_to_document(text: &str, params: &StyleParams) -> Result<StyledDocument> {
    let mut styles = StyleTable::new();
    styles.insert(params.to_style_record());
    let mut doc = StyledDocument::new(ScriptInfo::default(), styles);

    let blocks = parse_plain_timed(text)?;
    tracing::debug!("Converting {} caption blocks", blocks.len());
    for block in blocks {
        doc.push(StyledEvent::new(
            block.start,
            block.end,
            DEFAULT_STYLE_NAME,
            &block.text,
        ));
    }

    Ok(doc)
}

/// Convert plain-timed text straight to styled document text.
pub fn convert_to_styled(text: &str, params: &StyleParams) -> Result<String> {
    Ok(plain_to_document(text, params)?.render())
}
