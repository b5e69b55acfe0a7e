//! Styled documents: script header, style table and dialogue events.

use serde::Serialize;
use std::fmt::Write;

use crate::error::Result;
use crate::style::{self, section_header, strip_key, StyleRecord, StyleTable};
use crate::timestamp::Timestamp;

pub const DEFAULT_PLAY_RES_X: u32 = 1920;
pub const DEFAULT_PLAY_RES_Y: u32 = 1080;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Number of comma-separated fields in a `Dialogue:` line. The last one is
/// the text and may itself contain commas.
const DIALOGUE_FIELDS: usize = 10;

/// `[Script Info]` values the core cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptInfo {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub collisions: String,
}

impl Default for ScriptInfo {
    fn default() -> Self {
        Self {
            play_res_x: DEFAULT_PLAY_RES_X,
            play_res_y: DEFAULT_PLAY_RES_Y,
            collisions: "Normal".to_string(),
        }
    }
}

/// One `Dialogue:` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledEvent {
    pub layer: i32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub style_name: String,
    pub raw_text: String,
}

/// The style name and text of a `Dialogue:` line, without timestamp checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueFields<'a> {
    pub layer: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub style_name: &'a str,
    pub text: &'a str,
}

impl<'a> DialogueFields<'a> {
    /// Split a `Dialogue:` line. Returns `None` for any other line, or one
    /// with fewer than ten fields.
    pub fn split(line: &'a str) -> Option<Self> {
        let rest = strip_key(line, "dialogue")?;
        let fields: Vec<&str> = rest.splitn(DIALOGUE_FIELDS, ',').collect();
        if fields.len() < DIALOGUE_FIELDS {
            return None;
        }
        Some(Self {
            layer: fields[0].trim(),
            start: fields[1].trim(),
            end: fields[2].trim(),
            style_name: fields[3].trim(),
            text: fields[9],
        })
    }
}

impl StyledEvent {
    pub fn new(start: Timestamp, end: Timestamp, style_name: &str, raw_text: &str) -> Self {
        Self {
            layer: 0,
            start,
            end,
            style_name: style_name.to_string(),
            raw_text: raw_text.to_string(),
        }
    }

    /// Parse a `Dialogue:` line. `Ok(None)` means the line is not a dialogue
    /// event; malformed timestamps are errors.
    pub fn from_dialogue_line(line: &str) -> Result<Option<Self>> {
        let Some(fields) = DialogueFields::split(line) else {
            return Ok(None);
        };
        Ok(Some(Self {
            layer: fields.layer.parse().unwrap_or(0),
            start: Timestamp::parse_styled(fields.start)?,
            end: Timestamp::parse_styled(fields.end)?,
            style_name: fields.style_name.to_string(),
            raw_text: fields.text.to_string(),
        }))
    }

    pub fn to_dialogue_line(&self) -> String {
        format!(
            "Dialogue: {},{},{},{},,0,0,0,,{}",
            self.layer,
            self.start.to_styled(),
            self.end.to_styled(),
            self.style_name,
            self.raw_text
        )
    }
}

/// Header, styles and ordered events of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyledDocument {
    pub info: ScriptInfo,
    pub styles: StyleTable,
    pub events: Vec<StyledEvent>,
}

impl StyledDocument {
    pub fn new(info: ScriptInfo, styles: StyleTable) -> Self {
        Self {
            info,
            styles,
            events: Vec::new(),
        }
    }

    /// Parse document text. Events with malformed timestamps are skipped.
    pub fn parse(text: &str) -> Self {
        let mut info = ScriptInfo::default();
        let mut events = Vec::new();
        let mut section = String::new();

        for line in text.lines() {
            if let Some(name) = section_header(line) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }
            match section.as_str() {
                "script info" => {
                    if let Some(v) = strip_key(line, "playresx") {
                        info.play_res_x = v.trim().parse().unwrap_or(info.play_res_x);
                    } else if let Some(v) = strip_key(line, "playresy") {
                        info.play_res_y = v.trim().parse().unwrap_or(info.play_res_y);
                    } else if let Some(v) = strip_key(line, "collisions") {
                        info.collisions = v.trim().to_string();
                    }
                }
                "events" => match StyledEvent::from_dialogue_line(line) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Skipping dialogue line: {}", e),
                },
                _ => {}
            }
        }

        Self {
            info,
            styles: style::parse_styles(text),
            events,
        }
    }

    pub fn push(&mut self, event: StyledEvent) {
        self.events.push(event);
    }

    /// Base style of an event, or the fallback style when its name is unknown.
    pub fn style_for(&self, event: &StyledEvent) -> StyleRecord {
        self.styles.resolve(&event.style_name)
    }

    /// Render in the `[Script Info]` / `[V4+ Styles]` / `[Events]` text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Script Info]");
        let _ = writeln!(out, "ScriptType: v4.00+");
        let _ = writeln!(out, "Collisions: {}", self.info.collisions);
        let _ = writeln!(out, "PlayResX: {}", self.info.play_res_x);
        let _ = writeln!(out, "PlayResY: {}", self.info.play_res_y);
        let _ = writeln!(out);
        let _ = writeln!(out, "[V4+ Styles]");
        let _ = writeln!(out, "{}", STYLE_FORMAT);
        for style in self.styles.sorted() {
            let _ = writeln!(out, "{}", style.to_style_line());
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "[Events]");
        let _ = writeln!(out, "{}", EVENT_FORMAT);
        for event in &self.events {
            let _ = writeln!(out, "{}", event.to_dialogue_line());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubtitleError;

    #[test]
    fn test_dialogue_text_keeps_commas() {
        let event = StyledEvent::from_dialogue_line(
            "Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,Well, hello, {\\b1}there",
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.style_name, "Default");
        assert_eq!(event.raw_text, "Well, hello, {\\b1}there");
        assert_eq!(event.start.millis(), 1000);
        assert_eq!(event.end.millis(), 2500);
    }

    #[test]
    fn test_non_dialogue_lines() {
        assert!(StyledEvent::from_dialogue_line("Comment: 0,0:00:01.00")
            .unwrap()
            .is_none());
        assert!(StyledEvent::from_dialogue_line("Dialogue: 0,0:00:01.00,x")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bad_dialogue_timestamp_is_error() {
        let result =
            StyledEvent::from_dialogue_line("Dialogue: 0,1s,0:00:02.00,Default,,0,0,0,,Hi");
        assert!(matches!(result, Err(SubtitleError::MalformedTimestamp(_))));
    }

    #[test]
    fn test_parse_document() {
        let text = "[Script Info]
ScriptType: v4.00+
Collisions: Reverse
PlayResX: 720
PlayResY: 1280

[V4+ Styles]
Style: Default,Arial,28,&HFFFFFF&,&H000000&,&H000000&,&H000000&,-1,0,0,0,100,100,0,0,1,2,0,2,10,10,30,0

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Hello
Dialogue: 0,broken,0:00:04.00,Default,,0,0,0,,Skipped
Dialogue: 1,0:00:05.00,0:00:06.00,Missing,,0,0,0,,World
";
        let doc = StyledDocument::parse(text);
        assert_eq!(doc.info.play_res_x, 720);
        assert_eq!(doc.info.play_res_y, 1280);
        assert_eq!(doc.info.collisions, "Reverse");
        assert_eq!(doc.styles.len(), 1);
        assert_eq!(doc.events.len(), 2);
        assert_eq!(doc.events[1].layer, 1);
        assert_eq!(doc.style_for(&doc.events[1]), StyleRecord::fallback());
    }

    #[test]
    fn test_render_then_parse() {
        let mut styles = StyleTable::new();
        styles.insert(StyleRecord::fallback());
        let mut doc = StyledDocument::new(ScriptInfo::default(), styles);
        doc.push(StyledEvent::new(
            Timestamp::from_millis(1000),
            Timestamp::from_millis(4000),
            "Default",
            "Line one\\NLine two",
        ));

        let rendered = doc.render();
        assert!(rendered.starts_with("[Script Info]\nScriptType: v4.00+\nCollisions: Normal\n"));
        assert!(rendered.contains("Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Line one\\NLine two\n"));
        assert_eq!(StyledDocument::parse(&rendered), doc);
    }
}
