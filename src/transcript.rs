//! Time-aligned transcription output and its plain-timed rendering.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Segment {
    /// Build a segment from consecutive words. Word text already carries its
    /// leading space, so it is concatenated and trimmed.
    fn from_words(words: Vec<Word>) -> Option<Self> {
        let first = words.first()?;
        let last = words.last()?;
        Some(Self {
            start: first.start,
            end: last.end,
            text: words.iter().map(|w| w.word.as_str()).collect::<String>().trim().to_string(),
            words,
        })
    }
}

/// Regroup words into segments closed by `should_close(current_words)`.
/// Segments without word timings pass through unchanged.
fn regroup<F>(segments: Vec<Segment>, should_close: F) -> Vec<Segment>
where
    F: Fn(&[Word]) -> bool,
{
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        if segment.words.is_empty() {
            out.push(segment);
            continue;
        }

        let mut current: Vec<Word> = Vec::new();
        for word in segment.words {
            current.push(word);
            if should_close(&current) {
                out.extend(Segment::from_words(std::mem::take(&mut current)));
            }
        }
        out.extend(Segment::from_words(current));
    }

    out
}

/// Close a segment once it spans at least `max_secs`.
pub fn split_by_duration(segments: Vec<Segment>, max_secs: f64) -> Vec<Segment> {
    regroup(segments, |words| match (words.first(), words.last()) {
        (Some(first), Some(last)) => last.end - first.start >= max_secs,
        _ => false,
    })
}

/// Close a segment once it holds `max_words` words.
pub fn split_by_word_count(segments: Vec<Segment>, max_words: usize) -> Vec<Segment> {
    regroup(segments, |words| words.len() >= max_words)
}

/// Break caption text into lines of at most `max_words` words.
pub fn wrap_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if max_words == 0 {
        return words.join(" ");
    }
    words
        .chunks(max_words)
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render segments as a plain-timed document with 1-based indices.
pub fn to_plain_timed(segments: &[Segment], max_words_per_line: Option<usize>) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let text = segment.text.trim();
        let text = match max_words_per_line {
            Some(max) => wrap_words(text, max),
            None => text.to_string(),
        };
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            Timestamp::from_seconds(segment.start).to_plain(),
            Timestamp::from_seconds(segment.end).to_plain(),
            text
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(start: f64, end: f64, text: &str) -> Word {
        Word {
            start,
            end,
            word: text.to_string(),
        }
    }

    fn segment() -> Segment {
        Segment {
            start: 0.0,
            end: 5.0,
            text: " one two three four five".to_string(),
            words: vec![
                word(0.0, 1.0, " one"),
                word(1.0, 2.0, " two"),
                word(2.0, 3.0, " three"),
                word(3.0, 4.0, " four"),
                word(4.0, 5.0, " five"),
            ],
        }
    }

    #[test]
    fn test_split_by_word_count() {
        let out = split_by_word_count(vec![segment()], 2);
        let texts: Vec<&str> = out.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);
        assert_eq!((out[1].start, out[1].end), (2.0, 4.0));
    }

    #[test]
    fn test_split_by_duration() {
        let out = split_by_duration(vec![segment()], 2.5);
        let texts: Vec<&str> = out.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one two three", "four five"]);
        assert_eq!(out[1].start, 3.0);
    }

    #[test]
    fn test_segments_without_words_kept() {
        let bare = Segment {
            start: 1.0,
            end: 2.0,
            text: "as is".to_string(),
            words: Vec::new(),
        };
        assert_eq!(split_by_word_count(vec![bare.clone()], 1), vec![bare]);
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("a b c d e", 2), "a b\nc d\ne");
        assert_eq!(wrap_words("a  b", 0), "a b");
    }

    #[test]
    fn test_to_plain_timed() {
        let segments = split_by_word_count(vec![segment()], 3);
        let text = to_plain_timed(&segments, Some(2));
        assert_eq!(
            text,
            "1\n00:00:00,000 --> 00:00:03,000\none two\nthree\n\n2\n00:00:03,000 --> 00:00:05,000\nfour five\n\n"
        );
    }

    #[test]
    fn test_deserialize_segment_without_words() {
        let segment: Segment =
            serde_json::from_str(r#"{"start": 0.5, "end": 1.25, "text": "hi"}"#).unwrap();
        assert!(segment.words.is_empty());
    }
}
