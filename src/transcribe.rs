//! Speech-to-text through an external whisper.cpp binary.
//!
//! The engine itself is not part of this crate: this module finds the
//! binary and model, feeds it audio extracted with FFmpeg, and turns its JSON
//! output into [`Segment`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use tokio::process::Command;

use crate::error::{Result, SubtitleError};
use crate::process::run;
use crate::timestamp::Timestamp;
use crate::transcript::{self, Segment, Word};

/// Available Whisper model sizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    pub fn ggml_filename(&self) -> String {
        format!("ggml-{}.bin", self)
    }

    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
            self.ggml_filename()
        )
    }
}

/// Transcription settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeConfig {
    pub model: WhisperModel,
    pub language: String,
    /// Wrap caption text after this many words per line.
    pub max_words_per_line: Option<usize>,
    /// Split segments once they span this many seconds.
    pub max_segment_duration: Option<f64>,
    /// Split segments once they hold this many words.
    pub max_words_per_segment: Option<usize>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            model: WhisperModel::Base,
            language: "auto".to_string(),
            max_words_per_line: None,
            max_segment_duration: None,
            max_words_per_segment: None,
        }
    }
}

impl TranscribeConfig {
    fn wants_word_timings(&self) -> bool {
        self.max_segment_duration.is_some() || self.max_words_per_segment.is_some()
    }

    /// Apply the duration split, then the word-count split.
    pub fn shape(&self, mut segments: Vec<Segment>) -> Vec<Segment> {
        if let Some(max_secs) = self.max_segment_duration {
            segments = transcript::split_by_duration(segments, max_secs);
        }
        if let Some(max_words) = self.max_words_per_segment {
            segments = transcript::split_by_word_count(segments, max_words);
        }
        segments
    }
}

const BINARY_NAMES: [&str; 4] = ["whisper-cli", "whisper", "whisper-cpp", "main"];

/// Locate a whisper.cpp binary in PATH or the working directory.
pub fn find_whisper_binary() -> Option<PathBuf> {
    BINARY_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
        .or_else(|| {
            BINARY_NAMES
                .iter()
                .flat_map(|name| [format!("{}.exe", name), name.to_string()])
                .map(|name| Path::new(".").join(name))
                .find(|path| path.is_file())
        })
}

/// `~/.cache/whisper.cpp`, or `./models` without a home directory.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .map(|cache| cache.join("whisper.cpp"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

pub fn model_path(model: WhisperModel) -> PathBuf {
    models_dir().join(model.ggml_filename())
}

/// Download the model with curl unless it is already cached.
pub async fn ensure_model(model: WhisperModel) -> Result<PathBuf> {
    let path = model_path(model);
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let url = model.download_url();
    tracing::info!("Downloading {} model to {}", model, path.display());
    which::which("curl").map_err(|_| SubtitleError::ToolNotFound("curl".to_string()))?;
    run(
        "curl",
        Command::new("curl").args(["-L", "--fail", "-o"]).arg(&path).arg(&url),
    )
    .await?;
    Ok(path)
}

/// Extract 16 kHz mono PCM audio, the input format whisper.cpp expects.
pub async fn extract_audio(video: &Path, audio: &Path) -> Result<()> {
    tracing::debug!("Extracting audio from {}", video.display());
    run(
        "ffmpeg",
        Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(audio),
    )
    .await?;
    Ok(())
}

fn offsets_ms(value: &Value) -> Option<(f64, f64)> {
    let offsets = value.get("offsets")?;
    let from = offsets.get("from")?.as_f64()?;
    let to = offsets.get("to")?.as_f64()?;
    Some((from / 1000.0, to / 1000.0))
}

fn timestamps(value: &Value) -> Option<(f64, f64)> {
    let stamps = value.get("timestamps")?;
    let from = Timestamp::parse_plain(stamps.get("from")?.as_str()?).ok()?;
    let to = Timestamp::parse_plain(stamps.get("to")?.as_str()?).ok()?;
    Some((from.as_seconds(), to.as_seconds()))
}

fn is_special_token(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.starts_with('[') || text.starts_with('<')
}

/// Merge subword tokens into words: a token without a leading space
/// continues the previous word.
fn words_from_tokens(tokens: &[Value]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    for token in tokens {
        let (Some(text), Some((start, end))) = (
            token.get("text").and_then(Value::as_str),
            offsets_ms(token).or_else(|| timestamps(token)),
        ) else {
            continue;
        };
        if is_special_token(text) {
            continue;
        }
        match words.last_mut() {
            Some(last) if !text.starts_with(char::is_whitespace) => {
                last.word.push_str(text);
                last.end = end;
            }
            _ => words.push(Word {
                start,
                end,
                word: text.to_string(),
            }),
        }
    }
    words
}

/// Parse whisper.cpp `--output-json-full` output.
pub fn parse_whisper_json(content: &str) -> Result<Vec<Segment>> {
    let json: Value =
        serde_json::from_str(content).map_err(|e| SubtitleError::Transcript(e.to_string()))?;
    let entries = json
        .get("transcription")
        .and_then(Value::as_array)
        .ok_or_else(|| SubtitleError::Transcript("missing \"transcription\" array".to_string()))?;

    let mut segments = Vec::new();
    for entry in entries {
        let Some((start, end)) = offsets_ms(entry).or_else(|| timestamps(entry)) else {
            tracing::debug!("Skipping segment without timing: {}", entry);
            continue;
        };
        let text = entry
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let words = entry
            .get("tokens")
            .and_then(Value::as_array)
            .map(|tokens| words_from_tokens(tokens))
            .unwrap_or_default();
        if text.is_empty() && words.is_empty() {
            continue;
        }
        segments.push(Segment {
            start,
            end,
            text,
            words,
        });
    }
    Ok(segments)
}

/// Transcribe `video` and return shaped segments.
pub async fn transcribe(video: &Path, config: &TranscribeConfig) -> Result<Vec<Segment>> {
    let binary =
        find_whisper_binary().ok_or_else(|| SubtitleError::ToolNotFound("whisper.cpp".to_string()))?;
    let model = ensure_model(config.model).await?;

    let workdir = tempfile::tempdir()?;
    let audio = workdir.path().join("audio.wav");
    extract_audio(video, &audio).await?;

    let output_base = workdir.path().join("transcript");
    tracing::info!(
        "Transcribing {} with whisper.cpp ({})",
        video.display(),
        config.model
    );

    let mut command = Command::new(&binary);
    command
        .arg("-m")
        .arg(&model)
        .arg("-f")
        .arg(&audio)
        .args(["-l", &config.language, "--output-json-full", "-of"])
        .arg(&output_base);
    if config.wants_word_timings() {
        command.arg("--split-on-word");
    }
    run("whisper.cpp", &mut command).await?;

    let json = tokio::fs::read_to_string(output_base.with_extension("json")).await?;
    let segments = config.shape(parse_whisper_json(&json)?);
    tracing::info!("Transcribed {} segments", segments.len());
    Ok(segments)
}

/// Transcribe `video` into a plain-timed file at `output`.
pub async fn transcribe_to_file(
    video: &Path,
    output: &Path,
    config: &TranscribeConfig,
) -> Result<Vec<Segment>> {
    let segments = transcribe(video, config).await?;
    let text = transcript::to_plain_timed(&segments, config.max_words_per_line);
    tokio::fs::write(output, text).await?;
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const FULL_JSON: &str = r#"{
        "transcription": [
            {
                "timestamps": {"from": "00:00:00,000", "to": "00:00:02,000"},
                "offsets": {"from": 0, "to": 2000},
                "text": " Hello world",
                "tokens": [
                    {"text": "[_BEG_]", "offsets": {"from": 0, "to": 0}},
                    {"text": " Hel", "offsets": {"from": 0, "to": 400}},
                    {"text": "lo", "offsets": {"from": 400, "to": 800}},
                    {"text": " world", "offsets": {"from": 900, "to": 2000}}
                ]
            },
            {
                "timestamps": {"from": "00:00:02,500", "to": "00:00:03,000"},
                "text": " Bye"
            }
        ]
    }"#;

    #[test]
    fn test_model_names() {
        assert_eq!(WhisperModel::Small.ggml_filename(), "ggml-small.bin");
        assert_eq!(WhisperModel::from_str("large").unwrap(), WhisperModel::Large);
        assert!(WhisperModel::from_str("huge").is_err());
    }

    #[test]
    fn test_parse_whisper_json() {
        let segments = parse_whisper_json(FULL_JSON).unwrap();
        assert_eq!(segments.len(), 2);

        let first = &segments[0];
        assert_eq!(first.text, "Hello world");
        assert_eq!(first.words.len(), 2);
        assert_eq!(first.words[0].word, " Hello");
        assert_eq!((first.words[0].start, first.words[0].end), (0.0, 0.8));
        assert_eq!(first.words[1].word, " world");

        let second = &segments[1];
        assert_eq!((second.start, second.end), (2.5, 3.0));
        assert!(second.words.is_empty());
    }

    #[test]
    fn test_parse_whisper_json_rejects_other_shapes() {
        assert!(matches!(
            parse_whisper_json("{}"),
            Err(SubtitleError::Transcript(_))
        ));
        assert!(parse_whisper_json("not json").is_err());
    }

    #[test]
    fn test_shape_applies_limits() {
        let config = TranscribeConfig {
            max_words_per_segment: Some(1),
            ..Default::default()
        };
        let segments = config.shape(parse_whisper_json(FULL_JSON).unwrap());
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "world", "Bye"]);
    }
}
