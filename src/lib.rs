//! Subtitle format engine: plain-timed to styled conversion, style sheets,
//! inline overrides and line layout, plus thin wrappers around the external
//! transcription and encoding tools.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub mod color;
pub mod config;
pub mod convert;
pub mod document;
pub mod encode;
pub mod error;
pub mod layout;
pub mod overrides;
mod process;
pub mod style;
pub mod timestamp;
pub mod transcribe;
pub mod transcript;

pub use color::Rgb;
pub use config::AppConfig;
pub use convert::{convert_to_styled, plain_to_document, CaptionBlock, StyleParams};
pub use document::{ScriptInfo, StyledDocument, StyledEvent};
pub use encode::EncodeMode;
pub use error::SubtitleError;
pub use layout::{layout, preview_line, Canvas, LayoutPlacement, TextMeasure};
pub use overrides::{resolve_runs, ResolvedRun};
pub use style::{parse_styles, Alignment, StyleRecord, StyleTable};

/// Transcribe `video`, style the captions and hand them to FFmpeg.
///
/// Returns the styled document that was encoded.
pub async fn full_process(
    video: &Path,
    output: &Path,
    mode: EncodeMode,
    config: &AppConfig,
) -> Result<StyledDocument> {
    if !video.is_file() {
        return Err(anyhow!("Video not found: {}", video.display()));
    }

    let segments = transcribe::transcribe(video, &config.transcription)
        .await
        .context("Transcription failed")?;
    if segments.is_empty() {
        return Err(anyhow!("No speech found in {}", video.display()));
    }

    let plain = transcript::to_plain_timed(&segments, config.transcription.max_words_per_line);
    let document = plain_to_document(&plain, &config.style)?;
    tracing::info!("Generated {} styled events", document.events.len());

    encode::encode_document(mode, video, &document, output, &config.encode)
        .await
        .context("Encoding failed")?;

    Ok(document)
}

/// Check that FFmpeg (required) and whisper.cpp (for transcription) exist.
pub fn check_dependencies(need_transcription: bool) -> Result<()> {
    if which::which("ffmpeg").is_err() {
        return Err(anyhow!(
            "FFmpeg not found. Please install FFmpeg and ensure it is in PATH."
        ));
    }

    if need_transcription && transcribe::find_whisper_binary().is_none() {
        return Err(anyhow!("whisper.cpp not found. Please install it and ensure it is in PATH.\nDownload: https://github.com/ggerganov/whisper.cpp/releases"));
    }

    Ok(())
}
