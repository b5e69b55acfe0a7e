//! Hand-off of finished subtitles to FFmpeg, either burned into the frames
//! or muxed as a selectable track.
//!
//! Dropping an encode future kills the FFmpeg child; that is the only form
//! of cancellation.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use strum::{Display, EnumString};
use tokio::process::Command;

use crate::document::StyledDocument;
use crate::error::{Result, SubtitleError};
use crate::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EncodeMode {
    /// Render the subtitles into the video frames
    #[default]
    Burn,
    /// Add the subtitles as a soft track, copying all streams
    Soft,
}

/// FFmpeg settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub ffmpeg: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
        }
    }
}

/// Escape a path for use inside an FFmpeg filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Matroska carries styled subtitles as-is; MP4 containers need `mov_text`.
fn soft_subtitle_codec(output: &Path) -> &'static str {
    let is_matroska = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mkv"));
    if is_matroska {
        "copy"
    } else {
        "mov_text"
    }
}

/// Arguments for one FFmpeg invocation (without the binary).
pub fn build_args(
    mode: EncodeMode,
    video: &Path,
    subtitle: &Path,
    output: &Path,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(video.to_string_lossy().into_owned());

    match mode {
        EncodeMode::Burn => {
            args.push("-vf".to_string());
            args.push(format!("subtitles='{}'", escape_filter_path(subtitle)));
            let crf = settings.crf.to_string();
            args.extend(
                [
                    "-c:v",
                    settings.video_codec.as_str(),
                    "-preset",
                    settings.preset.as_str(),
                    "-crf",
                    crf.as_str(),
                    "-c:a",
                    "copy",
                ]
                .iter()
                .map(|s| s.to_string()),
            );
        }
        EncodeMode::Soft => {
            args.push("-i".to_string());
            args.push(subtitle.to_string_lossy().into_owned());
            args.extend(
                ["-map", "0", "-map", "1", "-c", "copy", "-c:s", soft_subtitle_codec(output)]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
    }

    args.push(output.to_string_lossy().into_owned());
    args
}

/// Run FFmpeg. A non-zero exit is returned as
/// [`SubtitleError::ExternalProcessFailure`] and is not retried.
pub async fn encode(
    mode: EncodeMode,
    video: &Path,
    subtitle: &Path,
    output: &Path,
    settings: &EncodeSettings,
) -> Result<()> {
    which::which(&settings.ffmpeg)
        .map_err(|_| SubtitleError::ToolNotFound(settings.ffmpeg.clone()))?;

    let args = build_args(mode, video, subtitle, output, settings);
    tracing::info!("Encoding {} ({}) -> {}", video.display(), mode, output.display());
    tracing::debug!("{} {}", settings.ffmpeg, args.join(" "));

    process::run(&settings.ffmpeg, Command::new(&settings.ffmpeg).args(&args)).await?;
    Ok(())
}

/// Write `document` to a temporary styled subtitle file and encode with it.
pub async fn encode_document(
    mode: EncodeMode,
    video: &Path,
    document: &StyledDocument,
    output: &Path,
    settings: &EncodeSettings,
) -> Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix("subforge-")
        .suffix(".ass")
        .tempfile()?;
    file.write_all(document.render().as_bytes())?;
    file.flush()?;

    encode(mode, video, file.path(), output, settings).await
}
