use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use subforge::encode::{self, EncodeMode};
use subforge::layout::EstimatedMeasure;
use subforge::transcribe::{self, WhisperModel};
use subforge::{check_dependencies, convert_to_styled, full_process, preview_line, AppConfig, Canvas};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod server;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a plain-timed subtitle file into a styled one
    Convert {
        input: PathBuf,
        /// Output file (defaults to the input with an .ass extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Show the resolved runs and layout of one dialogue line as JSON
    Preview {
        input: PathBuf,
        /// 1-based line number in the document
        #[arg(long)]
        line: usize,
        #[arg(long, default_value_t = 1920)]
        width: u32,
        #[arg(long, default_value_t = 1080)]
        height: u32,
    },
    /// Transcribe a video into a plain-timed subtitle file
    Transcribe {
        video: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        model: Option<WhisperModel>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        max_words_per_line: Option<usize>,
        #[arg(long)]
        max_segment_duration: Option<f64>,
        #[arg(long)]
        max_words_per_segment: Option<usize>,
    },
    /// Burn a subtitle file into the video frames
    Burn {
        video: PathBuf,
        subtitle: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Add a subtitle file as a selectable track
    Mux {
        video: PathBuf,
        subtitle: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Transcribe, style and encode in one go
    Run {
        video: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Mux as a soft track instead of burning in
        #[arg(long)]
        soft: bool,
    },
    /// Run in web server mode
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Write a default configuration file
    InitConfig { path: PathBuf },
    /// Show which external tools are available
    Status,
}

/// Overrides for the generated default style
#[derive(Args, Debug)]
struct StyleArgs {
    #[arg(long)]
    font: Option<String>,
    #[arg(long)]
    font_size: Option<u32>,
    /// Text color as an &HBBGGRR& token
    #[arg(long)]
    primary_color: Option<String>,
    /// Outline color as an &HBBGGRR& token
    #[arg(long)]
    outline_color: Option<String>,
    #[arg(long)]
    outline: Option<u32>,
    #[arg(long)]
    shadow: Option<u32>,
    /// Numpad alignment 1-9
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
    alignment: Option<u8>,
}

impl StyleArgs {
    fn apply(self, config: &mut AppConfig) {
        let style = &mut config.style;
        if let Some(v) = self.font {
            style.font = v;
        }
        if let Some(v) = self.font_size {
            style.font_size = v;
        }
        if let Some(v) = self.primary_color {
            style.primary_color = v;
        }
        if let Some(v) = self.outline_color {
            style.outline_color = v;
        }
        if let Some(v) = self.outline {
            style.outline = v;
        }
        if let Some(v) = self.shadow {
            style.shadow = v;
        }
        if let Some(v) = self.alignment {
            style.alignment = v;
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_status() {
    println!("\n=== External Tools ===");
    match which::which("ffmpeg") {
        Ok(path) => println!("  [OK] ffmpeg: {}", path.display()),
        Err(_) => println!("  [--] ffmpeg: Not found"),
    }
    match transcribe::find_whisper_binary() {
        Some(path) => println!("  [OK] whisper.cpp: {}", path.display()),
        None => {
            println!("  [--] whisper.cpp: Not found");
            println!("       Download from: https://github.com/ggerganov/whisper.cpp/releases");
        }
    }
    println!("  Models directory: {}", transcribe::models_dir().display());
    println!();
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    match cli.command {
        Command::Convert {
            input,
            output,
            style,
        } => {
            style.apply(&mut config);
            let text = convert_to_styled(&read(&input)?, &config.style)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension("ass"));
            std::fs::write(&output, text)?;
            println!("Styled subtitles written to {}", output.display());
        }
        Command::Preview {
            input,
            line,
            width,
            height,
        } => {
            let document = read(&input)?;
            let current = line
                .checked_sub(1)
                .and_then(|i| document.lines().nth(i))
                .ok_or_else(|| anyhow!("{} has no line {}", input.display(), line))?;
            let placement = preview_line(
                &document,
                current,
                Canvas { width, height },
                &EstimatedMeasure::default(),
            );
            println!("{}", serde_json::to_string_pretty(&placement)?);
        }
        Command::Transcribe {
            video,
            output,
            model,
            language,
            max_words_per_line,
            max_segment_duration,
            max_words_per_segment,
        } => {
            check_dependencies(true)?;
            let settings = &mut config.transcription;
            if let Some(model) = model {
                settings.model = model;
            }
            if let Some(language) = language {
                settings.language = language;
            }
            settings.max_words_per_line = max_words_per_line.or(settings.max_words_per_line);
            settings.max_segment_duration =
                max_segment_duration.or(settings.max_segment_duration);
            settings.max_words_per_segment =
                max_words_per_segment.or(settings.max_words_per_segment);

            let output = output.unwrap_or_else(|| video.with_extension("srt"));
            let segments = transcribe::transcribe_to_file(&video, &output, settings).await?;
            println!(
                "{} caption(s) written to {}",
                segments.len(),
                output.display()
            );
        }
        Command::Burn {
            video,
            subtitle,
            output,
        } => {
            check_dependencies(false)?;
            encode::encode(EncodeMode::Burn, &video, &subtitle, &output, &config.encode).await?;
            println!("Video written to {}", output.display());
        }
        Command::Mux {
            video,
            subtitle,
            output,
        } => {
            check_dependencies(false)?;
            encode::encode(EncodeMode::Soft, &video, &subtitle, &output, &config.encode).await?;
            println!("Video written to {}", output.display());
        }
        Command::Run {
            video,
            output,
            soft,
        } => {
            check_dependencies(true)?;
            let mode = if soft { EncodeMode::Soft } else { EncodeMode::Burn };
            let document = full_process(&video, &output, mode, &config).await?;
            println!(
                "Finished processing. {} caption(s) in {}",
                document.events.len(),
                output.display()
            );
        }
        Command::Serve { port } => {
            server::start_server(port, config.style.clone()).await?;
        }
        Command::InitConfig { path } => {
            AppConfig::default().to_file(&path)?;
            println!("Default configuration written to {}", path.display());
        }
        Command::Status => print_status(),
    }

    Ok(())
}
