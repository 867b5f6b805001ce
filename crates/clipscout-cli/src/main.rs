use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use clipscout_core::{
    generate_report, AnalysisConfig, CandidateMoment, Exporter, Lexicon, MarkerFormat,
    TranscriptFragment, ViralMomentDetector,
};
use clipscout_sources::{
    load_transcript_file, render_moments, CaptionGenerator, FfmpegClipRenderer,
    JsonTranscriptProvider, ReasonCaptionGenerator, TranscriptProvider,
};

#[derive(Parser)]
#[command(name = "clipscout", version, about = "Find short-form clip candidates in video transcripts")]
struct Cli {
    #[arg(long, short = 'v', global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct TranscriptArgs {
    #[arg(help = "Video ID")]
    video_id: String,
    #[arg(long, default_value = "transcripts", help = "Directory holding <VIDEO_ID>.json transcripts")]
    transcripts: PathBuf,
    #[arg(long, help = "Read the transcript from this file instead")]
    file: Option<PathBuf>,
    #[arg(long, help = "Analysis config file (JSON)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Replace the built-in lexicon with this file (JSON)")]
    lexicon: Option<PathBuf>,
    #[arg(long, help = "Minimum moment score (0-1)")]
    min_score: Option<f64>,
    #[arg(long, help = "Maximum number of moments")]
    max_results: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Detect viral-worthy moments in a transcript")]
    Detect {
        #[command(flatten)]
        source: TranscriptArgs,
        #[arg(long, value_enum, default_value = "text", help = "Output format")]
        format: OutputFormat,
        #[arg(long, short = 'o', help = "Write output to this file instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, default_value = "30", help = "Frame rate for EDL timecodes")]
        fps: f64,
    },
    #[command(about = "Print the built-in lexicon as JSON")]
    Lexicon,
    #[command(about = "Detect moments and cut them into clips with ffmpeg")]
    Clip {
        #[command(flatten)]
        source: TranscriptArgs,
        #[arg(long, default_value = "videos", help = "Directory holding <VIDEO_ID>.mp4 source videos")]
        videos: PathBuf,
        #[arg(long, default_value = "clips", help = "Output directory for clips")]
        out: PathBuf,
        #[arg(long, help = "Burn a caption into each clip")]
        captions: bool,
        #[arg(long, default_value = "ffmpeg", help = "ffmpeg binary")]
        ffmpeg: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
    Audacity,
    Edl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Detect {
            source,
            format,
            output,
            fps,
        } => {
            let moments = detect(&source).await?;
            let rendered = format_moments(&moments, &source.video_id, format, fps)?;
            write_output(&rendered, output.as_deref())?;
        }
        Commands::Lexicon => {
            println!("{}", serde_json::to_string_pretty(&Lexicon::default())?);
        }
        Commands::Clip {
            source,
            videos,
            out,
            captions,
            ffmpeg,
        } => {
            let moments = detect(&source).await?;
            if moments.is_empty() {
                println!("{}", generate_report(&moments));
                return Ok(());
            }

            let renderer = FfmpegClipRenderer::new(videos, out).with_ffmpeg(ffmpeg);
            let captioner = ReasonCaptionGenerator::default();
            let captioner = captions.then_some(&captioner as &dyn CaptionGenerator);

            let summary = render_moments(&renderer, captioner, &source.video_id, &moments).await;
            for clip in &summary.clips {
                println!("#{} {}", clip.moment_index + 1, clip.path.display());
            }
            for failure in &summary.failures {
                eprintln!("#{} failed: {}", failure.moment_index + 1, failure.error);
            }

            if summary.clips.is_empty() {
                bail!("No clips could be rendered for {}", source.video_id);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Merge the config file with command line overrides
fn load_config(args: &TranscriptArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(min_score) = args.min_score {
        config.detector.min_score = min_score;
    }
    if let Some(max_results) = args.max_results {
        config.detector.max_results = max_results;
    }

    Ok(config)
}

fn build_detector(args: &TranscriptArgs) -> Result<ViralMomentDetector> {
    let config = load_config(args)?;

    let base = match &args.lexicon {
        Some(path) => Lexicon::from_file(path)
            .with_context(|| format!("Failed to load lexicon {}", path.display()))?,
        None => Lexicon::default(),
    };
    let lexicon = base.with_overrides(&config.lexicon_overrides)?;

    ViralMomentDetector::new(Arc::new(lexicon), config.detector).context("Invalid detector settings")
}

async fn fetch_transcript(args: &TranscriptArgs) -> Result<Vec<TranscriptFragment>> {
    let transcript = match &args.file {
        Some(path) => load_transcript_file(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display()))?,
        None => {
            let provider = JsonTranscriptProvider::new(&args.transcripts);
            debug!("Fetching transcript with {}", provider.name());
            provider.fetch_transcript(&args.video_id).await?
        }
    };

    Ok(transcript)
}

async fn detect(args: &TranscriptArgs) -> Result<Vec<CandidateMoment>> {
    let detector = build_detector(args)?;
    let transcript = fetch_transcript(args).await?;
    info!("Analyzing {} ({} fragments)", args.video_id, transcript.len());

    let moments = tokio::task::spawn_blocking(move || detector.detect(&transcript))
        .await
        .context("Detection task panicked")??;

    Ok(moments)
}

fn format_moments(
    moments: &[CandidateMoment],
    source: &str,
    format: OutputFormat,
    fps: f64,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => generate_report(moments),
        OutputFormat::Json => Exporter::json_report(moments, source, true)?,
        OutputFormat::Csv => Exporter::markers(moments, MarkerFormat::Csv),
        OutputFormat::Audacity => Exporter::markers(moments, MarkerFormat::Audacity),
        OutputFormat::Edl => Exporter::edl(moments, source, fps, None),
    };

    Ok(rendered)
}

fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_args(extra: &[&str]) -> TranscriptArgs {
        let mut argv = vec!["clipscout", "detect", "abc123"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Detect { source, .. } => source,
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_parse_detect() {
        let cli = Cli::try_parse_from([
            "clipscout", "-v", "detect", "abc123", "--format", "edl", "--min-score", "0.5",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Detect { source, format, fps, .. } => {
                assert_eq!(source.video_id, "abc123");
                assert_eq!(source.transcripts, PathBuf::from("transcripts"));
                assert_eq!(source.min_score, Some(0.5));
                assert_eq!(format, OutputFormat::Edl);
                assert_eq!(fps, 30.0);
            }
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detector": { "min_score": 0.4, "max_results": 3 } }"#).unwrap();

        let path_str = path.to_str().unwrap();
        let config = load_config(&transcript_args(&["--config", path_str, "--max-results", "7"])).unwrap();
        assert_eq!(config.detector.min_score, 0.4);
        assert_eq!(config.detector.max_results, 7);
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(build_detector(&transcript_args(&["--min-score", "1.5"])).is_err());
    }

    #[tokio::test]
    async fn test_detect_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(
            &path,
            r#"[
                {"text": "this is INSANE you won't believe it!!", "start": 0, "end": 4},
                {"text": "okay moving on to the next topic", "start": 4, "duration": 6}
            ]"#,
        )
        .unwrap();

        let moments = detect(&transcript_args(&["--file", path.to_str().unwrap()])).await.unwrap();
        assert_eq!(moments.len(), 1);

        let csv = format_moments(&moments, "abc123", OutputFormat::Csv, 30.0).unwrap();
        assert!(csv.starts_with("start,end,score,reasons,text\n0.000,4.000,"));
    }

    #[tokio::test]
    async fn test_missing_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let args = transcript_args(&["--transcripts", dir.path().to_str().unwrap()]);
        let err = detect(&args).await.unwrap_err();
        assert!(err.to_string().contains("No transcript available"));
    }
}
