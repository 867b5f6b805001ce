//! Clip rendering with ffmpeg

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

use clipscout_core::CandidateMoment;

use crate::error::SourceError;
use crate::file::check_video_id;
use crate::provider::{CaptionGenerator, ClipRenderer};

/// Renderer cutting clips out of local source videos
///
/// Source videos are looked up as `<videos_dir>/<video_id>.<extension>`.
#[derive(Debug, Clone)]
pub struct FfmpegClipRenderer {
    videos_dir: PathBuf,
    output_dir: PathBuf,
    ffmpeg: PathBuf,
    extension: String,
}

impl FfmpegClipRenderer {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(videos_dir: P, output_dir: Q) -> Self {
        Self {
            videos_dir: videos_dir.into(),
            output_dir: output_dir.into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            extension: "mp4".to_string(),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn with_ffmpeg<P: Into<PathBuf>>(mut self, ffmpeg: P) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    /// Set the container extension for both source and output files
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Path of the source video
    pub fn source_path(&self, video_id: &str) -> PathBuf {
        self.videos_dir.join(format!("{}.{}", video_id, self.extension))
    }

    /// Path of a rendered clip; times are encoded in milliseconds
    pub fn output_path(&self, video_id: &str, start_time: f64, end_time: f64) -> PathBuf {
        let start_ms = (start_time * 1000.0).round() as u64;
        let end_ms = (end_time * 1000.0).round() as u64;
        self.output_dir
            .join(format!("{}_{}_{}.{}", video_id, start_ms, end_ms, self.extension))
    }
}

impl ClipRenderer for FfmpegClipRenderer {
    async fn render_clip(
        &self,
        video_id: &str,
        start_time: f64,
        end_time: f64,
        caption: Option<&str>,
    ) -> Result<PathBuf, SourceError> {
        check_video_id(video_id)?;

        if end_time <= start_time {
            return Err(SourceError::EncodingFailed(format!(
                "empty clip range {:.3}-{:.3}",
                start_time, end_time
            )));
        }

        let source = self.source_path(video_id);
        if !fs::try_exists(&source).await? {
            return Err(SourceError::DownloadFailed(format!(
                "source video not found: {}",
                source.display()
            )));
        }

        fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_path(video_id, start_time, end_time);
        let args = ffmpeg_args(&source, &output, start_time, end_time, caption);

        debug!("Running {} {}", self.ffmpeg.display(), args.join(" "));

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                SourceError::EncodingFailed(format!("failed to run {}: {}", self.ffmpeg.display(), e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
            return Err(SourceError::EncodingFailed(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        info!("Rendered clip {}", output.display());
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Build the ffmpeg argument list for one clip
fn ffmpeg_args(
    source: &Path,
    output: &Path,
    start_time: f64,
    end_time: f64,
    caption: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-nostdin".to_string(),
        "-ss".to_string(),
        format!("{:.3}", start_time),
        "-t".to_string(),
        format!("{:.3}", end_time - start_time),
        "-i".to_string(),
        source.display().to_string(),
    ];

    if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
        args.push("-vf".to_string());
        args.push(drawtext_filter(caption));
    }

    args.extend(
        [
            "-c:v", "libx264", "-preset", "faster", "-crf", "23", "-c:a", "aac", "-b:a", "192k",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(output.display().to_string());

    args
}

/// drawtext filter placing the caption near the bottom of the frame
///
/// `expansion=none` keeps `%` literal.
fn drawtext_filter(caption: &str) -> String {
    format!(
        "drawtext=text={}:expansion=none:fontcolor=white:fontsize=48:box=1:boxcolor=black@0.5:boxborderw=12:x=(w-text_w)/2:y=h-text_h-80",
        escape_filtergraph(&escape_option_value(caption))
    )
}

/// First level: the filter's own option parser (`key=value:key=value`)
fn escape_option_value(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | ':' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Second level: the filtergraph parser, which strips one layer of escapes
fn escape_filtergraph(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A clip rendered for one moment
#[derive(Debug, Clone, Serialize)]
pub struct RenderedClip {
    pub moment_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub caption: Option<String>,
    pub path: PathBuf,
}

/// A moment that could not be rendered
#[derive(Debug, Clone, Serialize)]
pub struct RenderFailure {
    pub moment_index: usize,
    pub error: String,
}

/// Outcome of a batch render
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderSummary {
    pub clips: Vec<RenderedClip>,
    pub failures: Vec<RenderFailure>,
}

impl RenderSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render every moment in order, collecting failures instead of stopping
pub async fn render_moments<R: ClipRenderer>(
    renderer: &R,
    captioner: Option<&dyn CaptionGenerator>,
    video_id: &str,
    moments: &[CandidateMoment],
) -> RenderSummary {
    let mut summary = RenderSummary::default();

    for (index, moment) in moments.iter().enumerate() {
        let caption = captioner.map(|c| c.caption(moment));

        match renderer
            .render_clip(video_id, moment.start_time, moment.end_time, caption.as_deref())
            .await
        {
            Ok(path) => summary.clips.push(RenderedClip {
                moment_index: index,
                start_time: moment.start_time,
                end_time: moment.end_time,
                caption,
                path,
            }),
            Err(e) => {
                warn!("Failed to render moment {} with {}: {}", index, renderer.name(), e);
                summary.failures.push(RenderFailure {
                    moment_index: index,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Rendered {}/{} clips for {}",
        summary.clips.len(),
        moments.len(),
        video_id
    );

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::caption::ReasonCaptionGenerator;

    struct MockRenderer;

    impl ClipRenderer for MockRenderer {
        async fn render_clip(
            &self,
            video_id: &str,
            start_time: f64,
            _end_time: f64,
            _caption: Option<&str>,
        ) -> Result<PathBuf, SourceError> {
            if start_time >= 100.0 {
                return Err(SourceError::EncodingFailed("boom".to_string()));
            }
            Ok(PathBuf::from(format!("{}_{}.mp4", video_id, start_time)))
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    fn moment(start_time: f64, end_time: f64) -> CandidateMoment {
        CandidateMoment {
            start_time,
            end_time,
            score: 0.5,
            reasons: vec!["Drama or conflict".to_string()],
            category_breakdown: BTreeMap::new(),
            text: "This is where it all went wrong.".to_string(),
        }
    }

    #[test]
    fn test_caption_escaped_for_both_parsers() {
        assert_eq!(escape_option_value("a:b'c\\d"), r"a\:b\'c\\d");
        assert_eq!(escape_filtergraph(r"a\:b\'c"), r"a\\:b\\\'c");
        assert_eq!(escape_filtergraph("x[1],y;z"), r"x\[1\]\,y\;z");

        let filter = drawtext_filter("You won't believe this!\nreally");
        assert!(filter.starts_with(r"drawtext=text=You won\\\'t believe this! really:expansion=none:"));
    }

    #[tokio::test]
    async fn test_render_moments_collects_failures() {
        let moments = vec![moment(0.0, 5.0), moment(100.0, 110.0), moment(200.0, 204.0)];
        let captioner = ReasonCaptionGenerator::default();

        let summary = render_moments(&MockRenderer, Some(&captioner), "vid", &moments).await;

        assert_eq!(summary.clips.len(), 1);
        assert_eq!(summary.clips[0].moment_index, 0);
        assert_eq!(
            summary.clips[0].caption.as_deref(),
            Some("This is where it all went wrong.")
        );
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].moment_index, 1);
        assert!(!summary.is_complete());
    }

    #[tokio::test]
    async fn test_render_without_captions() {
        let summary = render_moments(&MockRenderer, None, "vid", &[moment(1.0, 4.0)]).await;
        assert!(summary.is_complete());
        assert_eq!(summary.clips[0].caption, None);
    }

    #[tokio::test]
    async fn test_missing_source_video() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FfmpegClipRenderer::new(dir.path(), dir.path().join("out"));

        let result = renderer.render_clip("missing", 0.0, 5.0, None).await;
        assert!(matches!(result, Err(SourceError::DownloadFailed(_))));

        let result = renderer.render_clip("../escape", 0.0, 5.0, None).await;
        assert!(matches!(result, Err(SourceError::InvalidVideoId(_))));

        let not_a_dir = dir.path().join("plain.txt");
        std::fs::write(&not_a_dir, "x").unwrap();
        let renderer = FfmpegClipRenderer::new(&not_a_dir, dir.path().join("out"));
        let result = renderer.render_clip("abc", 0.0, 5.0, None).await;
        assert!(matches!(result, Err(SourceError::IoError(_))));
    }

    #[test]
    fn test_paths() {
        let renderer = FfmpegClipRenderer::new("videos", "clips").with_extension(".mkv");
        assert_eq!(renderer.source_path("abc"), PathBuf::from("videos/abc.mkv"));
        assert_eq!(
            renderer.output_path("abc", 12.5, 20.0),
            PathBuf::from("clips/abc_12500_20000.mkv")
        );
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = ffmpeg_args(Path::new("in.mp4"), Path::new("out.mp4"), 12.5, 20.0, Some("Wait: it's 100%"));

        assert_eq!(&args[..8], ["-y", "-nostdin", "-ss", "12.500", "-t", "7.500", "-i", "in.mp4"]);
        assert_eq!(args[8], "-vf");
        assert!(args[9].starts_with(r"drawtext=text=Wait\\: it\\\'s 100%:expansion=none:"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));

        let plain = ffmpeg_args(Path::new("in.mp4"), Path::new("out.mp4"), 0.0, 3.0, Some("  "));
        assert!(!plain.contains(&"-vf".to_string()));
    }
}
