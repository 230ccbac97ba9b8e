//! Thin wrapper around the external `ffmpeg`/`ffprobe` binaries.
//!
//! Work is described as [`TranscodeJob`] values (an argument vector plus a label) and
//! run without a shell, so paths with spaces or quotes need no escaping.

use std::{
    io::Read,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::config::MediaCfg;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found on PATH; install FFmpeg or set [media] paths in the config")]
    NotFound(String),

    #[error("{step} failed: {stderr}")]
    ExecutionFailed { step: String, stderr: String },

    #[error("{step} exceeded {secs}s and was killed")]
    TimedOut { step: String, secs: u64 },

    #[error("ffprobe error: {0}")]
    ProbeError(String),

    #[error("process error: {0}")]
    Process(#[from] std::io::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// A single declarative ffmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub description: String,
    pub args: Vec<String>,
}

impl TranscodeJob {
    /// Cut `[start, end]` out of `input` and scale-crop it to fill `width`x`height`.
    pub fn extract_segment(
        input: &Path,
        start: &str,
        end: &str,
        width: u32,
        height: u32,
        output: &Path,
    ) -> Self {
        let filter = format!(
            "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height}"
        );
        Self {
            description: "Extracting video segment".to_string(),
            args: vec![
                "-i".to_string(),
                input.to_string_lossy().to_string(),
                "-ss".to_string(),
                start.to_string(),
                "-to".to_string(),
                end.to_string(),
                "-vf".to_string(),
                filter,
                "-c:a".to_string(),
                "copy".to_string(),
                "-y".to_string(),
                output.to_string_lossy().to_string(),
            ],
        }
    }

    /// Burn an `.ass` document into `input`.
    pub fn burn_subtitles(input: &Path, subtitles: &Path, output: &Path) -> Self {
        Self {
            description: "Applying subtitles".to_string(),
            args: vec![
                "-i".to_string(),
                input.to_string_lossy().to_string(),
                "-vf".to_string(),
                format!("ass={}", escape_filter_path(subtitles)),
                "-c:a".to_string(),
                "copy".to_string(),
                "-y".to_string(),
                output.to_string_lossy().to_string(),
            ],
        }
    }

    pub fn command_line(&self, program: &str) -> String {
        let mut parts = vec![program.to_string()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(char::is_whitespace) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Filter option values treat `:` `\` and `'` specially.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSummary {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

/// Parse `ffprobe -of default=noprint_wrappers=1` output (`key=value` per line).
pub fn parse_probe_output(stdout: &str) -> ProbeSummary {
    let mut summary = ProbeSummary {
        width: None,
        height: None,
        duration_secs: None,
    };

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "width" if summary.width.is_none() => summary.width = value.parse().ok(),
            "height" if summary.height.is_none() => summary.height = value.parse().ok(),
            "duration" if summary.duration_secs.is_none() => {
                summary.duration_secs = value.parse().ok()
            }
            _ => {}
        }
    }

    summary
}

pub struct MediaEngine {
    ffmpeg: String,
    ffprobe: String,
    timeout: Option<Duration>,
}

impl MediaEngine {
    pub fn new(cfg: &MediaCfg) -> Self {
        Self {
            ffmpeg: cfg.ffmpeg_path.clone(),
            ffprobe: cfg.ffprobe_path.clone(),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn ffmpeg_program(&self) -> &str {
        &self.ffmpeg
    }

    pub fn run(&self, job: &TranscodeJob) -> MediaResult<()> {
        tracing::info!(step = job.description.as_str(), "running ffmpeg");
        tracing::debug!(cmd = job.command_line(&self.ffmpeg).as_str(), "ffmpeg command");

        let mut child = spawn(&self.ffmpeg, &job.args)?;
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || stderr.map(drain_lossy).unwrap_or_default());

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit, &job.description)?,
            None => child.wait()?,
        };
        let stderr = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(MediaError::ExecutionFailed {
                step: job.description.clone(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    pub fn probe(&self, file: &Path) -> MediaResult<ProbeSummary> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-show_entries",
                "stream=width,height",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(file)
            .output()
            .map_err(|e| not_found_or(e, &self.ffprobe))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::ProbeError(stderr.trim().to_string()));
        }

        Ok(parse_probe_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Read a child stream to the end. Invalid UTF-8 is replaced rather than discarding
/// the whole message, and a failed read keeps whatever arrived before it.
fn drain_lossy<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buf) {
        tracing::debug!(error = %e, bytes = buf.len(), "stderr read ended early");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn spawn(program: &str, args: &[String]) -> MediaResult<Child> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or(e, program))
}

fn not_found_or(e: std::io::Error, program: &str) -> MediaError {
    if e.kind() == std::io::ErrorKind::NotFound {
        MediaError::NotFound(program.to_string())
    } else {
        MediaError::Process(e)
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration, step: &str) -> MediaResult<ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MediaError::TimedOut {
                step: step.to_string(),
                secs: limit.as_secs(),
            });
        }
        thread::sleep(Duration::from_millis(50));
    }
}
