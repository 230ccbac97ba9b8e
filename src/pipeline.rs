use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cli::{CreateCmd, RangeArgs, SubtitlesCmd},
    config::Config,
    error::CaptionError,
    formats::{self, ass::RenderedAss, time::seconds_to_clock_string},
    media::{MediaEngine, TranscodeJob},
    model::{CaptionEvent, TimeRange, Word},
    segment::Segmenter,
    transcript::{self, FixedSpacing, WordTimer},
};

/// Everything the engine derives for one reel.
#[derive(Debug, Clone)]
pub struct ReelCaptions {
    pub range: TimeRange,
    pub words: Vec<Word>,
    pub events: Vec<CaptionEvent>,
    pub duration_label: String,
    pub subtitles: RenderedAss,
}

/// Transcript text and range in, subtitle document out. Pure; touches no files.
pub fn synthesize(
    transcript_text: &str,
    range: &TimeRange,
    title: &str,
    cfg: &Config,
) -> Result<ReelCaptions, CaptionError> {
    let timer = FixedSpacing::from_ms(cfg.timing.word_spacing_ms);
    synthesize_with(transcript_text, range, title, cfg, &timer)
}

pub fn synthesize_with(
    transcript_text: &str,
    range: &TimeRange,
    title: &str,
    cfg: &Config,
    timer: &dyn WordTimer,
) -> Result<ReelCaptions, CaptionError> {
    if !range.is_ordered() {
        tracing::warn!(start = range.start, end = range.end, "end precedes start");
    }

    let lines = transcript::scan_lines(transcript_text);
    let words = transcript::select_words(&lines, range, timer)?;
    tracing::info!(lines = lines.len(), words = words.len(), "extracted transcript words");

    let events = Segmenter::new(&cfg.captions).segment(&words)?;
    let duration_label = seconds_to_clock_string(range.duration_secs());
    let subtitles = formats::ass::render_ass(&events, title, &duration_label, &cfg.ass);

    Ok(ReelCaptions {
        range: *range,
        words,
        events,
        duration_label,
        subtitles,
    })
}

pub fn run_create(cmd: CreateCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!(
        "create",
        start = cmd.range.start.as_str(),
        end = cmd.range.end.as_str()
    );
    let _g = span.enter();

    ensure_file(&cmd.video, "video")?;
    ensure_file(&cmd.range.transcript, "transcript")?;

    let name = cmd
        .output
        .clone()
        .unwrap_or_else(|| default_output_name(&cmd.range.start, &cmd.range.end));
    let paths = ReelPaths::new(&name, cfg)?;
    tracing::info!(name = name.as_str(), title = cmd.range.title.as_str(), "creating reel");

    let reel = build_from_file(&cmd.range, cfg)?;

    fs::write(&paths.words, formats::words::write_words(&reel.words))
        .with_context(|| format!("failed writing {}", paths.words.display()))?;
    fs::write(&paths.subtitles, &reel.subtitles.document)
        .with_context(|| format!("failed writing {}", paths.subtitles.display()))?;
    tracing::info!(
        events = reel.subtitles.event_count,
        path = %paths.subtitles.display(),
        "created subtitle events"
    );

    let jobs = [
        TranscodeJob::extract_segment(
            &cmd.video,
            &cmd.range.start,
            &cmd.range.end,
            cfg.ass.play_res_x,
            cfg.ass.play_res_y,
            &paths.segment,
        ),
        TranscodeJob::burn_subtitles(&paths.segment, &paths.subtitles, &paths.output),
    ];

    let engine = MediaEngine::new(&cfg.media);

    if cmd.dry_run {
        for job in &jobs {
            tracing::info!(
                step = job.description.as_str(),
                cmd = job.command_line(engine.ffmpeg_program()).as_str(),
                "dry run; not executing"
            );
        }
        return Ok(());
    }

    for job in &jobs {
        engine.run(job)?;
    }

    let probe = engine
        .probe(&paths.output)
        .context("failed to verify output")?;
    tracing::info!(
        output = %paths.output.display(),
        width = ?probe.width,
        height = ?probe.height,
        duration_secs = ?probe.duration_secs,
        events = reel.subtitles.event_count,
        "reel created"
    );

    Ok(())
}

pub fn run_subtitles(cmd: SubtitlesCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!(
        "subtitles",
        start = cmd.range.start.as_str(),
        end = cmd.range.end.as_str()
    );
    let _g = span.enter();

    ensure_file(&cmd.range.transcript, "transcript")?;
    let reel = build_from_file(&cmd.range, cfg)?;

    if cmd.stdout {
        print!("{}", reel.subtitles.document);
        tracing::info!(mode = "stdout", events = reel.subtitles.event_count, "wrote output");
        return Ok(());
    }

    let out_path = match cmd.output {
        Some(p) => p,
        None => {
            let name = default_output_name(&cmd.range.start, &cmd.range.end);
            ReelPaths::new(&name, cfg)?.subtitles
        }
    };
    write_output(&out_path, &reel.subtitles.document, cmd.overwrite)?;
    tracing::info!(
        path = %out_path.display(),
        events = reel.subtitles.event_count,
        "wrote output file"
    );

    Ok(())
}

fn build_from_file(args: &RangeArgs, cfg: &Config) -> Result<ReelCaptions> {
    let raw = fs::read_to_string(&args.transcript)
        .with_context(|| format!("failed reading transcript: {}", args.transcript.display()))?;
    tracing::info!(bytes = raw.len(), "read transcript");

    let range = TimeRange::parse(&args.start, &args.end);
    let reel = synthesize(&raw, &range, &args.title, cfg)?;
    tracing::info!(duration = reel.duration_label.as_str(), "clip duration");
    log_event_samples(&reel.events, cfg);
    Ok(reel)
}

/// Files produced for one reel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelPaths {
    pub words: PathBuf,
    pub subtitles: PathBuf,
    pub segment: PathBuf,
    pub output: PathBuf,
}

impl ReelPaths {
    /// Resolve paths under the configured dirs, creating the dirs if needed.
    pub fn new(name: &str, cfg: &Config) -> Result<Self> {
        let processing = Path::new(&cfg.media.processing_dir);
        let output = Path::new(&cfg.media.output_dir);
        for dir in [processing, output] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed creating directory: {}", dir.display()))?;
        }

        Ok(Self {
            words: processing.join(format!("{name}_words.txt")),
            subtitles: processing.join(format!("{name}.ass")),
            segment: processing.join(format!("{name}_segment.{}", cfg.media.segment_extension)),
            output: output.join(format!("{name}.{}", cfg.media.output_extension)),
        })
    }
}

/// `14:21.843`, `16:18.063` -> `reel_1421843_to_1618063`
pub fn default_output_name(start: &str, end: &str) -> String {
    let clean = |s: &str| s.replace([':', '.'], "");
    format!("reel_{}_to_{}", clean(start), clean(end))
}

fn ensure_file(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("{what} file not found: {}", path.display()));
    }
    Ok(())
}

fn write_output(path: &Path, data: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {}",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory: {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

fn log_event_samples(events: &[CaptionEvent], cfg: &Config) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_event_samples.min(events.len());
        for (i, e) in events.iter().take(n).enumerate() {
            tracing::debug!(
                idx = i,
                start_ms = e.start_ms,
                end_ms = e.end_ms,
                duration_ms = e.duration_ms(),
                words = e.text.split_whitespace().count(),
                "event sample"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
[0:00.000] Speaker 1: Hello there. How are you?
not a transcript line
[0:05.000] Speaker 2: Fine thanks
[0:20.000] Speaker 1: out of range
";
    const TITLE: &str = "Greetings from the transcript";

    fn range_args(transcript: PathBuf, start: &str, end: &str) -> RangeArgs {
        RangeArgs {
            transcript,
            start: start.to_string(),
            end: end.to_string(),
            title: TITLE.to_string(),
        }
    }

    fn temp_config(root: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.media.processing_dir = root.join("Processing").to_string_lossy().to_string();
        cfg.media.output_dir = root.join("Output").to_string_lossy().to_string();
        cfg
    }

    #[test]
    fn end_to_end_splits_on_sentence_and_keeps_order() {
        let cfg = Config::default();
        let range = TimeRange::parse("0:00.000", "0:10.000");
        let reel = synthesize(TRANSCRIPT, &range, TITLE, &cfg).unwrap();

        assert_eq!(reel.words.len(), 7);
        assert_eq!(reel.duration_label, "0:00:10.00");
        assert_eq!(reel.events.len(), 3);
        assert_eq!(reel.events[0].text, "Hello there.");
        assert_eq!(reel.events[1].text, "How are you?");
        assert!(reel.events[1].start_ms >= reel.events[0].end_ms);
        assert_eq!(reel.events[2].text, "Fine thanks");
        assert_eq!(reel.subtitles.event_count, 3);
        assert!(reel.subtitles.document.contains("Greetings from\\Nthe transcript"));
    }

    #[test]
    fn nothing_in_range_is_an_empty_selection() {
        let cfg = Config::default();
        let range = TimeRange::parse("1:00.000", "2:00.000");
        let err = synthesize(TRANSCRIPT, &range, TITLE, &cfg).unwrap_err();
        assert!(matches!(err, CaptionError::EmptySelection { .. }));
        assert_eq!(err.to_string(), "no words found between 60.000s and 120.000s");
    }

    #[test]
    fn injected_timer_changes_offsets_only() {
        let cfg = Config::default();
        let range = TimeRange::new(0.0, 1.0);
        let timer = |i: usize, _: &str| i as f64;
        let reel = synthesize_with(TRANSCRIPT, &range, TITLE, &cfg, &timer).unwrap();
        let offsets: Vec<i64> = reel.words.iter().map(|w| w.offset_ms).collect();
        assert_eq!(offsets, vec![0, 1000, 2000, 3000, 4000]);
    }

    #[test]
    fn output_name_strips_separators() {
        assert_eq!(
            default_output_name("14:21.843", "16:18.063"),
            "reel_1421843_to_1618063"
        );
    }

    #[test]
    fn dry_run_writes_words_and_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("talk.txt");
        let video = dir.path().join("talk.mp4");
        fs::write(&transcript, TRANSCRIPT).unwrap();
        fs::write(&video, b"").unwrap();
        let cfg = temp_config(dir.path());

        let cmd = CreateCmd {
            video,
            range: range_args(transcript, "0:00.000", "0:10.000"),
            output: Some("clip".to_string()),
            dry_run: true,
        };
        run_create(cmd, &cfg).unwrap();

        let processing = dir.path().join("Processing");
        let words = fs::read_to_string(processing.join("clip_words.txt")).unwrap();
        assert!(words.starts_with("Hello [0m0s0ms] there. [0m0s400ms]"));
        let ass = fs::read_to_string(processing.join("clip.ass")).unwrap();
        assert!(ass.contains("[Events]"));
        assert!(dir.path().join("Output").is_dir());
        assert!(!processing.join("clip_segment.mp4").exists());
    }

    #[test]
    fn create_requires_existing_video() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("talk.txt");
        fs::write(&transcript, TRANSCRIPT).unwrap();
        let cfg = temp_config(dir.path());

        let cmd = CreateCmd {
            video: dir.path().join("missing.mp4"),
            range: range_args(transcript, "0:00.000", "0:10.000"),
            output: None,
            dry_run: true,
        };
        let err = run_create(cmd, &cfg).unwrap_err();
        assert!(err.to_string().contains("video file not found"));
    }

    #[test]
    fn subtitles_refuse_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("talk.txt");
        let out = dir.path().join("subs").join("reel.ass");
        fs::write(&transcript, TRANSCRIPT).unwrap();
        let cfg = temp_config(dir.path());

        let cmd = || SubtitlesCmd {
            range: range_args(transcript.clone(), "0:00.000", "0:10.000"),
            output: Some(out.clone()),
            stdout: false,
            overwrite: false,
        };
        run_subtitles(cmd(), &cfg).unwrap();
        assert!(fs::read_to_string(&out).unwrap().contains("Dialogue:"));

        let err = run_subtitles(cmd(), &cfg).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}
