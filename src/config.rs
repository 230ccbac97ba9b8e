use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,
    pub timing: TimingCfg,
    pub captions: CaptionCfg,
    pub ass: AssCfg,
    pub media: MediaCfg,
}

impl Config {
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("config.toml");
        let path = if let Some(p) = path_opt {
            Some(p)
        } else if default_path.exists() {
            Some(default_path)
        } else {
            None
        };

        let mut cfg = Config::default();

        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            cfg = Self::from_toml_str(&raw)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        }

        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
    pub debug_event_samples: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            debug_event_samples: 20,
        }
    }
}

/// Per-word timing estimate used when expanding transcript lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    pub word_spacing_ms: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            word_spacing_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionCfg {
    pub min_gap_ms: i64,
    pub max_words_per_event: usize,
    pub sentence_terminators: Vec<char>,
    pub fallback_tail_ms: i64,
    pub min_event_span_ms: i64,
}

impl Default for CaptionCfg {
    fn default() -> Self {
        Self {
            min_gap_ms: 100,
            max_words_per_event: 9,
            sentence_terminators: vec!['.', '।', '?', '!'],
            fallback_tail_ms: 2000,
            min_event_span_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssCfg {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub wrap_style: u8,
    pub title_wrap_width: usize,
    pub words_per_line: usize,
    pub title_pos_x: i32,
    pub title_pos_y: i32,
    pub title_style: StyleCfg,
    pub body_style: StyleCfg,
}

impl Default for AssCfg {
    fn default() -> Self {
        Self {
            play_res_x: 608,
            play_res_y: 1080,
            wrap_style: 2,
            title_wrap_width: 14,
            words_per_line: 3,
            title_pos_x: 304,
            title_pos_y: 40,
            title_style: StyleCfg::title(),
            body_style: StyleCfg::one_line(),
        }
    }
}

/// One `[V4+ Styles]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleCfg {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub scale_x: u32,
    pub scale_y: u32,
    pub spacing: i32,
    pub angle: i32,
    pub border_style: u8,
    pub outline: u32,
    pub shadow: u32,
    pub alignment: u8,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: u8,
}

impl StyleCfg {
    pub fn title() -> Self {
        Self {
            name: "Title".to_string(),
            font_name: "Noto Sans Bengali".to_string(),
            font_size: 90,
            primary_color: "&H00FFFFFF".to_string(),
            secondary_color: "&H000000FF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&HE0000000".to_string(),
            bold: true,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100,
            scale_y: 100,
            spacing: 0,
            angle: 0,
            border_style: 1,
            outline: 5,
            shadow: 0,
            alignment: 8,
            margin_l: 40,
            margin_r: 40,
            margin_v: 120,
            encoding: 1,
        }
    }

    pub fn one_line() -> Self {
        Self {
            name: "OneLine".to_string(),
            font_size: 68,
            back_color: "&HC0000000".to_string(),
            alignment: 2,
            margin_l: 15,
            margin_r: 15,
            margin_v: 130,
            ..Self::title()
        }
    }
}

impl Default for StyleCfg {
    fn default() -> Self {
        Self::one_line()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCfg {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub processing_dir: String,
    pub output_dir: String,
    pub output_extension: String,
    pub segment_extension: String,
}

impl Default for MediaCfg {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: None,
            processing_dir: "Processing".to_string(),
            output_dir: "Output".to_string(),
            output_extension: "mkv".to_string(),
            segment_extension: "mp4".to_string(),
        }
    }
}

pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    if is_json {
        fmt()
            .with_env_filter(filter)
            .event_format(fmt::format().json())
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .pretty()
            .init();
    }

    tracing::info!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let cfg = Config::default();
        let raw = cfg.to_toml_pretty().unwrap();
        let back = Config::from_toml_str(&raw).unwrap();
        assert_eq!(back.captions, cfg.captions);
        assert_eq!(back.ass.title_style.font_size, 90);
        assert_eq!(back.ass.body_style.back_color, "&HC0000000");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = Config::from_toml_str(
            r#"
[captions]
max_words_per_event = 5

[media]
timeout_secs = 300
"#,
        )
        .unwrap();
        assert_eq!(cfg.captions.max_words_per_event, 5);
        assert_eq!(cfg.captions.min_gap_ms, 100);
        assert_eq!(cfg.media.timeout_secs, Some(300));
        assert_eq!(cfg.timing.word_spacing_ms, 400);
        assert_eq!(cfg.ass.play_res_x, 608);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/reelcap.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed reading config file"));
    }
}
