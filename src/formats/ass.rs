use crate::{
    config::{AssCfg, StyleCfg},
    formats::time::ms_to_subtitle_time,
    model::{CaptionEvent, TitleBlock},
};

/// Hard line break understood by libass.
pub const LINE_BREAK: &str = "\\N";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAss {
    pub document: String,
    pub event_count: usize,
}

/// Build the full `.ass` document: header, both styles, the persistent title and one
/// dialogue line per caption event.
pub fn render_ass(
    events: &[CaptionEvent],
    title_text: &str,
    duration_label: &str,
    cfg: &AssCfg,
) -> RenderedAss {
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str(&format!("WrapStyle: {}\n", cfg.wrap_style));
    out.push_str("ScaledBorderAndShadow: yes\n");
    out.push_str(&format!("PlayResX: {}\n", cfg.play_res_x));
    out.push_str(&format!("PlayResY: {}\n\n", cfg.play_res_y));

    out.push_str("[V4+ Styles]\n");
    out.push_str(STYLE_FORMAT);
    out.push('\n');
    out.push_str(&format_style(&cfg.title_style));
    out.push_str(&format_style(&cfg.body_style));

    out.push_str("\n[Events]\n");
    out.push_str(EVENT_FORMAT);
    out.push('\n');

    let title = wrap_title(title_text, cfg.title_wrap_width);
    out.push_str(&format!(
        "Dialogue: 0,{start},{end},{style},,0,0,0,,{{\\pos({x},{y})\\an{align}\\q2}}{text}\n",
        start = ms_to_subtitle_time(0),
        end = duration_label,
        style = cfg.title_style.name,
        x = cfg.title_pos_x,
        y = cfg.title_pos_y,
        align = cfg.title_style.alignment,
        text = title.joined(LINE_BREAK),
    ));

    for event in events {
        out.push_str(&format!(
            "Dialogue: 0,{start},{end},{style},,0,0,0,,{text}\n",
            start = ms_to_subtitle_time(event.start_ms),
            end = ms_to_subtitle_time(event.end_ms),
            style = cfg.body_style.name,
            text = break_into_lines(&event.text, cfg.words_per_line),
        ));
    }

    RenderedAss {
        document: out,
        event_count: events.len(),
    }
}

/// Collapse whitespace and greedily wrap to `width` characters. Words longer than the
/// width fill the rest of the current line, then spill over; nothing is dropped.
pub fn wrap_title(title_text: &str, width: usize) -> TitleBlock {
    let normalized = normalize_ws(title_text);
    if normalized.is_empty() {
        return TitleBlock {
            lines: vec![String::new()],
        };
    }

    TitleBlock {
        lines: fill_lines(&normalized, width.max(1)),
    }
}

/// Width is counted in chars, so combining marks (Bengali virama, vowel signs) count too.
fn fill_lines(text: &str, width: usize) -> Vec<String> {
    // Words and single-space separators, last chunk on top.
    let mut chunks: Vec<Vec<char>> = Vec::new();
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            chunks.push(vec![' ']);
        }
        chunks.push(word.chars().collect());
    }
    chunks.reverse();

    let mut lines = Vec::new();
    while !chunks.is_empty() {
        if chunks.last().is_some_and(|c| c == &[' ']) {
            chunks.pop();
        }

        let mut line: Vec<char> = Vec::with_capacity(width);
        while chunks.last().is_some_and(|c| line.len() + c.len() <= width) {
            if let Some(chunk) = chunks.pop() {
                line.extend(chunk);
            }
        }

        if let Some(long) = chunks.last_mut().filter(|c| c.len() > width) {
            let room = width.saturating_sub(line.len());
            if room > 0 {
                let rest = long.split_off(room);
                line.append(long);
                *long = rest;
            }
        }

        if line.last() == Some(&' ') {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line.into_iter().collect());
        }
    }

    if lines.is_empty() {
        lines.push(text.to_string());
    }
    lines
}

/// Regroup caption text into visual lines of at most `per_line` words.
fn break_into_lines(text: &str, per_line: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return text.to_string();
    }
    words
        .chunks(per_line.max(1))
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_style(style: &StyleCfg) -> String {
    format!(
        "Style: {name},{font},{size},{primary},{secondary},{outline},{back},{bold},{italic},{underline},{strike},{scale_x},{scale_y},{spacing},{angle},{border_style},{outline_width},{shadow},{alignment},{margin_l},{margin_r},{margin_v},{encoding}\n",
        name = style.name,
        font = style.font_name,
        size = style.font_size,
        primary = style.primary_color,
        secondary = style.secondary_color,
        outline = style.outline_color,
        back = style.back_color,
        bold = ass_bool(style.bold),
        italic = ass_bool(style.italic),
        underline = ass_bool(style.underline),
        strike = ass_bool(style.strike_out),
        scale_x = style.scale_x,
        scale_y = style.scale_y,
        spacing = style.spacing,
        angle = style.angle,
        border_style = style.border_style,
        outline_width = style.outline,
        shadow = style.shadow,
        alignment = style.alignment,
        margin_l = style.margin_l,
        margin_r = style.margin_r,
        margin_v = style.margin_v,
        encoding = style.encoding,
    )
}

fn ass_bool(v: bool) -> i8 {
    if v { -1 } else { 0 }
}
