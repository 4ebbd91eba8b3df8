//! Syntax highlighting for the markup editor.
//!
//! Tokenizing is delegated to syntect's bundled XML grammar; this module only
//! picks a theme that suits the terminal background and flattens the result
//! into per-line colored spans.

use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// RGB foreground color of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A run of text with one foreground color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    pub fg: Option<SpanColor>,
}

/// Terminal background the highlight theme is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

/// Highlight markup source, one span list per source line.
///
/// Line endings are stripped from the returned spans.
pub fn highlight_markup(code: &str) -> Vec<Vec<HighlightSpan>> {
    let syntax_set = syntax_set();
    let Some(syntax) = markup_syntax(syntax_set) else {
        return code
            .lines()
            .map(|line| {
                vec![HighlightSpan {
                    text: line.to_string(),
                    fg: None,
                }]
            })
            .collect();
    };

    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter
            .highlight_line(line, syntax_set)
            .unwrap_or_default();
        let spans = ranges
            .into_iter()
            .filter_map(|(style, text)| {
                let text = text.trim_end_matches(['\n', '\r']);
                if text.is_empty() {
                    return None;
                }
                let fg = SpanColor {
                    r: style.foreground.r,
                    g: style.foreground.g,
                    b: style.foreground.b,
                };
                Some(HighlightSpan {
                    text: text.to_string(),
                    fg: Some(adjust_fg_for_background(fg, mode)),
                })
            })
            .collect();
        lines.push(spans);
    }
    lines
}

pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    let mut guard = lock.lock().expect("highlight background lock");
    *guard = mode;
}

fn markup_syntax(syntax_set: &SyntaxSet) -> Option<&SyntaxReference> {
    syntax_set
        .find_syntax_by_extension("svg")
        .or_else(|| syntax_set.find_syntax_by_extension("xml"))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            HighlightBackground::Dark => {
                ["base16-ocean.dark", "base16-eighties.dark", "Solarized (dark)"].as_slice()
            }
            HighlightBackground::Light => {
                ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice()
            }
        };

        preferred
            .iter()
            .find_map(|name| theme_set.themes.get(*name))
            .or_else(|| theme_set.themes.values().next())
            .cloned()
            .unwrap_or_default()
    })
}

fn background_mode() -> HighlightBackground {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock()
        && let Some(mode) = *guard
    {
        return mode;
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> HighlightBackground {
    let Some(value) = colorfgbg else {
        return HighlightBackground::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    match bg_str.parse::<u8>() {
        Ok(bg) if bg >= 7 => HighlightBackground::Light,
        _ => HighlightBackground::Dark,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: SpanColor, mode: HighlightBackground) -> SpanColor {
    if mode == HighlightBackground::Dark {
        return color;
    }
    let luma = 0.0722f32.mul_add(
        f32::from(color.b),
        0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
    );
    if luma < 155.0 {
        return color;
    }
    let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
    SpanColor {
        r: darken(color.r),
        g: darken(color.g),
        b: darken(color.b),
    }
}
