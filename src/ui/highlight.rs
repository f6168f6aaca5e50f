//! Syntax highlighting for fenced code blocks, with a small FIFO cache so
//! re-rendering a streaming answer does not re-highlight unchanged blocks.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, Mutex, OnceLock, PoisonError};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::ui::theme::Theme;

const CACHE_CAPACITY: usize = 64;

type CacheKey = (String, u64);

struct BlockCache {
    map: HashMap<CacheKey, Vec<Line<'static>>>,
    order: VecDeque<CacheKey>,
    cap: usize,
}

impl BlockCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Vec<Line<'static>>> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, lines: Vec<Line<'static>>) {
        if !self.map.contains_key(&key) {
            self.order.push_back(key.clone());
        }
        self.map.insert(key, lines);
        while self.map.len() > self.cap {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

static BLOCK_CACHE: LazyLock<Mutex<BlockCache>> =
    LazyLock::new(|| Mutex::new(BlockCache::new(CACHE_CAPACITY)));

fn hash_block(lang: &str, code: &str, theme_name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_name.hash(&mut hasher);
    hasher.finish()
}

/// Maps common aliases to the token syntect knows. `plaintext` (the tag the
/// normalizer gives untagged fences) maps to an empty hint.
pub fn normalize_lang_hint(hint: &str) -> String {
    let lower = hint.trim().to_ascii_lowercase();
    match lower.as_str() {
        "plaintext" | "text" | "txt" | "plain" => String::new(),
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

pub fn syntect_theme_name(theme: &Theme) -> &'static str {
    if theme.is_dark() {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

/// Highlights `code`. Returns `None` for plain text, unknown languages, or
/// when highlighting fails, so callers fall back to unstyled lines.
pub fn highlight_code_block(lang_hint: &str, code: &str, theme: &Theme) -> Option<Vec<Line<'static>>> {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

    let lang = normalize_lang_hint(lang_hint);
    if lang.is_empty() {
        return None;
    }

    let syntaxes = SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines);
    let syntax = syntaxes.find_syntax_by_token(&lang)?;
    let themes = THEME_SET.get_or_init(ThemeSet::load_defaults);
    let theme_name = syntect_theme_name(theme);
    let syn_theme = themes
        .themes
        .get(theme_name)
        .or_else(|| themes.themes.get("base16-ocean.dark"))?;

    let key = (lang.clone(), hash_block(&lang, code, theme.name));
    if let Some(lines) = BLOCK_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Some(lines);
    }

    let mut highlighter = HighlightLines::new(syntax, syn_theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, syntaxes).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, fragment)| {
                let fg = style.foreground;
                let mut span_style = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
                if let Some(bg) = theme.codeblock_bg {
                    span_style = span_style.bg(bg);
                }
                Span::styled(fragment.trim_end_matches('\n').to_string(), span_style)
            })
            .collect();
        out.push(Line::from(spans));
    }

    BLOCK_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .put(key, out.clone());
    Some(out)
}
