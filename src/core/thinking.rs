//! Model "thinking" blocks embedded in answer text.
//!
//! Reasoning models wrap their scratch work in `<think>` or `<thinking>`
//! tags. The answer view shows that text separately and strips it from the
//! answer itself.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static COMPLETED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>(.*?)</think>|<thinking>(.*?)</thinking>")
        .expect("Invalid thinking block regex")
});

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<think(?:ing)?>").expect("Invalid thinking tag regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingSummary {
    pub content: String,
    pub complete: bool,
}

pub fn has_completed(text: &str) -> bool {
    COMPLETED_BLOCK.is_match(text)
}

/// True when an opening tag has no matching close after it.
pub fn has_partial(text: &str) -> bool {
    trailing_open_tag(text).is_some()
}

pub fn has_thinking(text: &str) -> bool {
    has_completed(text) || has_partial(text)
}

/// The first thinking block, or the unterminated trailing one while it is
/// still being written.
pub fn extract(text: &str) -> Option<ThinkingSummary> {
    if let Some(caps) = COMPLETED_BLOCK.captures(text) {
        let inner = caps.get(1).or_else(|| caps.get(2))?;
        return Some(ThinkingSummary {
            content: inner.as_str().trim().to_string(),
            complete: true,
        });
    }

    trailing_open_tag(text).map(|(_, body_start)| ThinkingSummary {
        content: text[body_start..].trim().to_string(),
        complete: false,
    })
}

/// Strips every thinking block from `text`. Text without thinking tags is
/// returned as is.
pub fn remove_thinking_tokens(text: &str) -> Cow<'_, str> {
    if !has_thinking(text) {
        return Cow::Borrowed(text);
    }

    let mut stripped = COMPLETED_BLOCK.replace_all(text, "").into_owned();
    if let Some((tag_start, _)) = trailing_open_tag(&stripped) {
        stripped.truncate(tag_start);
    }
    Cow::Owned(stripped.trim().to_string())
}

/// Byte offsets of an opening tag that is never closed, and of the text
/// following it.
fn trailing_open_tag(text: &str) -> Option<(usize, usize)> {
    let rest_start = COMPLETED_BLOCK
        .find_iter(text)
        .last()
        .map_or(0, |block| block.end());
    OPEN_TAG
        .find(&text[rest_start..])
        .map(|tag| (rest_start + tag.start(), rest_start + tag.end()))
}
