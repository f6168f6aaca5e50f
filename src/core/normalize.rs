//! Rewrites raw backend answer text into the markdown dialect the renderer
//! understands.
//!
//! The backend emits citations as `[D1]`, `[Q2]` or `{{3}}`, leaves code
//! fences untagged, and mixes LaTeX delimiters with currency amounts. Every
//! transform here is pure and the composition is idempotent, so the same
//! text can be normalized again on each streaming update.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::thinking::remove_thinking_tokens;

pub const DEFAULT_FENCE_LANGUAGE: &str = "plaintext";

static FENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{3,}").expect("Invalid fence regex"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("Invalid inline code regex"));

static TAGGED_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([QD])(\d+)\]").expect("Invalid citation regex"));

static BRACED_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\d+)\}\}").expect("Invalid citation regex"));

static DISPLAY_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").expect("Invalid display math regex"));

static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").expect("Invalid inline math regex"));

/// Full normalization pipeline for answer text.
pub fn normalize(raw: &str) -> String {
    let text = remove_thinking_tokens(raw);
    let text = tag_bare_fences(&text);
    let text = map_outside_code(&text, preprocess_math);
    let text = rewrite_citations(&text);
    map_outside_code(&text, close_orphan_brackets)
}

/// What the answer view shows for `raw` given whether the backend has
/// finished the message.
pub fn display_text(raw: &str, is_complete: bool) -> String {
    if is_complete {
        normalize(raw)
    } else {
        let answer = remove_thinking_tokens(raw);
        normalize(trim_incomplete_code_section(&answer))
    }
}

/// Holds back a tagged code block whose closing fence has not arrived yet.
///
/// Only applies when the fence starts more than three characters in; a
/// message that is nothing but a code block keeps showing it.
pub fn trim_incomplete_code_section(text: &str) -> &str {
    let markers = fence_markers(text);
    if markers.len() % 2 == 0 {
        return text;
    }
    let Some(last) = markers.last() else {
        return text;
    };

    let tagged = text[last.end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    if tagged && last.start > 3 {
        text[..last.start].trim_end()
    } else {
        text
    }
}

/// Byte ranges of every run of three or more backticks.
fn fence_markers(text: &str) -> Vec<Range<usize>> {
    FENCE_MARKER.find_iter(text).map(|m| m.range()).collect()
}

/// Gives every opening fence without a language the `plaintext` tag.
pub fn tag_bare_fences(text: &str) -> Cow<'_, str> {
    let openings: Vec<usize> = fence_markers(text)
        .into_iter()
        .step_by(2)
        .map(|marker| marker.end)
        .filter(|&end| !text[end..].starts_with(|c: char| c.is_alphanumeric() || c == '_'))
        .collect();
    if openings.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut tagged = String::with_capacity(text.len() + openings.len() * DEFAULT_FENCE_LANGUAGE.len());
    let mut cursor = 0;
    for end in openings {
        tagged.push_str(&text[cursor..end]);
        tagged.push_str(DEFAULT_FENCE_LANGUAGE);
        cursor = end;
    }
    tagged.push_str(&text[cursor..]);
    Cow::Owned(tagged)
}

/// `[Q03]` becomes `[[Q3]]()`, `{{7}}` becomes `[[7]]()`. Markers that are
/// already wrapped in a second pair of brackets, or escaped with a
/// backslash, are left alone.
pub fn rewrite_citations(text: &str) -> String {
    let tagged = TAGGED_CITATION.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let wrapped =
            text[..whole.start].ends_with('[') && text[whole.end..].starts_with(']');
        let escaped = text[..whole.start].ends_with('\\');
        match caps[2].parse::<u32>() {
            Ok(number) if !wrapped && !escaped => format!("[[{}{number}]]()", &caps[1]),
            _ => caps[0].to_string(),
        }
    });

    BRACED_CITATION
        .replace_all(&tagged, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let escaped = tagged[..start].ends_with('\\');
            match caps[1].parse::<u32>() {
                Ok(number) if !escaped => format!("[[{number}]]()"),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Appends an empty link target to every `]]` that lacks one.
pub fn close_orphan_brackets(text: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut cursor = 0;
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("]]") {
        let end = search_from + offset + 2;
        if !text[end..].starts_with('(') {
            out.push_str(&text[cursor..end]);
            out.push_str("()");
            cursor = end;
        }
        search_from = end;
    }

    if cursor == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// Converts `\[..\]` and `\(..\)` to dollar delimiters and escapes dollar
/// signs that read as currency.
///
/// Conversion repeats until no delimiter pair is left, so nested pairs such
/// as `\(\(x\)\)` end up fully converted in a single call.
pub fn preprocess_math(text: &str) -> Cow<'_, str> {
    let mut converted = Cow::Borrowed(text);
    while let Some(next) = convert_math_delimiters(&converted) {
        converted = Cow::Owned(next);
    }
    if let Cow::Owned(escaped) = escape_currency(&converted) {
        return Cow::Owned(escaped);
    }
    converted
}

/// One round of delimiter conversion, `None` when nothing matched.
fn convert_math_delimiters(text: &str) -> Option<String> {
    let display = DISPLAY_MATH.replace_all(text, |caps: &Captures<'_>| format!("$${}$$", &caps[1]));
    let inline = INLINE_MATH.replace_all(&display, |caps: &Captures<'_>| format!("${}$", &caps[1]));
    if matches!(display, Cow::Borrowed(_)) && matches!(inline, Cow::Borrowed(_)) {
        None
    } else {
        Some(inline.into_owned())
    }
}

/// `$` followed by a digit is currency unless it is already escaped, follows
/// another `$`, or opens inline math closed later on the same line.
fn escape_currency(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut cursor = 0;

    for (idx, _) in text.match_indices('$') {
        let followed_by_digit = bytes.get(idx + 1).is_some_and(u8::is_ascii_digit);
        if !followed_by_digit {
            continue;
        }
        let after_escape_or_dollar = idx > 0 && matches!(bytes[idx - 1], b'\\' | b'$');
        if after_escape_or_dollar || has_math_closer(text, idx + 1) {
            continue;
        }
        out.push_str(&text[cursor..idx]);
        out.push('\\');
        cursor = idx;
    }

    if cursor == 0 && out.is_empty() {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// A closing `$` on the same line with non-space before it and no digit
/// after it.
fn has_math_closer(text: &str, from: usize) -> bool {
    let line_end = text[from..].find('\n').map_or(text.len(), |i| from + i);
    let bytes = text.as_bytes();
    text[from..line_end].match_indices('$').any(|(offset, _)| {
        let idx = from + offset;
        let before = bytes[idx - 1];
        let after_is_digit = bytes.get(idx + 1).is_some_and(u8::is_ascii_digit);
        !before.is_ascii_whitespace() && before != b'\\' && !after_is_digit
    })
}

/// Byte ranges that math and bracket rewriting must not touch: closed fenced
/// blocks, the opening marker of an unterminated block, and inline code.
fn protected_ranges(text: &str) -> Vec<Range<usize>> {
    let markers = fence_markers(text);
    let mut blocks: Vec<Range<usize>> = markers
        .chunks(2)
        .map(|pair| pair[0].start..pair[pair.len() - 1].end)
        .collect();

    let mut ranges = Vec::with_capacity(blocks.len());
    let mut gap_start = 0;
    blocks.push(text.len()..text.len());
    for block in blocks {
        ranges.extend(
            INLINE_CODE
                .find_iter(&text[gap_start..block.start])
                .map(|m| gap_start + m.start()..gap_start + m.end()),
        );
        if !block.is_empty() {
            gap_start = block.end;
            ranges.push(block);
        }
    }
    ranges
}

fn map_outside_code<'a, F>(text: &'a str, transform: F) -> String
where
    F: for<'s> Fn(&'s str) -> Cow<'s, str>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in protected_ranges(text) {
        out.push_str(&transform(&text[cursor..range.start]));
        out.push_str(&text[range.clone()]);
        cursor = range.end;
    }
    out.push_str(&transform(&text[cursor..]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_and_document_markers_become_placeholders() {
        assert_eq!(normalize("See [Q3] and [D01]."), "See [[Q3]]() and [[D1]]().");
        assert_eq!(normalize("Source {{007}}"), "Source [[7]]()");
    }

    #[test]
    fn wrapped_markers_are_not_wrapped_twice() {
        assert_eq!(normalize("[[Q3]]() and [[D2]]"), "[[Q3]]() and [[D2]]()");
    }

    #[test]
    fn orphan_double_brackets_gain_empty_target() {
        assert_eq!(normalize("x]] y]](z)"), "x]]() y]](z)");
        assert_eq!(close_orphan_brackets("]]]"), "]]()]");
    }

    #[test]
    fn bare_fences_are_tagged_plaintext() {
        let text = "```\nlet x = 1;\n```\n\n```rust\nfn f() {}\n```";
        assert_eq!(
            normalize(text),
            "```plaintext\nlet x = 1;\n```\n\n```rust\nfn f() {}\n```"
        );
    }

    #[test]
    fn incomplete_tagged_fence_is_held_back() {
        let text = "Here is the code:\n\n```python\nprint(1)";
        assert_eq!(trim_incomplete_code_section(text), "Here is the code:");
        assert_eq!(display_text(text, false), "Here is the code:");
        assert_eq!(
            display_text(text, true),
            "Here is the code:\n\n```python\nprint(1)"
        );
    }

    #[test]
    fn leading_or_untagged_incomplete_fence_is_kept() {
        assert_eq!(trim_incomplete_code_section("```py\nx"), "```py\nx");
        assert_eq!(
            trim_incomplete_code_section("Intro\n```\nx"),
            "Intro\n```\nx"
        );
        assert_eq!(
            trim_incomplete_code_section("Intro\n```py\nx\n```"),
            "Intro\n```py\nx\n```"
        );
    }

    #[test]
    fn latex_delimiters_become_dollars() {
        assert_eq!(
            normalize(r"Area \(\pi r^2\) and \[E = mc^2\]"),
            "Area $\\pi r^2$ and $$E = mc^2$$"
        );
    }

    #[test]
    fn currency_is_escaped_but_math_is_not() {
        assert_eq!(normalize("It costs $5 or $10."), r"It costs \$5 or \$10.");
        assert_eq!(normalize("Solve $2x = 4$ now"), "Solve $2x = 4$ now");
        assert_eq!(normalize(r"Already \$5"), r"Already \$5");
    }

    #[test]
    fn closed_code_is_not_touched_by_math_or_brackets() {
        let text = "Use `$5` and\n```rust\nlet a = b[c[0]];\nlet s = \"$1\";\n```\n$5";
        assert_eq!(
            normalize(text),
            "Use `$5` and\n```rust\nlet a = b[c[0]];\nlet s = \"$1\";\n```\n\\$5"
        );
    }

    #[test]
    fn unterminated_tail_is_math_processed() {
        let text = "Intro\n```bash\necho $5";
        assert_eq!(normalize(text), "Intro\n```bash\necho \\$5");
    }

    #[test]
    fn fence_inside_closed_thinking_does_not_hide_the_answer() {
        let text = "<think>try ```python\nx</think>The answer is 42.";
        assert_eq!(display_text(text, false), "The answer is 42.");
        assert_eq!(display_text(text, true), "The answer is 42.");
    }

    #[test]
    fn citation_right_after_display_math_opener() {
        assert_eq!(normalize(r"\[Q3]\]"), "$$Q3]$$");
        assert_eq!(normalize(r"\[Q3] no closer"), r"\[Q3] no closer");
        assert_eq!(normalize(r"\{{3}} x"), r"\{{3}} x");
    }

    #[test]
    fn nested_math_delimiters_convert_in_one_pass() {
        assert_eq!(preprocess_math(r"\(\(\)5\]é\)"), "$$$5\\]é$");
    }

    #[test]
    fn thinking_is_stripped_before_rewriting() {
        assert_eq!(
            normalize("<think>check [D1]</think>\nAnswer [D2]"),
            "Answer [[D2]]()"
        );
    }

    #[test]
    fn oversized_numbers_are_left_alone() {
        let text = "[D99999999999]";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "See [Q3], [D01] and {{2}} for details]]",
            "```\ncode [D1]\n```\nPrice $5, math \\(2 \\) and $x$ ]]]",
            r"\[a\]] tail {{1}}",
            "<thinking>half",
            "Intro\n```py\nprint('$3')",
            "$$5 and \\$4 and `]]` inline",
            r"\[Q3]\]",
            r"\(\(\)5\]é\)",
            r"\[D1] then \[x\] and \(Q2\)[Q2]",
            r"\{{3}} x \]",
            r"\(a\(b\)c\) costs $5",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
