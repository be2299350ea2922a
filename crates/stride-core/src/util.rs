//! Small text helpers shared by the tracker, matcher and acceptance loop.

use crate::edit::Span;
use regex::Regex;

/// Characters that can appear inside an identifier in the supported languages.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// List separators skipped around structural elements.
pub fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';' | '|')
}

/// Byte length of the common prefix, always on a character boundary.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            break;
        }
        len += x.len_utf8();
    }
    len
}

/// Byte length of the common suffix, always on a character boundary.
pub fn common_suffix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (x, y) in a.chars().rev().zip(b.chars().rev()) {
        if x != y {
            break;
        }
        len += x.len_utf8();
    }
    len
}

/// Byte length of the identifier run that ends at `offset`.
pub fn ident_run_before(text: &str, offset: usize) -> usize {
    text[..offset]
        .chars()
        .rev()
        .take_while(|c| is_ident_char(*c))
        .map(char::len_utf8)
        .sum()
}

/// Byte length of the identifier run that starts at `offset`.
pub fn ident_run_after(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .take_while(|c| is_ident_char(*c))
        .map(char::len_utf8)
        .sum()
}

/// Pattern for `needle` where it is not glued to identifier characters.
/// Capture 1 is the needle itself.
pub fn word_pattern(needle: &str) -> Option<Regex> {
    if needle.is_empty() {
        return None;
    }
    let mut pattern = String::new();
    if needle.chars().next().is_some_and(is_ident_char) {
        pattern.push_str(r"(?:^|[^\w$])");
    }
    pattern.push('(');
    pattern.push_str(&regex::escape(needle));
    pattern.push(')');
    if needle.chars().next_back().is_some_and(is_ident_char) {
        pattern.push_str(r"(?:[^\w$]|$)");
    }
    Regex::new(&pattern).ok()
}

/// Start offsets of every occurrence `pattern` captures in `haystack`.
pub fn word_occurrences(pattern: &Regex, haystack: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut at = 0;
    // Resume after the needle, not the match: the boundary character that
    // closed one match may open the next.
    while let Some(needle) = pattern
        .captures_at(haystack, at)
        .and_then(|caps| caps.get(1))
    {
        out.push(needle.start());
        at = needle.end();
    }
    out
}

/// Collapse every whitespace run into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Narrow `span` past surrounding whitespace and list separators.
pub fn trim_separators(text: &str, span: Span) -> Span {
    let trim = |c: char| c.is_whitespace() || is_separator(c);
    let slice = &text[span.range()];
    let head_trimmed = slice.trim_start_matches(trim);
    let start = span.start + (slice.len() - head_trimmed.len());
    let both_trimmed = head_trimmed.trim_end_matches(trim);
    Span::new(start, start + both_trimmed.len())
}

/// True when `needle` (ignoring whitespace) is a prefix of `haystack`
/// (ignoring whitespace) that ends on a token boundary: `, 2` is not a
/// prefix of `, 23`. An all-whitespace needle never matches.
pub fn starts_with_ignoring_whitespace(
    haystack: impl Iterator<Item = char>,
    needle: impl Iterator<Item = char>,
) -> bool {
    let mut haystack = haystack.peekable();
    let mut last = None;
    for expected in needle.filter(|c| !c.is_whitespace()) {
        while haystack.next_if(|c| c.is_whitespace()).is_some() {}
        if haystack.next() != Some(expected) {
            return false;
        }
        last = Some(expected);
    }
    match last {
        None => false,
        Some(c) if is_ident_char(c) => !haystack.peek().is_some_and(|next| is_ident_char(*next)),
        Some(_) => true,
    }
}
