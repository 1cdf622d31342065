//! Tolerant JSON extraction from model output
//!
//! Models are asked for JSON but answer with prose, markdown fences, trailing
//! commentary, or nothing usable at all. [`try_parse`] runs an ordered list of
//! strategies over the text and returns the first value any of them recovers:
//!
//! 1. `direct` - the whole text is JSON
//! 2. `fenced` - the interior of a ```` ``` ```` block (`json`-tagged blocks first)
//! 3. `bracket_scan` - from the first `{` or `[`, the longest prefix that parses
//!
//! Extraction is total: it never fails, it only finds nothing.

use serde_json::Value;
use tracing::trace;

/// Markdown code fence delimiter
const FENCE: &str = "```";

/// Inputs longer than this skip the quadratic bracket scan
pub const MAX_SCAN_LEN: usize = 64 * 1024;

/// Which strategy recovered a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    Direct,
    Fenced,
    BracketScan,
}

impl ExtractStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fenced => "fenced",
            Self::BracketScan => "bracket_scan",
        }
    }
}

type Strategy = fn(&str) -> Option<Value>;

/// Strategies in precedence order
const STRATEGIES: [(ExtractStrategy, Strategy); 3] = [
    (ExtractStrategy::Direct, parse_direct),
    (ExtractStrategy::Fenced, parse_fenced),
    (ExtractStrategy::BracketScan, parse_bracket_scan),
];

/// Recover a JSON value embedded in `text`, if there is one
pub fn try_parse(text: &str) -> Option<Value> {
    extract(text).map(|(value, _)| value)
}

/// Like [`try_parse`], also reporting which strategy succeeded
pub fn extract(text: &str) -> Option<(Value, ExtractStrategy)> {
    if text.trim().is_empty() {
        return None;
    }

    STRATEGIES.iter().find_map(|(name, strategy)| {
        let value = strategy(text)?;
        trace!(strategy = name.as_str(), "Recovered JSON from model output");
        Some((value, *name))
    })
}

/// Parse a candidate; a bare `null` counts as nothing
fn parse_json(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate.trim())
        .ok()
        .filter(|value| !value.is_null())
}

fn parse_direct(text: &str) -> Option<Value> {
    parse_json(text)
}

fn parse_fenced(text: &str) -> Option<Value> {
    let blocks = fenced_blocks(text);
    blocks
        .iter()
        .filter(|block| block.is_json())
        .chain(blocks.iter().filter(|block| !block.is_json()))
        .find_map(|block| parse_json(block.body))
}

fn parse_bracket_scan(text: &str) -> Option<Value> {
    if text.len() > MAX_SCAN_LEN {
        return None;
    }

    let start = text.find(['{', '['])?;
    let span = &text[start..];

    // Only a prefix ending in a closing bracket can parse as an object or
    // array, so every other end position is skipped.
    span.char_indices()
        .rev()
        .filter(|(_, c)| matches!(c, '}' | ']'))
        .find_map(|(i, _)| parse_json(&span[..=i]))
}

/// A fenced block: optional language tag and raw interior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FencedBlock<'a> {
    tag: &'a str,
    body: &'a str,
}

impl FencedBlock<'_> {
    fn is_json(&self) -> bool {
        self.tag.eq_ignore_ascii_case("json")
    }
}

/// All closed fenced blocks, in order of appearance
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let (tag, body_start) = split_tag(&rest[open + FENCE.len()..]);
        let Some(close) = body_start.find(FENCE) else {
            break;
        };
        blocks.push(FencedBlock {
            tag,
            body: &body_start[..close],
        });
        rest = &body_start[close + FENCE.len()..];
    }

    blocks
}

/// Split a language tag off the text following an opening fence
///
/// The tag is consumed when it ends its line (```` ```json\n ````) or when it
/// runs straight into a JSON opener (```` ```json{ ````).
fn split_tag(after_fence: &str) -> (&str, &str) {
    let tag_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(after_fence.len());
    let (tag, rest) = after_fence.split_at(tag_len);

    let line_rest = rest.trim_start_matches([' ', '\t', '\r']);
    if let Some(body) = line_rest.strip_prefix('\n') {
        return (tag, body);
    }
    if !tag.is_empty() && rest.starts_with(['{', '[']) {
        return (tag, rest);
    }
    ("", after_fence)
}
