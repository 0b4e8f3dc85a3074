//! Resilient extraction of structured data from LM output.
//!
//! Models wrap JSON in markdown fences, prefix it with commentary, leak
//! `<think>` blocks, and emit JS-style objects. This module is the only place
//! raw completion text is interpreted; everything downstream receives
//! [`Extracted`] or a typed value.
//!
//! Extraction order:
//! 1. strip reasoning blocks and fence markers
//! 2. first well-formed JSON array (non-greedy bracket scan)
//! 3. first `{` to last `}`
//! 4. the whole cleaned text
//! 5. one repair pass (quote keys, single to double quotes, trailing
//!    commas, trim to the outermost braces), then parse again

use std::num::IntErrorKind;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid regex"));

// Text before a dangling close tag is reasoning whose open tag was cut off.
static THINK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^.*?</think>").expect("valid regex"));

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("valid regex"));

static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\[{:,]\s*)'((?:[^'\\]|\\.)*)'"#).expect("valid regex")
});

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$-]*)\s*:").expect("valid regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+|[0-9]+[.)])\s*").expect("valid regex"));

/// Names that show up in list-shaped answers but are never competitors.
const NON_NAMES: &[&str] = &["none", "n/a", "na", "unknown", "null", "competitors", "[]"];

/// Words that mark a plain-text answer as a refusal or a negative answer.
const REFUSAL_WORDS: &[&str] = &[
    "sorry", "no", "not", "cannot", "can't", "unable", "none", "found", "apologize",
];

/// Keys an object-wrapped name list is expected under.
const LIST_KEYS: &[&str] = &["competitors", "names"];

/// Result of interpreting LM text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Structured data was recovered.
    Ok(Value),
    /// Nothing parseable; the raw text is kept for logging.
    Malformed(String),
}

impl Extracted {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Interpret LM text as structured data.
pub fn classify(text: &str) -> Extracted {
    match extract(text) {
        Some(value) => Extracted::Ok(value),
        None => Extracted::Malformed(text.to_string()),
    }
}

/// Extract the first JSON value from noisy text, or `None`.
///
/// Never panics and never errors; unparseable input means "no data".
pub fn extract(text: &str) -> Option<Value> {
    let cleaned = clean(text);
    parse_candidates(&cleaned).into_iter().next()
}

/// Extract and deserialize into `T`.
///
/// Every recovered JSON value is tried in extraction order, so an object
/// response is still found when it contains an array that the array scan
/// reaches first.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = clean(text);
    parse_candidates(&cleaned)
        .into_iter()
        .find_map(|value| serde_json::from_value(value).ok())
}

/// Extract a list of names.
///
/// Accepts a JSON array of strings (or of objects with a `name` field), an
/// object wrapping such an array, and as a last resort a comma- or
/// newline-separated list in plain text.
pub fn extract_string_list(text: &str) -> Vec<String> {
    match classify(text) {
        // The array scan runs before the object span, so a wrapping object
        // with a list key takes precedence over whichever array came first.
        Extracted::Ok(Value::Array(items)) => outer_object(&clean(text))
            .as_ref()
            .and_then(keyed_list)
            .map(|keyed| names_from_array(keyed))
            .unwrap_or_else(|| names_from_array(&items)),
        Extracted::Ok(object @ Value::Object(_)) => keyed_list(&object)
            .or_else(|| object.as_object()?.values().find_map(Value::as_array))
            .map(|items| names_from_array(items))
            .unwrap_or_default(),
        Extracted::Ok(_) => Vec::new(),
        Extracted::Malformed(raw) => split_plain_list(&clean(&raw)),
    }
}

fn keyed_list(value: &Value) -> Option<&Vec<Value>> {
    let map = value.as_object()?;
    LIST_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
}

/// First non-negative integer in the text, ignoring reasoning blocks.
pub fn first_integer(text: &str) -> Option<u32> {
    let cleaned = clean(text);
    let digits = INTEGER.find(&cleaned)?.as_str();
    match digits.parse::<u32>() {
        Ok(n) => Some(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
        Err(_) => None,
    }
}

fn clean(text: &str) -> String {
    let without_think = THINK_BLOCK.replace_all(text, "");
    let without_prefix = THINK_PREFIX.replace(&without_think, "");
    FENCE.replace_all(&without_prefix, "").trim().to_string()
}

/// Every value the strict steps (2-4) and the repair step (5) recover, in order.
fn parse_candidates(cleaned: &str) -> Vec<Value> {
    let mut found = Vec::new();

    if let Some(array) = first_array(cleaned) {
        found.push(array);
    }
    if let Some(object) = outer_object(cleaned) {
        found.push(object);
    }
    if found.is_empty() {
        if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
            found.push(value);
        }
    }
    if found.is_empty() {
        if let Ok(value) = serde_json::from_str::<Value>(&repair(cleaned)) {
            found.push(value);
        }
    }

    found
}

fn first_array(text: &str) -> Option<Value> {
    let closes: Vec<usize> = text.match_indices(']').map(|(i, _)| i).collect();

    for (start, _) in text.match_indices('[') {
        for &end in closes.iter().filter(|&&end| end > start) {
            if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(value);
            }
        }
    }
    None
}

fn outer_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn repair(text: &str) -> String {
    let trimmed = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    };

    let quoted = SINGLE_QUOTED.replace_all(trimmed, "$1\"$2\"");
    let keyed = UNQUOTED_KEY.replace_all(&quoted, "$1\"$2\":");
    TRAILING_COMMA.replace_all(&keyed, "$1").into_owned()
}

fn names_from_array(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| is_plausible_name(name))
        .map(str::to_string)
        .collect()
}

/// Heuristic split for answers that are a list but not JSON.
///
/// Only list-shaped text (a comma or several lines) is split, and only when
/// every item reads like a name. Lead-in lines ending in `:` are skipped.
/// Anything else, a refusal or prose, is treated as no data.
fn split_plain_list(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .collect();
    if lines.len() < 2 && !lines.iter().any(|l| l.contains(',')) {
        return Vec::new();
    }

    let items: Vec<String> = lines
        .iter()
        .flat_map(|line| line.split(','))
        .map(|item| LIST_MARKER.replace(item.trim(), ""))
        .map(|item| {
            item.trim()
                .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '`')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect();

    if items.iter().all(|item| looks_like_name(item)) {
        items
            .into_iter()
            .filter(|item| is_plausible_name(item))
            .collect()
    } else {
        Vec::new()
    }
}

fn is_plausible_name(name: &str) -> bool {
    !name.is_empty() && !NON_NAMES.contains(&name.to_lowercase().as_str())
}

fn looks_like_name(item: &str) -> bool {
    let words: Vec<String> = item
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .collect();

    let starts_well = item.chars().next().is_some_and(char::is_alphanumeric);
    let refusal = words.iter().any(|w| REFUSAL_WORDS.contains(&w.as_str()));

    starts_well && !refusal && words.len() <= 4 && !looks_like_sentence(item)
}

/// Sentence punctuation at the end, or a full stop after a lowercase word
/// ("found.", but not "Inc.").
fn looks_like_sentence(item: &str) -> bool {
    if item.ends_with([':', '?', '!']) {
        return true;
    }
    let Some(body) = item.strip_suffix('.') else {
        return false;
    };
    body.split_whitespace()
        .last()
        .and_then(|word| word.chars().next())
        .is_some_and(char::is_lowercase)
}
