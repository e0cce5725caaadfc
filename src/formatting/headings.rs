//! ATX heading normalisation and Polish sentence case.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})(.*)$").unwrap());
static RE_CLOSING_HASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s+)#+\s*$").unwrap());

/// Normalise heading markers outside fenced code; levels 2-4 also get
/// sentence case with `proper_nouns` keeping their canonical spelling.
pub fn standardize_headings(content: &str, proper_nouns: &[String]) -> String {
    let mut in_fence = false;
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            if is_fence(line) {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                return line.to_string();
            }
            standardize_line(line, proper_nouns).unwrap_or_else(|| line.to_string())
        })
        .collect();
    lines.join("\n")
}

pub(crate) fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn standardize_line(line: &str, proper_nouns: &[String]) -> Option<String> {
    let caps = RE_HEADING.captures(line)?;
    let marker = caps.get(1)?.as_str();
    let rest = caps.get(2)?.as_str();
    let level = marker.len();

    // `#tag` is left alone; `##Title` is treated as a heading missing its space.
    let spaced = rest.is_empty() || rest.starts_with(char::is_whitespace);
    if rest.starts_with('#') || (!spaced && level < 2) {
        return None;
    }

    let title = RE_CLOSING_HASHES.replace(rest, "");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return Some(marker.to_string());
    }

    let title = if (2..=4).contains(&level) {
        sentence_case(&title, proper_nouns)
    } else {
        title
    };
    Some(format!("{marker} {title}"))
}

/// First word capitalised, the rest lowercased, except proper nouns and
/// all-caps acronyms (the latter only when the title is not shouted).
pub fn sentence_case(title: &str, proper_nouns: &[String]) -> String {
    let shouted = !title.chars().any(char::is_lowercase);
    let mut capitalised = false;

    title
        .split_whitespace()
        .map(|word| {
            let Some(start) = word.find(char::is_alphanumeric) else {
                return word.to_string();
            };
            let end = word
                .char_indices()
                .filter(|(_, c)| c.is_alphanumeric())
                .last()
                .map(|(index, c)| index + c.len_utf8())
                .unwrap_or(word.len());
            let (lead, core, trail) = (&word[..start], &word[start..end], &word[end..]);

            let has_letters = core.chars().any(char::is_alphabetic);
            let first = has_letters && !capitalised;
            if has_letters {
                capitalised = true;
            }

            let cased = if let Some(noun) = proper_noun(core, proper_nouns) {
                noun.to_string()
            } else if !shouted && is_acronym(core) {
                core.to_string()
            } else if first {
                capitalise(core)
            } else {
                core.to_lowercase()
            };
            format!("{lead}{cased}{trail}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn proper_noun<'a>(word: &str, proper_nouns: &'a [String]) -> Option<&'a str> {
    let lower = word.to_lowercase();
    proper_nouns
        .iter()
        .find(|noun| noun.to_lowercase() == lower)
        .map(String::as_str)
}

fn is_acronym(word: &str) -> bool {
    word.chars().filter(|c| c.is_alphabetic()).count() >= 2 && !word.chars().any(char::is_lowercase)
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
