//! Keyword emphasis with awareness of inflected word endings.
//!
//! A keyword matches case-insensitively anywhere in the text, together with
//! up to `max_suffix_len` letters that follow it (`marketing` also covers
//! `marketingowy`). Only the stem plus that ending is emphasised, so a longer
//! word keeps its remaining letters outside the markers. Code, existing bold
//! text, link targets and URLs are never touched.

use std::ops::Range;

use folio_kernel::settings::BoldMode;
use once_cell::sync::Lazy;
use regex::Regex;

use super::headings::is_fence;

static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`+[^`\n]*`+").unwrap());
static RE_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*[^\n]*?\*\*|__[^\n]*?__").unwrap());
static RE_LINK_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\([^)\n]*\)").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:https?://|www\.)[^\s)>\]]+").unwrap());
static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    keyword: usize,
}

/// Wrap keyword occurrences in `**`. Blank keywords are ignored.
pub fn apply_bold_keywords(
    content: &str,
    keywords: &[String],
    mode: BoldMode,
    max_suffix_len: usize,
) -> String {
    let patterns: Vec<Regex> = keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .filter_map(|keyword| match keyword_pattern(keyword, max_suffix_len) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!(keyword, error = %err, "skipping keyword that does not compile");
                None
            }
        })
        .collect();
    if patterns.is_empty() {
        return content.to_string();
    }

    let protected = protected_ranges(content);
    let paragraphs = paragraph_starts(content);

    let mut candidates = Vec::new();
    for (keyword, pattern) in patterns.iter().enumerate() {
        let mut seen_paragraphs = Vec::new();
        for found in pattern.find_iter(content) {
            let range = found.range();
            if protected.iter().any(|p| p.start < range.end && range.start < p.end) {
                continue;
            }
            if mode == BoldMode::FirstPerParagraph {
                let paragraph = paragraphs.partition_point(|&start| start <= range.start);
                if seen_paragraphs.contains(&paragraph) {
                    continue;
                }
                seen_paragraphs.push(paragraph);
            }
            candidates.push(Candidate {
                start: range.start,
                end: range.end,
                keyword,
            });
        }
    }

    let selected = resolve_overlaps(candidates);
    tracing::debug!(
        keywords = patterns.len(),
        occurrences = selected.len(),
        "bolded keywords"
    );

    let mut output = String::with_capacity(content.len() + selected.len() * 4);
    let mut cursor = 0;
    for candidate in selected {
        output.push_str(&content[cursor..candidate.start]);
        output.push_str("**");
        output.push_str(&content[candidate.start..candidate.end]);
        output.push_str("**");
        cursor = candidate.end;
    }
    output.push_str(&content[cursor..]);
    output
}

fn keyword_pattern(keyword: &str, max_suffix_len: usize) -> Result<Regex, regex::Error> {
    let ends_with_letter = keyword.chars().last().is_some_and(char::is_alphabetic);

    let mut pattern = format!("(?i){}", regex::escape(keyword));
    if ends_with_letter {
        pattern.push_str(&format!(r"\p{{L}}{{0,{max_suffix_len}}}"));
    }
    Regex::new(&pattern)
}

/// Byte ranges that must not be emphasised.
fn protected_ranges(content: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();

    let mut offset = 0;
    let mut fence_start = None;
    for line in content.split_inclusive('\n') {
        if is_fence(line) {
            match fence_start.take() {
                Some(start) => ranges.push(start..offset + line.len()),
                None => fence_start = Some(offset),
            }
        }
        offset += line.len();
    }
    if let Some(start) = fence_start {
        ranges.push(start..content.len());
    }

    for pattern in [&*RE_INLINE_CODE, &*RE_BOLD, &*RE_LINK_TARGET, &*RE_URL] {
        ranges.extend(pattern.find_iter(content).map(|found| found.range()));
    }
    ranges
}

/// Byte offsets where paragraphs after the first begin.
fn paragraph_starts(content: &str) -> Vec<usize> {
    RE_PARAGRAPH_BREAK
        .find_iter(content)
        .map(|found| found.end())
        .collect()
}

/// Earliest start wins; on equal starts the longest match wins.
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.keyword.cmp(&b.keyword))
    });

    let mut selected: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if selected.last().map_or(true, |last| candidate.start >= last.end) {
            selected.push(candidate);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(content: &str, keywords: &[&str]) -> String {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        apply_bold_keywords(content, &keywords, BoldMode::All, 6)
    }

    #[test]
    fn bolds_every_occurrence_with_endings() {
        assert_eq!(
            bold("Notion pomaga. W notionie i NOTIONEM też.", &["notion"]),
            "**Notion** pomaga. W **notionie** i **NOTIONEM** też."
        );
    }

    #[test]
    fn ending_is_capped_at_the_suffix_limit() {
        assert_eq!(bold("planowanie", &["plan"]), "**planowanie**");
        assert_eq!(bold("planowaniem", &["plan"]), "**planowanie**m");
        assert_eq!(bold("zarządzanie czasem", &["zarząd"]), "**zarządzanie** czasem");
    }

    #[test]
    fn matches_inside_longer_words() {
        assert_eq!(bold("samoplan", &["plan"]), "samo**plan**");

        let output = bold("planowaniem i samoplan", &["plan"]);
        assert_eq!(output, "**planowanie**m i samo**plan**");
        assert_eq!(output.matches("**").count(), 4);
    }

    #[test]
    fn leaves_code_links_urls_and_bold_alone() {
        let input = "`seo` i [poradnik seo](https://fotz.pl/seo) oraz https://seo.pl, **seo** ale seo\n```\nseo\n```";
        let expected = "`seo` i [poradnik **seo**](https://fotz.pl/seo) oraz https://seo.pl, **seo** ale **seo**\n```\nseo\n```";
        assert_eq!(bold(input, &["seo"]), expected);
    }

    #[test]
    fn longest_match_wins_on_overlap() {
        assert_eq!(
            bold(
                "marketing internetowy to marketing",
                &["marketing", "marketing internetowy"]
            ),
            "**marketing internetowy** to **marketing**"
        );
    }

    #[test]
    fn first_per_paragraph_mode() {
        let keywords = vec!["lista".to_string()];
        let output = apply_bold_keywords(
            "lista i lista\n\nznowu lista, lista",
            &keywords,
            BoldMode::FirstPerParagraph,
            6,
        );
        assert_eq!(output, "**lista** i lista\n\nznowu **lista**, lista");
    }

    #[test]
    fn bolding_is_idempotent() {
        let once = bold("Excel i excelu, tabela w Excelu", &["excel", "tabela"]);
        assert_eq!(bold(&once, &["excel", "tabela"]), once);
    }

    #[test]
    fn blank_and_symbol_keywords() {
        assert_eq!(bold("nic tu nie ma", &["  ", ""]), "nic tu nie ma");
        assert_eq!(bold("używam C++ codziennie", &["c++"]), "używam **C++** codziennie");
    }
}
