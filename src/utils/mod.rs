//! Small helpers shared by the ebook module and the CLI.

/// File name stem derived from a document title.
///
/// Keeps letters, digits, `_`, `-` and whitespace, turns whitespace into `_`
/// and falls back to `ebook` when nothing is left.
pub fn safe_file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();

    if stem.chars().all(|c| c == '_') {
        "ebook".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_joins_words() {
        assert_eq!(safe_file_stem("Organizacja pracy: 2024!"), "Organizacja_pracy_2024");
        assert_eq!(safe_file_stem("Zażółć gęślą-jaźń"), "Zażółć_gęślą-jaźń");
    }

    #[test]
    fn falls_back_when_nothing_remains() {
        assert_eq!(safe_file_stem("?!"), "ebook");
        assert_eq!(safe_file_stem("   "), "ebook");
        assert_eq!(safe_file_stem(""), "ebook");
    }
}
