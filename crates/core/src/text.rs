//! Text normalisation and case folding.

/// Normalises document text before it is stored.
///
/// Trims surrounding whitespace, turns every `\r` into `\n` and collapses runs of newlines
/// into a single newline. Lines containing only spaces are not blank for this purpose and are
/// kept.
pub fn normalize_text(input: &str) -> String {
    let converted = input.trim().replace('\r', "\n");
    let mut normalized = String::with_capacity(converted.len());
    let mut previous_newline = false;

    for ch in converted.chars() {
        let is_newline = ch == '\n';
        if is_newline && previous_newline {
            continue;
        }
        previous_newline = is_newline;
        normalized.push(ch);
    }

    normalized
}

/// Folds text for case-insensitive substring search.
///
/// Unicode-aware, unlike SQLite's built-in `LIKE`/`lower()`, which only fold ASCII.
pub fn fold_case(input: &str) -> String {
    input.to_lowercase()
}

/// Number of characters (Unicode scalar values) in `text`. Annotation spans count these.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns the characters `[start, end)` of `text`, or `None` when the range is out of bounds.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }

    let mut boundaries = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()));
    let start_byte = boundaries.nth(start)?;
    let end_byte = if end == start {
        start_byte
    } else {
        boundaries.nth(end - start - 1)?
    };

    Some(&text[start_byte..end_byte])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_crlf_blank_lines() {
        assert_eq!(normalize_text("Line1\r\n\r\n\r\nLine2"), "Line1\nLine2");
    }

    #[test]
    fn test_normalize_trims_and_converts_lone_cr() {
        assert_eq!(normalize_text("  \n Статья 1\rСтатья 2 \n\n"), "Статья 1\nСтатья 2");
    }

    #[test]
    fn test_normalize_keeps_whitespace_only_lines() {
        assert_eq!(normalize_text("a\n \nb"), "a\n \nb");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("x\r\r\ny\n\n\nz");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_fold_case_handles_cyrillic() {
        assert_eq!(fold_case("ЗАКОН О Защите"), "закон о защите");
    }

    #[test]
    fn test_char_slice_uses_character_offsets() {
        let text = "право и долг";
        assert_eq!(char_slice(text, 0, 5), Some("право"));
        assert_eq!(char_slice(text, 8, 12), Some("долг"));
        assert_eq!(char_slice(text, 12, 12), Some(""));
        assert_eq!(char_slice(text, 8, 13), None);
        assert_eq!(char_slice(text, 3, 2), None);
    }

    #[test]
    fn test_char_len_counts_characters_not_bytes() {
        assert_eq!(char_len("долг"), 4);
    }
}
