//! Text splitting, merging and offset utilities used by chunking strategies.
//!
//! Every length and offset here counts `char`s, not bytes.

/// Recursive separators, most structural first. The trailing empty separator
/// splits into single characters and always satisfies any positive limit.
pub(crate) const SEPARATORS: &[&str] = &[
    "\n\n\n", "\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " ", "",
];

/// How far the fixed strategy looks back from a window end for a boundary.
pub(crate) const BOUNDARY_LOOKBACK: usize = 50;

/// Approximate token count: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    char_len(text) / 4
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Character offset of the first leading non-whitespace character.
pub(crate) fn leading_whitespace(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

/// Forward-only position in a text, tracked in both chars and bytes so each
/// lookup scans only the text after the previous match.
pub(crate) struct TextCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> TextCursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Current character offset.
    pub(crate) fn position(&self) -> usize {
        self.chars
    }

    /// Find `needle` at or after the cursor. Returns its character offset and
    /// moves the cursor past it.
    pub(crate) fn seek(&mut self, needle: &str) -> Option<usize> {
        let rest = &self.text[self.byte..];
        let gap = rest.find(needle)?;
        let start = self.chars + char_len(&rest[..gap]);
        self.byte += gap + needle.len();
        self.chars = start + char_len(needle);
        Some(start)
    }

    /// Move forward `n` characters, stopping at the end of the text.
    pub(crate) fn skip(&mut self, n: usize) {
        let rest = &self.text[self.byte..];
        let bytes = rest
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.chars += char_len(&rest[..bytes]);
        self.byte += bytes;
    }
}

/// Split on `separator`, re-attaching it to every piece except the last so the
/// pieces concatenate back to `text`.
pub(crate) fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let parts: Vec<&str> = text.split(separator).collect();
    let last = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            if i < last {
                format!("{part}{separator}")
            } else {
                part.to_string()
            }
        })
        .collect()
}

/// Greedily join consecutive splits while the running piece stays within
/// `max_chars`. A single split larger than the limit is kept whole.
pub(crate) fn merge_splits(splits: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut merged = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for split in splits {
        let split_len = char_len(&split);
        if current_len + split_len <= max_chars {
            current.push_str(&split);
            current_len += split_len;
        } else {
            if !current.is_empty() {
                merged.push(std::mem::take(&mut current));
            }
            current = split;
            current_len = split_len;
        }
    }
    if !current.is_empty() {
        merged.push(current);
    }
    merged
}

/// Break `text` into fragments of at most `max_chars`, trying each separator
/// in [`SEPARATORS`] order on the fragments still over the limit.
///
/// Fragments are untrimmed and concatenate back to `text`.
pub(crate) fn split_recursive(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut fragments = vec![text.to_string()];

    for separator in SEPARATORS {
        let mut next = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            if char_len(&fragment) <= max_chars {
                next.push(fragment);
            } else {
                next.extend(merge_splits(
                    split_keep_separator(&fragment, separator),
                    max_chars,
                ));
            }
        }
        fragments = next;

        if fragments.iter().all(|f| char_len(f) <= max_chars) {
            break;
        }
    }
    fragments
}

/// Split at runs of whitespace that directly follow `.`, `!` or `?`.
/// The punctuation stays with its sentence; the whitespace is dropped.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let mut resume = end;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            resume = j + w.len_utf8();
            chars.next();
        }
        if resume > end {
            sentences.push(&text[start..end]);
            start = resume;
        }
    }
    sentences.push(&text[start..]);
    sentences
}

/// Characters the fixed strategy may end a window on.
pub(crate) fn is_boundary(c: char) -> bool {
    matches!(c, ' ' | '.' | '!' | '?' | '\n')
}

/// Nearest boundary strictly inside `(start, end)`, searching back at most
/// [`BOUNDARY_LOOKBACK`] characters from `end`.
pub(crate) fn find_boundary(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let floor = (start + 1).max(end.saturating_sub(BOUNDARY_LOOKBACK));
    (floor..end).rev().find(|&i| is_boundary(chars[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_uses_char_count() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("test"), 1);
        assert_eq!(estimate_tokens("test test"), 2);
        assert_eq!(estimate_tokens("ééééé"), 1);
    }

    #[test]
    fn cursor_seek_counts_chars() {
        let mut cursor = TextCursor::new("héllo wörld wörld");
        assert_eq!(cursor.seek("wörld"), Some(6));
        assert_eq!(cursor.position(), 11);
        assert_eq!(cursor.seek("wörld"), Some(12));
        assert_eq!(cursor.seek("wörld"), None);
        assert_eq!(cursor.position(), 17);
    }

    #[test]
    fn cursor_miss_keeps_position() {
        let mut cursor = TextCursor::new("abc");
        assert_eq!(cursor.seek("missing"), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn cursor_skip_stops_at_end() {
        let mut cursor = TextCursor::new("ñañ");
        cursor.skip(2);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.seek("ñ"), Some(2));
        cursor.skip(10);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn split_keep_separator_reassembles() {
        let parts = split_keep_separator("a, b, c", ", ");
        assert_eq!(parts, vec!["a, ", "b, ", "c"]);
        assert_eq!(parts.concat(), "a, b, c");
    }

    #[test]
    fn split_keep_separator_empty_is_per_char() {
        assert_eq!(split_keep_separator("añb", ""), vec!["a", "ñ", "b"]);
    }

    #[test]
    fn merge_splits_respects_limit() {
        let splits = vec!["aaa ".to_string(), "bb ".to_string(), "cccc".to_string()];
        assert_eq!(merge_splits(splits, 7), vec!["aaa bb ", "cccc"]);
    }

    #[test]
    fn merge_splits_keeps_oversized_piece_whole() {
        let splits = vec!["a ".to_string(), "x".repeat(10), "b".to_string()];
        let merged = merge_splits(splits, 4);
        assert_eq!(merged, vec!["a ".to_string(), "x".repeat(10), "b".to_string()]);
    }

    #[test]
    fn split_recursive_prefers_paragraphs() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let fragments = split_recursive(text, 20);
        assert_eq!(fragments, vec!["First paragraph.\n\n", "Second paragraph."]);
    }

    #[test]
    fn split_recursive_is_lossless() {
        let text = "One line here.\nAnother, longer line; with clauses! And more? Yes.\n\n\nTail";
        for max in [1, 5, 12, 30, 200] {
            let fragments = split_recursive(text, max);
            assert_eq!(fragments.concat(), text, "max={max}");
            assert!(fragments.iter().all(|f| char_len(f) <= max), "max={max}");
        }
    }

    #[test]
    fn sentences_split_after_terminal_punctuation() {
        let sentences = split_sentences("First one. Second!  Third?\nFourth");
        assert_eq!(sentences, vec!["First one.", "Second!", "Third?", "Fourth"]);
    }

    #[test]
    fn sentences_ignore_inline_punctuation() {
        assert_eq!(split_sentences("v1.2 is out"), vec!["v1.2 is out"]);
    }

    #[test]
    fn sentences_trailing_whitespace_yields_empty_tail() {
        assert_eq!(split_sentences("Done. "), vec!["Done.", ""]);
    }

    #[test]
    fn boundary_search_stays_inside_window() {
        let chars: Vec<char> = "aaaa bbbb".chars().collect();
        assert_eq!(find_boundary(&chars, 0, 7), Some(4));
        // Position `start` itself is never chosen.
        let chars: Vec<char> = " bbbbbbb".chars().collect();
        assert_eq!(find_boundary(&chars, 0, 6), None);
    }

    #[test]
    fn boundary_search_is_bounded() {
        let mut text = String::from("a ");
        text.push_str(&"b".repeat(100));
        let chars: Vec<char> = text.chars().collect();
        assert_eq!(find_boundary(&chars, 0, 100), None);
    }
}
