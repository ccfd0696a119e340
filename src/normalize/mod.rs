//! Canonical word key derivation.
//!
//! Every path that needs a vocabulary key (render lookup, tap handling,
//! merge detection, sync) calls [`normalize_key`]. There is deliberately
//! exactly one implementation; the same raw segment must produce the same
//! key no matter which surface computed it.

use crate::tokenize::is_separator_char;

/// Shortest key that is tracked as vocabulary.
pub const MIN_KEY_CHARS: usize = 2;

const SENTENCE_TERMINATORS: [char; 7] = ['.', '!', '?', '。', '！', '？', '\n'];

/// Derive the canonical vocabulary key for a raw segment.
///
/// Steps, in order: strip markdown decoration, trim, take the first
/// sub-token on the fixed separator class, strip surrounding quotes and
/// brackets, lowercase. Returns `None` when fewer than [`MIN_KEY_CHARS`]
/// characters or no letter/number survive. Malformed input degrades to
/// `None`, never an error.
pub fn normalize_key(segment: &str) -> Option<String> {
    normalize_key_min(segment, MIN_KEY_CHARS)
}

/// [`normalize_key`] with an explicit minimum key length.
pub fn normalize_key_min(segment: &str, min_chars: usize) -> Option<String> {
    let stripped = strip_markdown(segment);
    let trimmed = stripped.trim();

    let first = trimmed
        .split(is_separator_char)
        .find(|token| !token.is_empty())
        .unwrap_or("");

    let bare = first.trim_matches(is_quote_or_bracket);
    if bare.chars().count() < min_chars || !bare.chars().any(char::is_alphanumeric) {
        return None;
    }

    Some(bare.to_lowercase())
}

/// Strip `**bold**`, `*italic*`, `` `code` `` wrappers and leading heading
/// markers.
fn strip_markdown(segment: &str) -> &str {
    let mut s = segment.trim();

    while let Some(rest) = s.strip_prefix('#') {
        s = rest.trim_start();
    }

    loop {
        let before = s;
        for wrapper in ["**", "*", "`", "_"] {
            if let Some(inner) = s
                .strip_prefix(wrapper)
                .and_then(|inner| inner.strip_suffix(wrapper))
            {
                if !inner.is_empty() {
                    s = inner;
                }
            }
        }
        if s == before {
            return s;
        }
    }
}

fn is_quote_or_bracket(c: char) -> bool {
    matches!(
        c,
        '"' | '\''
            | '“'
            | '”'
            | '‘'
            | '’'
            | '«'
            | '»'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '<'
            | '>'
            | '「'
            | '」'
            | '『'
            | '』'
            | '《'
            | '》'
            | '【'
            | '】'
            | '（'
            | '）'
    )
}

/// Recover the sentence (or line) containing the byte offset of an
/// occurrence, for the "save sentence" action.
pub fn surrounding_sentence(text: &str, offset: usize) -> &str {
    if text.is_empty() {
        return "";
    }
    let offset = offset.min(text.len());

    let start = text[..offset]
        .char_indices()
        .rev()
        .find(|(_, c)| SENTENCE_TERMINATORS.contains(c))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);

    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| SENTENCE_TERMINATORS.contains(c))
        .map(|(idx, c)| offset + idx + c.len_utf8())
        .unwrap_or(text.len());

    text[start..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_word_lowercased() {
        assert_eq!(normalize_key("York"), Some("york".to_string()));
    }

    #[test]
    fn test_markdown_wrapped_word() {
        assert_eq!(normalize_key("**hello**"), Some("hello".to_string()));
        assert_eq!(normalize_key("*ciao*"), Some("ciao".to_string()));
        assert_eq!(normalize_key("`code`"), Some("code".to_string()));
        assert_eq!(normalize_key("## Heading"), Some("heading".to_string()));
        assert_eq!(normalize_key("hello"), normalize_key("**hello**"));
    }

    #[test]
    fn test_internal_punctuation_takes_first_token() {
        assert_eq!(normalize_key("don't"), Some("don".to_string()));
        assert_eq!(normalize_key("fox,"), Some("fox".to_string()));
        assert_eq!(normalize_key("re-read"), Some("re".to_string()));
    }

    #[test]
    fn test_quotes_and_brackets_stripped() {
        assert_eq!(normalize_key("“Hello”"), Some("hello".to_string()));
        assert_eq!(normalize_key("(world)"), Some("world".to_string()));
    }

    #[test]
    fn test_too_short_or_meaningless() {
        assert_eq!(normalize_key("a"), None);
        assert_eq!(normalize_key("!!"), None);
        assert_eq!(normalize_key(""), None);
        assert_eq!(normalize_key("  "), None);
        assert_eq!(normalize_key("--"), None);
    }

    #[test]
    fn test_cjk_key() {
        assert_eq!(normalize_key("世界"), Some("世界".to_string()));
        // Single-character segments produce no key.
        assert_eq!(normalize_key("好"), None);
    }

    #[test]
    fn test_deterministic() {
        let raw = "**Compound**";
        assert_eq!(normalize_key(raw), normalize_key(raw));
    }

    #[test]
    fn test_surrounding_sentence() {
        let text = "First one. Second sentence here! Third?";
        let offset = text.find("sentence").unwrap();
        assert_eq!(surrounding_sentence(text, offset), "Second sentence here!");
        assert_eq!(surrounding_sentence(text, 0), "First one.");
        let tail = text.find("Third").unwrap();
        assert_eq!(surrounding_sentence(text, tail), "Third?");
    }

    #[test]
    fn test_surrounding_sentence_cjk_and_lines() {
        let text = "你好世界。这是第二句！\n单独一行";
        let offset = text.find("第二").unwrap();
        assert_eq!(surrounding_sentence(text, offset), "这是第二句！");
        assert_eq!(surrounding_sentence(text, text.len()), "单独一行");
        assert_eq!(surrounding_sentence("", 0), "");
    }
}
