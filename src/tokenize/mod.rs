//! Message text segmentation.
//!
//! Splits raw text into an ordered run of segments that reconstruct the
//! input byte-for-byte. Word-boundary detection is a host capability; the
//! built-in [`ScriptSegmenter`] is the fallback used whenever no
//! locale-aware segmenter is provided or the provided one misbehaves.

use std::sync::Arc;

/// One contiguous slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// True when the segment contains at least one letter or number in any
    /// script. Non-word segments render verbatim and are not interactive.
    pub word_like: bool,
    /// Byte offset of the segment in the source string.
    pub offset: usize,
}

/// Word-boundary segmentation capability.
///
/// A host with access to a locale-aware segmentation primitive injects it
/// here. Implementations must return contiguous substrings that cover the
/// input exactly; output that fails that contract is discarded in favor of
/// the fallback.
pub trait TextSegmenter: Send + Sync {
    fn available(&self) -> bool {
        true
    }

    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Fixed separator class used by the fallback segmenter and the key
/// normalizer. Covers whitespace, ASCII punctuation and common CJK
/// punctuation.
pub fn is_separator_char(c: char) -> bool {
    if c.is_whitespace() {
        return true;
    }
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    matches!(
        c,
        '、' | '。'
            | '，'
            | '！'
            | '？'
            | '；'
            | '：'
            | '「'
            | '」'
            | '『'
            | '』'
            | '（'
            | '）'
            | '《'
            | '》'
            | '【'
            | '】'
            | '・'
            | '…'
            | '—'
            | '～'
            | '·'
            | '“'
            | '”'
            | '‘'
            | '’'
            | '¿'
            | '¡'
    )
}

/// Fallback segmenter: splits on runs of the fixed separator class.
///
/// Runs of non-separator characters stay whole, so mixed-script tokens are
/// never split further.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptSegmenter;

impl TextSegmenter for ScriptSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut run_start = 0usize;
        let mut run_is_sep: Option<bool> = None;

        for (idx, ch) in text.char_indices() {
            let is_sep = is_separator_char(ch);
            match run_is_sep {
                Some(current) if current == is_sep => {}
                Some(_) => {
                    out.push(&text[run_start..idx]);
                    run_start = idx;
                    run_is_sep = Some(is_sep);
                }
                None => run_is_sep = Some(is_sep),
            }
        }
        if run_is_sep.is_some() {
            out.push(&text[run_start..]);
        }
        out
    }
}

pub struct Tokenizer {
    segmenter: Arc<dyn TextSegmenter>,
    fallback: ScriptSegmenter,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Arc::new(ScriptSegmenter))
    }
}

impl Tokenizer {
    pub fn new(segmenter: Arc<dyn TextSegmenter>) -> Self {
        Self {
            segmenter,
            fallback: ScriptSegmenter,
        }
    }

    /// Split `text` into ordered segments.
    ///
    /// Concatenating the returned segment texts reproduces `text` exactly.
    /// Empty input yields an empty vec; malformed segmenter output degrades
    /// to the fallback instead of failing.
    pub fn tokenize(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        let pieces = if self.segmenter.available() {
            let pieces = self.segmenter.segment(text);
            if covers_exactly(text, &pieces) {
                pieces
            } else {
                self.fallback.segment(text)
            }
        } else {
            self.fallback.segment(text)
        };

        let mut segments = Vec::with_capacity(pieces.len());
        let mut offset = 0usize;
        for piece in pieces {
            segments.push(Segment {
                text: piece.to_string(),
                word_like: piece.chars().any(char::is_alphanumeric),
                offset,
            });
            offset += piece.len();
        }
        segments
    }
}

fn covers_exactly(text: &str, pieces: &[&str]) -> bool {
    pieces.iter().map(|p| p.len()).sum::<usize>() == text.len()
}
