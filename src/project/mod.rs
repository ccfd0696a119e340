//! Render projection.
//!
//! Maps message text plus the current vocabulary snapshot onto render
//! tokens. Pure: no hidden counters, no clocks. Identical inputs always
//! produce identical output, because the UI re-renders freely.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_key;
use crate::tokenize::Tokenizer;
use crate::types::{ListEntry, RenderToken, VocabularyEntry, WordStatus};
use crate::vocab::OccurrenceKey;

/// Project one message into render tokens.
///
/// Status precedence per occurrence: global entry for the key, else the
/// `(message_id, key)` local override, else `White`. Word-like segments
/// that produce no canonical key render as separators (nothing to track).
pub fn project(
    tokenizer: &Tokenizer,
    text: &str,
    message_id: &str,
    snapshot: &HashMap<String, VocabularyEntry>,
    overrides: &HashMap<OccurrenceKey, WordStatus>,
) -> Vec<RenderToken> {
    tokenizer
        .tokenize(text)
        .into_iter()
        .map(|segment| {
            if !segment.word_like {
                return RenderToken::Separator { text: segment.text };
            }
            match normalize_key(&segment.text) {
                Some(key) => {
                    let (status, important) =
                        resolve(snapshot, overrides, message_id, &key);
                    RenderToken::Word {
                        text: segment.text,
                        key,
                        status,
                        important,
                        offset: segment.offset,
                    }
                }
                None => RenderToken::Separator { text: segment.text },
            }
        })
        .collect()
}

fn resolve(
    snapshot: &HashMap<String, VocabularyEntry>,
    overrides: &HashMap<OccurrenceKey, WordStatus>,
    message_id: &str,
    key: &str,
) -> (WordStatus, bool) {
    if let Some(entry) = snapshot.get(key) {
        return (entry.status, entry.important);
    }
    let status = overrides
        .get(&(message_id.to_string(), key.to_string()))
        .copied()
        .unwrap_or(WordStatus::White);
    (status, false)
}

/// One styled row of the word-list surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledListEntry {
    pub entry: ListEntry,
    /// Canonical key, when the entry's word yields one.
    pub key: Option<String>,
    pub status: WordStatus,
    pub important: bool,
}

/// Style word-list entries from the same snapshot the chat surface uses.
///
/// The `ListEntry` variant was decided once at the loading boundary; this
/// function never re-sniffs the shape.
pub fn project_list(
    entries: &[ListEntry],
    snapshot: &HashMap<String, VocabularyEntry>,
) -> Vec<StyledListEntry> {
    entries
        .iter()
        .map(|entry| {
            let key = normalize_key(entry.word());
            let (status, important) = key
                .as_deref()
                .and_then(|k| snapshot.get(k))
                .map(|e| (e.status, e.important))
                .unwrap_or((WordStatus::White, false));
            StyledListEntry {
                entry: entry.clone(),
                key,
                status,
                important,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordCard;

    fn snapshot_with(key: &str, status: WordStatus) -> HashMap<String, VocabularyEntry> {
        let mut map = HashMap::new();
        map.insert(key.to_string(), VocabularyEntry::new(key, status));
        map
    }

    #[test]
    fn test_project_reconstructs_text() {
        let tokenizer = Tokenizer::default();
        let text = "The quick fox, and 世界!";
        let tokens = project(&tokenizer, text, "m1", &HashMap::new(), &HashMap::new());
        let rebuilt: String = tokens.iter().map(|t| t.text()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_global_status_applies_to_every_occurrence() {
        let tokenizer = Tokenizer::default();
        let snapshot = snapshot_with("fox", WordStatus::Red);
        let tokens = project(
            &tokenizer,
            "fox and Fox and **fox**",
            "m1",
            &snapshot,
            &HashMap::new(),
        );
        let statuses: Vec<WordStatus> = tokens
            .iter()
            .filter_map(|t| match t {
                RenderToken::Word { key, status, .. } if key == "fox" => Some(*status),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec![WordStatus::Red; 3]);
    }

    #[test]
    fn test_override_only_without_global_entry() {
        let tokenizer = Tokenizer::default();
        let mut overrides = HashMap::new();
        overrides.insert(("m1".to_string(), "fox".to_string()), WordStatus::Yellow);

        let tokens = project(&tokenizer, "fox", "m1", &HashMap::new(), &overrides);
        assert!(matches!(
            tokens[0],
            RenderToken::Word {
                status: WordStatus::Yellow,
                ..
            }
        ));

        // Same override map, other message: stays white.
        let tokens = project(&tokenizer, "fox", "m2", &HashMap::new(), &overrides);
        assert!(matches!(
            tokens[0],
            RenderToken::Word {
                status: WordStatus::White,
                ..
            }
        ));

        // Global beats override.
        let snapshot = snapshot_with("fox", WordStatus::Green);
        let tokens = project(&tokenizer, "fox", "m1", &snapshot, &overrides);
        assert!(matches!(
            tokens[0],
            RenderToken::Word {
                status: WordStatus::Green,
                ..
            }
        ));
    }

    #[test]
    fn test_idempotent() {
        let tokenizer = Tokenizer::default();
        let snapshot = snapshot_with("fox", WordStatus::Red);
        let overrides = HashMap::new();
        let first = project(&tokenizer, "a fox runs", "m1", &snapshot, &overrides);
        let second = project(&tokenizer, "a fox runs", "m1", &snapshot, &overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_segment_renders_as_separator() {
        let tokenizer = Tokenizer::default();
        let tokens = project(&tokenizer, "a fox", "m1", &HashMap::new(), &HashMap::new());
        // "a" is below the key minimum: verbatim, not interactive.
        assert!(matches!(tokens[0], RenderToken::Separator { .. }));
        assert!(matches!(tokens[2], RenderToken::Word { .. }));
    }

    #[test]
    fn test_project_list_styles_from_snapshot() {
        let snapshot = snapshot_with("fox", WordStatus::Green);
        let entries = vec![
            ListEntry::Plain("Fox".to_string()),
            ListEntry::Tagged(WordCard {
                word: "dog".to_string(),
                meaning: Some("犬".to_string()),
                example: None,
            }),
        ];
        let rows = project_list(&entries, &snapshot);
        assert_eq!(rows[0].status, WordStatus::Green);
        assert_eq!(rows[0].key.as_deref(), Some("fox"));
        assert_eq!(rows[1].status, WordStatus::White);
    }
}
