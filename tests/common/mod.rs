use std::collections::HashMap;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use liaoyu_core::{
    BackendError, PressTarget, RenderToken, VocabularyBackend, VocabularyEntry, WordStatus,
};

/// Backend double that records every outbound write.
#[derive(Default)]
pub struct RecordingBackend {
    pub commits: Mutex<Vec<(String, WordStatus)>>,
    pub resets: Mutex<Vec<String>>,
    pub snapshot: Mutex<HashMap<String, VocabularyEntry>>,
    pub fail: bool,
}

impl VocabularyBackend for RecordingBackend {
    fn persist_word_status(
        &self,
        key: &str,
        status: WordStatus,
        _important: bool,
        _meaning: Option<&str>,
    ) -> BoxFuture<'static, Result<(), BackendError>> {
        if self.fail {
            return Box::pin(async { Err(BackendError::Network("offline".into())) });
        }
        self.commits.lock().push((key.to_string(), status));
        Box::pin(async { Ok(()) })
    }

    fn reset_word_status(&self, key: &str) -> BoxFuture<'static, Result<(), BackendError>> {
        if self.fail {
            return Box::pin(async { Err(BackendError::Network("offline".into())) });
        }
        self.resets.lock().push(key.to_string());
        Box::pin(async { Ok(()) })
    }

    fn fetch_snapshot(
        &self,
        _user_id: &str,
    ) -> BoxFuture<'static, Result<HashMap<String, VocabularyEntry>, BackendError>> {
        let snapshot = self.snapshot.lock().clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

pub fn press_target(message_id: &str, raw_segment: &str, message_text: &str) -> PressTarget {
    PressTarget {
        message_id: message_id.to_string(),
        raw_segment: raw_segment.to_string(),
        message_text: message_text.to_string(),
        offset: message_text.find(raw_segment).unwrap_or(0),
        lang_code: "en-US".to_string(),
    }
}

/// Status of the first word token whose key matches.
pub fn word_status_in(tokens: &[RenderToken], key: &str) -> Option<WordStatus> {
    tokens.iter().find_map(|token| match token {
        RenderToken::Word {
            key: token_key,
            status,
            ..
        } if token_key == key => Some(*status),
        _ => None,
    })
}
