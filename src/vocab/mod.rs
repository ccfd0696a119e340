//! 词汇存储
//!
//! 全局唯一的权威词汇映射：规范键 → 学习状态 + 释义。
//! 所有渲染面 (聊天气泡、单词列表、测验) 注入同一个存储实例，
//! 以只读快照读取、以 dispatch 风格的变更方法写入。
//!
//! 快照为写时复制：读取方拿到的 `Arc<HashMap>` 在其渲染期间
//! 永不变化，变更总是构造新映射后整体替换。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::events::{
    EntryRemovedPayload, EventBus, ImportantMarkedPayload, SnapshotReplacedPayload,
    StatusChangedPayload, VocabEvent,
};
use crate::types::{VocabularyEntry, WordStatus};

/// 渲染期共享的不可变词汇快照
pub type Snapshot = Arc<HashMap<String, VocabularyEntry>>;

/// 某条消息内某个键的瞬态本地状态
///
/// 仅在全局条目尚不存在时提供乐观反馈，读取时全局状态优先。
pub type OccurrenceKey = (String, String);

// ============================================================
// 错误类型定义
// ============================================================

/// 词汇存储错误
#[derive(Debug, Error)]
pub enum VocabularyStoreError {
    /// 无效的规范键
    #[error("无效的规范键: {0:?}")]
    InvalidKey(String),
}

// ============================================================
// VocabularyStore
// ============================================================

pub struct VocabularyStore {
    snapshot: RwLock<Snapshot>,
    overrides: RwLock<HashMap<OccurrenceKey, WordStatus>>,
    events: Arc<EventBus>,
}

impl VocabularyStore {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
            overrides: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// 当前快照
    ///
    /// 返回的映射不可变；同一次渲染中多次读取应复用同一份快照。
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot.read())
    }

    /// 当前本地覆盖表的拷贝 (供渲染投影使用)
    pub fn overrides(&self) -> HashMap<OccurrenceKey, WordStatus> {
        self.overrides.read().clone()
    }

    /// 解析某次出现的有效状态: 全局条目优先，其次本地覆盖，否则 white
    pub fn resolve_status(&self, message_id: &str, key: &str) -> (WordStatus, bool) {
        if let Some(entry) = self.snapshot.read().get(key) {
            return (entry.status, entry.important);
        }
        let status = self
            .overrides
            .read()
            .get(&(message_id.to_string(), key.to_string()))
            .copied()
            .unwrap_or(WordStatus::White);
        (status, false)
    }

    // ============================================================
    // 变更操作 (每次变更构造新快照)
    // ============================================================

    /// 设置某个键的循环状态
    ///
    /// `White` 即删除：仅当条目带重点星标时保留 (星标使条目存活)。
    pub fn set_status(
        &self,
        key: &str,
        status: WordStatus,
    ) -> Result<(), VocabularyStoreError> {
        validate_key(key)?;
        let now = Utc::now();

        {
            let mut guard = self.snapshot.write();
            let mut next: HashMap<String, VocabularyEntry> = (**guard).clone();
            match next.get(key).map(|entry| entry.important) {
                Some(important) if status == WordStatus::White && !important => {
                    next.remove(key);
                }
                Some(_) => {
                    if let Some(entry) = next.get_mut(key) {
                        entry.status = status;
                        entry.updated_at = now;
                    }
                }
                None => {
                    if status != WordStatus::White {
                        next.insert(key.to_string(), VocabularyEntry::new(key, status));
                    }
                }
            }
            *guard = Arc::new(next);
        }

        debug!(key, status = status.as_str(), "vocabulary status updated");
        if status == WordStatus::White {
            self.events.publish(VocabEvent::EntryRemoved(EntryRemovedPayload {
                key: key.to_string(),
                timestamp: now,
            }));
        } else {
            self.events
                .publish(VocabEvent::StatusChanged(StatusChangedPayload {
                    key: key.to_string(),
                    status,
                    timestamp: now,
                }));
        }
        Ok(())
    }

    /// 设置或清除重点星标 (不触碰循环状态)
    pub fn set_important(
        &self,
        key: &str,
        important: bool,
    ) -> Result<(), VocabularyStoreError> {
        validate_key(key)?;
        let now = Utc::now();

        {
            let mut guard = self.snapshot.write();
            let mut next: HashMap<String, VocabularyEntry> = (**guard).clone();
            match next.get(key).map(|entry| entry.status) {
                Some(status) if !important && status == WordStatus::White => {
                    // 星标是白色条目唯一的存活理由
                    next.remove(key);
                }
                Some(_) => {
                    if let Some(entry) = next.get_mut(key) {
                        entry.important = important;
                        entry.updated_at = now;
                    }
                }
                None => {
                    if important {
                        let mut entry = VocabularyEntry::new(key, WordStatus::White);
                        entry.important = true;
                        next.insert(key.to_string(), entry);
                    }
                }
            }
            *guard = Arc::new(next);
        }

        self.events
            .publish(VocabEvent::ImportantMarked(ImportantMarkedPayload {
                key: key.to_string(),
                important,
                timestamp: now,
            }));
        Ok(())
    }

    /// 更新释义 (条目不存在时忽略)
    pub fn set_meaning(&self, key: &str, meaning: Option<String>) {
        let mut guard = self.snapshot.write();
        if !guard.contains_key(key) {
            return;
        }
        let mut next: HashMap<String, VocabularyEntry> = (**guard).clone();
        if let Some(entry) = next.get_mut(key) {
            entry.meaning = meaning;
            entry.updated_at = Utc::now();
        }
        *guard = Arc::new(next);
    }

    /// 删除条目 (等价于 set_status(white) 且无视星标)
    pub fn remove(&self, key: &str) {
        let now = Utc::now();
        {
            let mut guard = self.snapshot.write();
            if !guard.contains_key(key) {
                return;
            }
            let mut next: HashMap<String, VocabularyEntry> = (**guard).clone();
            next.remove(key);
            *guard = Arc::new(next);
        }
        self.overrides
            .write()
            .retain(|(_, override_key), _| override_key != key);
        self.events.publish(VocabEvent::EntryRemoved(EntryRemovedPayload {
            key: key.to_string(),
            timestamp: now,
        }));
    }

    /// 以权威快照整体替换 (会话开始 / 外部变更刷新)
    pub fn replace_snapshot(&self, entries: HashMap<String, VocabularyEntry>) {
        let entry_count = entries.len();
        {
            let mut guard = self.snapshot.write();
            *guard = Arc::new(entries);
        }
        // 已被全局条目接管的覆盖全部清除
        {
            let snapshot = self.snapshot.read();
            self.overrides
                .write()
                .retain(|(_, key), _| !snapshot.contains_key(key));
        }
        self.events
            .publish(VocabEvent::SnapshotReplaced(SnapshotReplacedPayload {
                entry_count,
                timestamp: Utc::now(),
            }));
    }

    // ============================================================
    // 本地覆盖
    // ============================================================

    /// 记录一次出现的瞬态本地状态
    pub fn set_local_override(&self, message_id: &str, key: &str, status: WordStatus) {
        let mut overrides = self.overrides.write();
        if status == WordStatus::White {
            overrides.remove(&(message_id.to_string(), key.to_string()));
        } else {
            overrides.insert((message_id.to_string(), key.to_string()), status);
        }
    }

    /// 清除某条消息的全部本地覆盖 (消息卸载时)
    pub fn clear_message_overrides(&self, message_id: &str) {
        self.overrides
            .write()
            .retain(|(override_message, _), _| override_message != message_id);
    }
}

fn validate_key(key: &str) -> Result<(), VocabularyStoreError> {
    if key.trim().is_empty() {
        return Err(VocabularyStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VocabularyStore {
        VocabularyStore::new(Arc::new(EventBus::new()))
    }

    #[test]
    fn test_set_status_creates_entry() {
        let store = store();
        store.set_status("fox", WordStatus::Red).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("fox").unwrap().status, WordStatus::Red);
    }

    #[test]
    fn test_white_removes_entry() {
        let store = store();
        store.set_status("fox", WordStatus::Green).unwrap();
        store.set_status("fox", WordStatus::White).unwrap();
        assert!(store.snapshot().get("fox").is_none());
    }

    #[test]
    fn test_important_keeps_white_entry_alive() {
        let store = store();
        store.set_important("fox", true).unwrap();
        store.set_status("fox", WordStatus::White).unwrap();
        let snapshot = store.snapshot();
        let entry = snapshot.get("fox").unwrap();
        assert_eq!(entry.status, WordStatus::White);
        assert!(entry.important);

        store.set_important("fox", false).unwrap();
        assert!(store.snapshot().get("fox").is_none());
    }

    #[test]
    fn test_snapshot_is_immutable_after_read() {
        let store = store();
        store.set_status("fox", WordStatus::Red).unwrap();
        let before = store.snapshot();
        store.set_status("fox", WordStatus::Yellow).unwrap();
        assert_eq!(before.get("fox").unwrap().status, WordStatus::Red);
        assert_eq!(
            store.snapshot().get("fox").unwrap().status,
            WordStatus::Yellow
        );
    }

    #[test]
    fn test_override_resolution_precedence() {
        let store = store();
        store.set_local_override("m1", "fox", WordStatus::Red);
        assert_eq!(store.resolve_status("m1", "fox").0, WordStatus::Red);
        // 其他消息不受影响
        assert_eq!(store.resolve_status("m2", "fox").0, WordStatus::White);

        // 全局条目出现后优先于覆盖
        store.set_status("fox", WordStatus::Green).unwrap();
        assert_eq!(store.resolve_status("m1", "fox").0, WordStatus::Green);
    }

    #[test]
    fn test_remove_clears_key_overrides() {
        // 条目删除后，残留覆盖不得让旧颜色复活
        let store = store();
        store.set_local_override("m1", "fox", WordStatus::Red);
        store.set_status("fox", WordStatus::Red).unwrap();
        store.remove("fox");
        assert!(store.overrides().is_empty());
        assert_eq!(store.resolve_status("m1", "fox").0, WordStatus::White);
    }

    #[test]
    fn test_clear_message_overrides() {
        let store = store();
        store.set_local_override("m1", "fox", WordStatus::Red);
        store.set_local_override("m2", "dog", WordStatus::Red);
        store.clear_message_overrides("m1");
        let overrides = store.overrides();
        assert_eq!(overrides.len(), 1);
        assert!(overrides.contains_key(&("m2".to_string(), "dog".to_string())));
    }

    #[test]
    fn test_replace_snapshot() {
        let store = store();
        store.set_status("old", WordStatus::Red).unwrap();
        let mut entries = HashMap::new();
        entries.insert(
            "new".to_string(),
            VocabularyEntry::new("new", WordStatus::Green),
        );
        store.replace_snapshot(entries);
        let snapshot = store.snapshot();
        assert!(snapshot.get("old").is_none());
        assert_eq!(snapshot.get("new").unwrap().status, WordStatus::Green);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let store = store();
        assert!(store.set_status("", WordStatus::Red).is_err());
        assert!(store.set_important("  ", true).is_err());
    }
}
