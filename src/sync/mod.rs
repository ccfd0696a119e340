//! 去抖同步协调器
//!
//! 将同一个键上的快速连续状态变更合并为一次出站持久化调用。
//! 每个键至多持有一个待定定时器；新的变更取消并重排旧定时器
//! (trailing debounce)。定时器触发后恰好调用一次持久化能力，
//! 失败时记录日志并发布非阻塞提示，本地乐观状态不回滚。
//!
//! 定时器句柄集中在本模块内的 arena 中管理：替换时取消、触发
//! 后清除、关闭时全部取消。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::{EventBus, SyncFailedPayload, VocabEvent};
use crate::platform::VocabularyBackend;
use crate::types::WordStatus;

/// 一次待定的状态变更
#[derive(Debug, Clone)]
pub struct PendingChange {
    pub key: String,
    pub target_status: WordStatus,
    pub important: bool,
    pub created_at: DateTime<Utc>,
}

struct PendingSync {
    generation: u64,
    change: PendingChange,
    handle: JoinHandle<()>,
}

struct Inner {
    debounce: Duration,
    backend: Arc<dyn VocabularyBackend>,
    events: Arc<EventBus>,
    pending: Mutex<HashMap<String, PendingSync>>,
    next_generation: AtomicU64,
}

/// 按键去抖的持久化协调器
///
/// 必须在 tokio 运行时内使用 (定时器通过 `tokio::spawn` 托管)。
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(
        debounce: Duration,
        backend: Arc<dyn VocabularyBackend>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                debounce,
                backend,
                events,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// 调度一次状态持久化
    ///
    /// 同键的旧定时器被取消重排，因此对单个键而言，最终只有最新
    /// 的目标状态会被写出，旧写覆盖新写在结构上不可能发生。
    pub fn schedule(
        &self,
        key: &str,
        target_status: WordStatus,
        important: bool,
        meaning: Option<String>,
    ) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let change = PendingChange {
            key: key.to_string(),
            target_status,
            important,
            created_at: Utc::now(),
        };

        let task_inner = Arc::clone(&self.inner);
        let task_key = key.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(task_inner.debounce).await;
            commit(&task_inner, &task_key, generation, meaning).await;
        });

        let mut pending = self.inner.pending.lock();
        if let Some(previous) = pending.remove(key) {
            previous.handle.abort();
            debug!(
                key,
                superseded = previous.change.target_status.as_str(),
                replacement = target_status.as_str(),
                "pending sync rescheduled"
            );
        }
        pending.insert(
            key.to_string(),
            PendingSync {
                generation,
                change,
                handle,
            },
        );
    }

    /// 当前待定的变更 (诊断 / 测试用)
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.inner
            .pending
            .lock()
            .values()
            .map(|p| p.change.clone())
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// 取消所有待定定时器 (会话关闭)
    ///
    /// 已触发的提交不被等待也不被撤销。
    pub fn shutdown(&self) {
        let mut pending = self.inner.pending.lock();
        for (_, sync) in pending.drain() {
            sync.handle.abort();
        }
    }
}

async fn commit(inner: &Arc<Inner>, key: &str, generation: u64, meaning: Option<String>) {
    // 取出自己的 arena 槽位；若已被更新的调度替换则放弃提交。
    let change = {
        let mut pending = inner.pending.lock();
        let owns_slot = pending
            .get(key)
            .map_or(false, |sync| sync.generation == generation);
        if owns_slot {
            pending.remove(key).map(|sync| sync.change)
        } else {
            None
        }
    };
    let Some(change) = change else {
        return;
    };

    let result = if change.target_status == WordStatus::White && !change.important {
        inner.backend.reset_word_status(key).await
    } else {
        inner
            .backend
            .persist_word_status(key, change.target_status, change.important, meaning.as_deref())
            .await
    };

    match result {
        Ok(()) => {
            debug!(key, status = change.target_status.as_str(), "word status persisted");
        }
        Err(err) => {
            warn!(key, error = %err, "word status sync failed");
            inner.events.publish(VocabEvent::SyncFailed(SyncFailedPayload {
                key: key.to_string(),
                error: err.to_string(),
                timestamp: Utc::now(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::BackendError;
    use futures::future::BoxFuture;

    #[derive(Default)]
    struct RecordingBackend {
        commits: Mutex<Vec<(String, WordStatus)>>,
        resets: Mutex<Vec<String>>,
        fail: bool,
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
            self.resets.lock().push(key.to_string());
            Box::pin(async { Ok(()) })
        }

        fn fetch_snapshot(
            &self,
            _user_id: &str,
        ) -> BoxFuture<'static, Result<HashMap<String, crate::types::VocabularyEntry>, BackendError>>
        {
            Box::pin(async { Ok(HashMap::new()) })
        }
    }

    fn coordinator(backend: Arc<RecordingBackend>) -> SyncCoordinator {
        SyncCoordinator::new(
            Duration::from_millis(500),
            backend,
            Arc::new(EventBus::new()),
        )
    }

    async fn settle() {
        // Under paused time the sleep auto-advances past every pending
        // debounce timer and lets spawned tasks run to completion.
        tokio::time::sleep(Duration::from_millis(600)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_to_last_write() {
        let backend = Arc::new(RecordingBackend::default());
        let sync = coordinator(Arc::clone(&backend));

        sync.schedule("cat", WordStatus::Red, false, None);
        sync.schedule("cat", WordStatus::Yellow, false, None);
        settle().await;

        let commits = backend.commits.lock().clone();
        assert_eq!(commits, vec![("cat".to_string(), WordStatus::Yellow)]);
        assert_eq!(sync.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_commit_independently() {
        let backend = Arc::new(RecordingBackend::default());
        let sync = coordinator(Arc::clone(&backend));

        sync.schedule("cat", WordStatus::Red, false, None);
        sync.schedule("dog", WordStatus::Green, false, None);
        assert_eq!(sync.pending_len(), 2);
        settle().await;

        let mut commits = backend.commits.lock().clone();
        commits.sort();
        assert_eq!(
            commits,
            vec![
                ("cat".to_string(), WordStatus::Red),
                ("dog".to_string(), WordStatus::Green)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_white_routes_to_reset() {
        let backend = Arc::new(RecordingBackend::default());
        let sync = coordinator(Arc::clone(&backend));

        sync.schedule("cat", WordStatus::White, false, None);
        settle().await;

        assert!(backend.commits.lock().is_empty());
        assert_eq!(backend.resets.lock().clone(), vec!["cat".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending() {
        let backend = Arc::new(RecordingBackend::default());
        let sync = coordinator(Arc::clone(&backend));

        sync.schedule("cat", WordStatus::Red, false, None);
        sync.shutdown();
        settle().await;

        assert!(backend.commits.lock().is_empty());
        assert_eq!(sync.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_publishes_notice_without_rollback() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let events = Arc::new(EventBus::new());
        let sync = SyncCoordinator::new(
            Duration::from_millis(500),
            Arc::clone(&backend) as Arc<dyn VocabularyBackend>,
            Arc::clone(&events),
        );
        let mut rx = events.subscribe_all();

        sync.schedule("cat", WordStatus::Red, false, None);
        settle().await;

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.event_type(), "SYNC_FAILED");
        assert_eq!(envelope.event.key(), Some("cat"));
    }
}
