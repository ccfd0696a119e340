//! 外部能力边界
//!
//! 引擎消费而不实现的协作方接口：词汇持久化、翻译、发音。
//! 宿主按平台注入实现；缺失的能力降级为 no-op 或用户可见的
//! "不支持" 提示，绝不致命。

use std::collections::HashMap;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use crate::types::{VocabularyEntry, WordStatus};

// ============================================================
// 错误类型定义
// ============================================================

/// 能力边界错误
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 远端拒绝写入
    #[error("持久化被拒绝: {0}")]
    Rejected(String),

    /// 能力在当前平台不可用
    #[error("能力不可用: {0}")]
    Unavailable(String),
}

// ============================================================
// 词汇持久化能力
// ============================================================

/// 词汇持久化后端
///
/// 去抖同步协调器通过本接口写入，会话开始与外部变更通知时
/// 通过 `fetch_snapshot` 刷新权威快照。
pub trait VocabularyBackend: Send + Sync {
    /// 持久化一个单词的状态
    fn persist_word_status(
        &self,
        key: &str,
        status: WordStatus,
        important: bool,
        meaning: Option<&str>,
    ) -> BoxFuture<'static, Result<(), BackendError>>;

    /// 删除一个单词的条目 (等价于重置为 white)
    fn reset_word_status(&self, key: &str) -> BoxFuture<'static, Result<(), BackendError>>;

    /// 拉取某用户的完整词汇快照
    fn fetch_snapshot(
        &self,
        user_id: &str,
    ) -> BoxFuture<'static, Result<HashMap<String, VocabularyEntry>, BackendError>>;
}

// ============================================================
// 翻译能力
// ============================================================

/// 文本翻译能力
///
/// 翻译失败不得阻塞原文渲染。
pub trait Translator: Send + Sync {
    fn available(&self) -> bool {
        true
    }

    fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> BoxFuture<'static, Result<String, BackendError>>;
}

// ============================================================
// 发音能力
// ============================================================

/// 发音播放能力 (fire-and-forget)
///
/// 引擎不等待任何返回值；不可用时调用方应提示 "不支持"。
pub trait SpeechOutput: Send + Sync {
    fn available(&self) -> bool;

    fn speak(&self, text: &str, lang_code: &str);
}

// ============================================================
// 默认 no-op 实现
// ============================================================

/// 无后端：写入即成功，快照恒为空
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

impl VocabularyBackend for NoopBackend {
    fn persist_word_status(
        &self,
        key: &str,
        status: WordStatus,
        _important: bool,
        _meaning: Option<&str>,
    ) -> BoxFuture<'static, Result<(), BackendError>> {
        debug!(key, status = status.as_str(), "noop backend persist");
        Box::pin(async { Ok(()) })
    }

    fn reset_word_status(&self, key: &str) -> BoxFuture<'static, Result<(), BackendError>> {
        debug!(key, "noop backend reset");
        Box::pin(async { Ok(()) })
    }

    fn fetch_snapshot(
        &self,
        _user_id: &str,
    ) -> BoxFuture<'static, Result<HashMap<String, VocabularyEntry>, BackendError>> {
        Box::pin(async { Ok(HashMap::new()) })
    }
}

/// 无翻译能力
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn available(&self) -> bool {
        false
    }

    fn translate(
        &self,
        _text: &str,
        target_lang: &str,
    ) -> BoxFuture<'static, Result<String, BackendError>> {
        let lang = target_lang.to_string();
        Box::pin(async move { Err(BackendError::Unavailable(format!("translate -> {lang}"))) })
    }
}

/// 无发音能力
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeech;

impl SpeechOutput for NoopSpeech {
    fn available(&self) -> bool {
        false
    }

    fn speak(&self, text: &str, lang_code: &str) {
        debug!(text, lang_code, "speech output unavailable");
    }
}
