//! # liaoyu-core - 聊语词汇交互引擎
//!
//! 本 crate 提供聊语 (Liaoyu) 语言学习聊天客户端的单词状态交互核心:
//!
//! - **Tokenizer** - 将消息文本无损切分为可交互的单词片段
//! - **Word Key Normalizer** - 原始片段到词汇表规范键的唯一映射
//! - **Status Cycle Engine** - 点击驱动的四态学习状态机
//! - **Render Projector** - 词汇快照到渲染令牌的纯投影
//! - **Gesture Resolver** - 长按 + 径向菜单的方向手势解析
//! - **Debounced Sync Coordinator** - 按键去抖的持久化合并
//!
//! ## 设计理念
//!
//! - **纯引擎** - 持久化、翻译、发音均为注入的能力接口
//! - **单一事实** - 词汇存储是唯一权威，所有渲染面共享快照
//! - **不可变快照** - 每次渲染读取的映射在该渲染期间永不变化
//!
//! ## 模块结构
//!
//! - [`tokenize`] - 文本切分与分词能力接口
//! - [`normalize`] - 规范键推导与例句提取
//! - [`cycle`] - 状态循环与菜单动作语义
//! - [`vocab`] - 词汇存储 (写时复制快照)
//! - [`project`] - 渲染投影 (聊天气泡 / 单词列表)
//! - [`gesture`] - 长按跟踪与径向菜单手势
//! - [`sync`] - 去抖同步协调器
//! - [`merge`] - 连续选词合并检测
//! - [`events`] - 词汇事件总线
//! - [`platform`] - 外部能力边界 (持久化 / 翻译 / 发音)
//! - [`engine`] - 交互引擎门面
//! - [`types`] - 公共类型

// ============================================================
// 模块声明
// ============================================================

pub mod config;
pub mod cycle;
pub mod engine;
pub mod events;
pub mod gesture;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod platform;
pub mod project;
pub mod sync;
pub mod tokenize;
pub mod types;
pub mod vocab;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use config::{DebounceConfig, EngineConfig, GestureConfig};
pub use cycle::{next_status, MenuAction};
pub use engine::{
    InteractionEngine, MenuOutcome, PointerOutcome, PressTarget, TapOutcome,
};
pub use events::{EventBus, EventEnvelope, VocabEvent};
pub use gesture::{
    bucket_direction, clamp_center, Direction, MenuLayout, Point, PressEvent, PressTracker,
    RadialGestureSession, Viewport,
};
pub use merge::{MergeDetector, MergeOutcome};
pub use normalize::{normalize_key, normalize_key_min, surrounding_sentence};
pub use platform::{
    BackendError, NoopBackend, NoopSpeech, NoopTranslator, SpeechOutput, Translator,
    VocabularyBackend,
};
pub use project::{project, project_list, StyledListEntry};
pub use sync::{PendingChange, SyncCoordinator};
pub use tokenize::{is_separator_char, ScriptSegmenter, Segment, TextSegmenter, Tokenizer};
pub use types::{
    ListEntry, MergeProposal, RenderToken, VocabularyEntry, WordCard, WordOccurrence, WordStatus,
};
pub use vocab::{OccurrenceKey, Snapshot, VocabularyStore, VocabularyStoreError};
