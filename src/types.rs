//! 公共数据模型
//!
//! 定义词汇引擎在各渲染面之间共享的数据结构。
//! 词汇条目随存储同步到云端，其余类型均为渲染期的瞬态值。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================
// WordStatus - 学习状态
// ============================================================

/// 单词学习状态
///
/// 点击驱动的四态循环: white → red → yellow → green → white。
/// `White` 在词汇表中等价于"不存在"，重置即删除条目。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    /// 未接触
    White,
    /// 不认识
    Red,
    /// 学习中
    Yellow,
    /// 已掌握
    Green,
}

impl WordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordStatus::White => "white",
            WordStatus::Red => "red",
            WordStatus::Yellow => "yellow",
            WordStatus::Green => "green",
        }
    }
}

impl Default for WordStatus {
    fn default() -> Self {
        WordStatus::White
    }
}

// ============================================================
// VocabularyEntry - 词汇条目
// ============================================================

/// 词汇条目
///
/// 以规范键为唯一标识的全局学习状态。`important`（橙色星标）
/// 与四态循环平行，仅由显式动作设置或清除。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// 规范化后的小写词形
    pub key: String,
    /// 当前学习状态
    pub status: WordStatus,
    /// 重点星标 (渲染颜色优先，但不阻断循环)
    #[serde(default)]
    pub important: bool,
    /// 本地化释义
    #[serde(default)]
    pub meaning: Option<String>,
    /// 自由标签 (如 "toeic")
    #[serde(default)]
    pub category: Option<String>,
    /// 最后修改时间
    pub updated_at: DateTime<Utc>,
}

impl VocabularyEntry {
    pub fn new(key: impl Into<String>, status: WordStatus) -> Self {
        Self {
            key: key.into(),
            status,
            important: false,
            meaning: None,
            category: None,
            updated_at: Utc::now(),
        }
    }
}

// ============================================================
// WordOccurrence - 单词出现 (渲染期瞬态)
// ============================================================

/// 一次消息内的单词出现
///
/// 每次渲染由分词器重新产生，从不持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOccurrence {
    /// 源文本中的原始片段 (用于无损重建)
    pub raw_segment: String,
    /// 所属消息标识
    pub message_id: String,
    /// 片段在源文本中的字节偏移 (用于例句提取)
    pub offset_in_text: usize,
}

// ============================================================
// RenderToken - 渲染令牌
// ============================================================

/// 渲染投影的输出单元
///
/// `Word` 令牌携带交互所需的全部标识 (键 + 偏移)，宿主据此
/// 绑定点击与长按处理；`Separator` 原样渲染且不可交互。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderToken {
    #[serde(rename_all = "camelCase")]
    Separator { text: String },
    #[serde(rename_all = "camelCase")]
    Word {
        text: String,
        key: String,
        status: WordStatus,
        important: bool,
        offset: usize,
    },
}

impl RenderToken {
    pub fn text(&self) -> &str {
        match self {
            RenderToken::Separator { text } => text,
            RenderToken::Word { text, .. } => text,
        }
    }
}

// ============================================================
// 单词列表渲染面
// ============================================================

/// 单词列表卡片数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCard {
    pub word: String,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

/// 列表条目
///
/// 在数据装载边界一次性判定，渲染期不再嗅探类型。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Tagged(WordCard),
    Plain(String),
}

impl ListEntry {
    /// 条目对应的原始词形
    pub fn word(&self) -> &str {
        match self {
            ListEntry::Plain(word) => word,
            ListEntry::Tagged(card) => &card.word,
        }
    }
}

// ============================================================
// MergeProposal - 合并提案
// ============================================================

/// 连续选词合并提案
///
/// 在用户确认前不产生任何词汇表变更。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeProposal {
    pub first: String,
    pub second: String,
}

impl MergeProposal {
    /// 合并后的复合词键
    pub fn compound_key(&self) -> String {
        format!("{} {}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_wire_shape_is_camel_case() {
        let entry = VocabularyEntry::new("fox", WordStatus::Red);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "fox");
        assert_eq!(json["status"], "red");
        assert_eq!(json["important"], false);
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("updated_at").is_none());
    }

    #[test]
    fn test_entry_round_trip() {
        let mut entry = VocabularyEntry::new("考试", WordStatus::Yellow);
        entry.meaning = Some("examination".to_string());
        entry.category = Some("toeic".to_string());
        let json = serde_json::to_string(&entry).unwrap();
        let back: VocabularyEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key, entry.key);
        assert_eq!(back.status, entry.status);
        assert_eq!(back.meaning, entry.meaning);
        assert_eq!(back.category, entry.category);
    }

    #[test]
    fn test_render_token_tagged_by_kind() {
        let token = RenderToken::Word {
            text: "Fox".to_string(),
            key: "fox".to_string(),
            status: WordStatus::Green,
            important: true,
            offset: 4,
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["kind"], "word");
        assert_eq!(json["status"], "green");

        let sep = serde_json::to_value(RenderToken::Separator {
            text: ", ".to_string(),
        })
        .unwrap();
        assert_eq!(sep["kind"], "separator");
    }

    #[test]
    fn test_list_entry_decided_at_load_boundary() {
        let plain: ListEntry = serde_json::from_str("\"apple\"").unwrap();
        assert_eq!(plain, ListEntry::Plain("apple".to_string()));

        let tagged: ListEntry =
            serde_json::from_str(r#"{"word":"apple","meaning":"苹果"}"#).unwrap();
        assert_eq!(tagged.word(), "apple");
        assert!(matches!(tagged, ListEntry::Tagged(_)));
    }
}
