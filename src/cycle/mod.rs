//! Status cycle engine.
//!
//! Pure transition logic for the click-driven learning cycle and the
//! explicit radial-menu actions. No IO, no clocks; callers own when a
//! transition is applied and persisted.

use serde::{Deserialize, Serialize};

use crate::types::WordStatus;

/// Next status for a tap on a word.
///
/// The dominant interaction across the app: a closed 4-cycle. A word with
/// no entry starts from `White`, so the first tap always yields `Red` (the
/// first-discovery transition).
pub fn next_status(current: WordStatus) -> WordStatus {
    match current {
        WordStatus::White => WordStatus::Red,
        WordStatus::Red => WordStatus::Yellow,
        WordStatus::Yellow => WordStatus::Green,
        WordStatus::Green => WordStatus::White,
    }
}

/// Radial-menu action bound to a drag direction.
///
/// Menu actions are explicit, never cyclic: `Reset` forces `White`
/// (equivalent to removing the entry), `MarkImportant` toggles the starred
/// tag without touching the underlying cycle status, and the rest leave
/// vocabulary state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    /// Open the word detail surface. No state change.
    Detail,
    /// Pronounce the word. No state change.
    Listen,
    /// Save the surrounding sentence. No state change.
    SaveSentence,
    /// Remove the entry (forces `White`).
    Reset,
    /// Toggle the important tag.
    MarkImportant,
}

impl MenuAction {
    /// Status forced by this action, if any.
    pub fn forced_status(&self) -> Option<WordStatus> {
        match self {
            MenuAction::Reset => Some(WordStatus::White),
            _ => None,
        }
    }

    pub fn mutates_vocabulary(&self) -> bool {
        matches!(self, MenuAction::Reset | MenuAction::MarkImportant)
    }
}
