//! Statement classification for the execution hot path

use serde::{Deserialize, Serialize};

/// Kind of interpreted statement reported on each check
///
/// Only the distinction between loop/jump statements and everything else
/// matters to the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    For,
    Next,
    Goto,
    Gosub,
    Other,
}

impl StatementKind {
    /// FOR / NEXT / GOTO / GOSUB count towards the loop ceiling
    pub fn is_loop_or_jump(self) -> bool {
        !matches!(self, Self::Other)
    }

    /// Classify a statement keyword, case-insensitively
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_uppercase().as_str() {
            "FOR" => Self::For,
            "NEXT" => Self::Next,
            "GOTO" => Self::Goto,
            "GOSUB" => Self::Gosub,
            _ => Self::Other,
        }
    }
}
