use std::ops::Range;

use serde::Serialize;

/// What an edit did, for logging and tool responses. Never used for control
/// flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditReport {
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Affected top-level blocks. For deletions this is the removed span in
    /// the original document.
    pub span: Range<usize>,
    /// Set when a missing section was created instead of failing.
    pub created: bool,
    pub blocks_before: usize,
    pub blocks_after: usize,
}

impl EditReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
