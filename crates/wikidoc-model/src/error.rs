use thiserror::Error;

/// Structural violations raised by block constructors and the table/list editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("level {level} is outside the allowed range {min}..={max}")]
    InvalidLevel { level: u8, min: u8, max: u8 },

    #[error("unknown panel kind '{kind}' (expected info, warning, note, success or error)")]
    InvalidPanelKind { kind: String },

    #[error("unknown status colour '{color}' (expected grey, red, yellow, green or blue)")]
    InvalidStatusColor { color: String },

    #[error("{what} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("row has {actual} cells but the table declares {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("cell ({row}, {col}) already belongs to a merged region")]
    OverlappingMerge { row: usize, col: usize },

    #[error("merge spans must be at least 1x1 (received {row_span}x{col_span})")]
    InvalidSpan { row_span: usize, col_span: usize },

    #[error("block {index} is not a table")]
    NotATable { index: usize },

    #[error("block {index} is not a list")]
    NotAList { index: usize },
}

pub type ModelResult<T> = Result<T, ModelError>;
