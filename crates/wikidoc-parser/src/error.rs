use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Structurally unbalanced input. `offset` is the byte position of the
    /// construct that could not be closed or matched.
    #[error("malformed markup at byte {offset}: {message}")]
    MalformedMarkup { offset: usize, message: String },
}

impl ParseError {
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        ParseError::MalformedMarkup {
            offset,
            message: message.into(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
