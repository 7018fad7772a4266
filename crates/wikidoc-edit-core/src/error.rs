use thiserror::Error;
use wikidoc_model::ModelError;
use wikidoc_parser::ParseError;
use wikidoc_template::TemplateError;

/// Flat classification of every failure the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidLevel,
    InvalidPanelKind,
    InvalidStatusColor,
    IndexOutOfRange,
    ColumnCountMismatch,
    OverlappingMerge,
    InvalidSpan,
    NotATable,
    NotAList,
    MalformedMarkup,
    SectionNotFound,
    CyclicMove,
    TableNotFound,
    ListNotFound,
    RowNotFound,
    ColumnNotFound,
    MissingTemplateParameter,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidLevel => "invalid_level",
            Self::InvalidPanelKind => "invalid_panel_kind",
            Self::InvalidStatusColor => "invalid_status_color",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::ColumnCountMismatch => "column_count_mismatch",
            Self::OverlappingMerge => "overlapping_merge",
            Self::InvalidSpan => "invalid_span",
            Self::NotATable => "not_a_table",
            Self::NotAList => "not_a_list",
            Self::MalformedMarkup => "malformed_markup",
            Self::SectionNotFound => "section_not_found",
            Self::CyclicMove => "cyclic_move",
            Self::TableNotFound => "table_not_found",
            Self::ListNotFound => "list_not_found",
            Self::RowNotFound => "row_not_found",
            Self::ColumnNotFound => "column_not_found",
            Self::MissingTemplateParameter => "missing_template_parameter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error(
        "section '{title}'{} not found{}",
        level_suffix(.level),
        suggestion_suffix(.suggestion)
    )]
    SectionNotFound {
        title: String,
        level: Option<u8>,
        suggestion: Option<String>,
    },

    #[error("cannot move section '{title}' relative to '{target}', which lies inside it")]
    CyclicMove { title: String, target: String },

    #[error("table #{ordinal} not found in {}", scope_label(.section))]
    TableNotFound {
        section: Option<String>,
        ordinal: usize,
    },

    #[error("list #{ordinal} not found in {}", scope_label(.section))]
    ListNotFound {
        section: Option<String>,
        ordinal: usize,
    },

    #[error("no table row has '{key}' in its first cell")]
    RowNotFound { key: String },

    #[error("table has no column headed '{header}'")]
    ColumnNotFound { header: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SectionNotFound { .. } => ErrorKind::SectionNotFound,
            Self::CyclicMove { .. } => ErrorKind::CyclicMove,
            Self::TableNotFound { .. } => ErrorKind::TableNotFound,
            Self::ListNotFound { .. } => ErrorKind::ListNotFound,
            Self::RowNotFound { .. } => ErrorKind::RowNotFound,
            Self::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            Self::Model(err) => match err {
                ModelError::InvalidLevel { .. } => ErrorKind::InvalidLevel,
                ModelError::InvalidPanelKind { .. } => ErrorKind::InvalidPanelKind,
                ModelError::InvalidStatusColor { .. } => ErrorKind::InvalidStatusColor,
                ModelError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
                ModelError::ColumnCountMismatch { .. } => ErrorKind::ColumnCountMismatch,
                ModelError::OverlappingMerge { .. } => ErrorKind::OverlappingMerge,
                ModelError::InvalidSpan { .. } => ErrorKind::InvalidSpan,
                ModelError::NotATable { .. } => ErrorKind::NotATable,
                ModelError::NotAList { .. } => ErrorKind::NotAList,
            },
            Self::Parse(ParseError::MalformedMarkup { .. }) => ErrorKind::MalformedMarkup,
            Self::Template(TemplateError::MissingTemplateParameter { .. }) => {
                ErrorKind::MissingTemplateParameter
            }
        }
    }
}

fn level_suffix(level: &Option<u8>) -> String {
    match level {
        Some(level) => format!(" at level {level}"),
        None => String::new(),
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(title) => format!(". Did you mean '{title}'?"),
        None => String::new(),
    }
}

fn scope_label(section: &Option<String>) -> String {
    match section {
        Some(title) => format!("section '{title}'"),
        None => "the document".to_string(),
    }
}

pub type EditResult<T> = Result<T, EditError>;
