//! Read-modify-write editing of wiki pages.
//!
//! [`apply_edit`] parses storage markup into a [`wikidoc_model::Document`],
//! applies one [`Operation`] and formats the result. Everything is a pure
//! computation: no I/O, no retries, and the caller's version token is passed
//! through untouched for the transport layer's optimistic locking.

pub mod diff;
pub mod engine;
pub mod error;
pub mod payload;
pub mod report;
pub mod section;
pub mod version;

pub use engine::{
    apply_edit, apply_to_document, BlockLocator, EditOptions, EditOutcome, EditRequest,
    ListEdit, Operation, TableEdit, TocPosition,
};
pub use error::{EditError, EditResult, ErrorKind};
pub use payload::{load_content, ContentSource};
pub use report::EditReport;
pub use section::{
    append_to_section, delete_section, insert_section, locate, move_section, rename_section,
    replace_section_content, resolve, section_at, sections, InsertPosition, MovePosition,
    Section, SectionQuery,
};
pub use version::VersionToken;
