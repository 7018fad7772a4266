//! Typed in-memory representation of wiki page content.
//!
//! A [`Document`] owns an ordered sequence of top-level [`Block`]s. Blocks nest
//! (lists, tables, panels, quotes, macro bodies) but never share children and
//! never point back at their parents, so every edit is a plain mutation of an
//! owned tree. Construction helpers validate the structural constraints that
//! the formatter relies on; ragged table rows are deliberately allowed.

pub mod block;
pub mod error;
pub mod inline;
pub mod list;
pub mod table;
pub mod visit;

pub use block::{
    anchor_id, normalize_title, Block, CodeBlock, Document, Heading, HeadingLevel, Macro,
    MacroBody, MacroForm, MacroParameters, OutlineEntry, Panel, PanelKind, Status, StatusColor,
    MAX_TOC_LEVEL,
};
pub use error::{ModelError, ModelResult};
pub use inline::{normalize_spans, plain_text, InlineSpan, LinkTarget};
pub use list::{List, ListItem, ListRef};
pub use table::{Cell, Row, Table, TableRef};
pub use visit::{visit_text, visit_text_mut, Node, Walk};
