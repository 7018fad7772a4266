use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};
use wikidoc_config::{Config, EditSettings, FormatSettings, TemplateSettings};
use wikidoc_format::Renderer;
use wikidoc_model::{
    Block, Cell, Document, Heading, InlineSpan, ListItem, ListRef, Table, TableRef,
};
use wikidoc_template::{Template, TemplateEngine};

use crate::diff::build_unified_diff;
use crate::error::{EditError, EditResult};
use crate::payload::{load_content, ContentSource};
use crate::report::EditReport;
use crate::section::{
    append_to_section, delete_section, insert_section, locate, move_section, rename_section,
    replace_section_content, resolve, InsertPosition, MovePosition, SectionQuery,
};
use crate::version::VersionToken;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOptions {
    pub edit: EditSettings,
    pub format: FormatSettings,
    pub template: TemplateSettings,
}

impl EditOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            edit: config.edit.clone(),
            format: config.format.clone(),
            template: config.template.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub markup: String,
    pub version: Option<VersionToken>,
    pub operation: Operation,
    pub options: EditOptions,
}

impl EditRequest {
    pub fn new(markup: impl Into<String>, operation: Operation) -> Self {
        Self {
            markup: markup.into(),
            version: None,
            operation,
            options: EditOptions::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<VersionToken>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_options(mut self, options: EditOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    ReplaceSection {
        query: SectionQuery,
        content: ContentSource,
    },
    RenameSection {
        query: SectionQuery,
        new_title: String,
        #[serde(default)]
        new_level: Option<u8>,
    },
    DeleteSection {
        query: SectionQuery,
        #[serde(default)]
        keep_content: bool,
    },
    MoveSection {
        query: SectionQuery,
        target: SectionQuery,
        #[serde(default)]
        position: MovePosition,
    },
    AppendToSection {
        query: SectionQuery,
        content: ContentSource,
    },
    InsertSection {
        title: String,
        #[serde(default)]
        level: Option<u8>,
        content: ContentSource,
        #[serde(default)]
        position: InsertPosition,
    },
    SetStatus {
        label: String,
        color: String,
    },
    AddTableOfContents {
        min_level: u8,
        max_level: u8,
        #[serde(default)]
        position: TocPosition,
    },
    Table {
        #[serde(default)]
        locator: BlockLocator,
        edit: TableEdit,
    },
    List {
        #[serde(default)]
        locator: BlockLocator,
        edit: ListEdit,
    },
    /// Instantiate a template and append its blocks to a section, or to the
    /// end of the document when no section is named.
    InsertTemplate {
        template: Template,
        #[serde(default)]
        values: HashMap<String, String>,
        #[serde(default)]
        section: Option<SectionQuery>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReplaceSection { .. } => "replace_section",
            Operation::RenameSection { .. } => "rename_section",
            Operation::DeleteSection { .. } => "delete_section",
            Operation::MoveSection { .. } => "move_section",
            Operation::AppendToSection { .. } => "append_to_section",
            Operation::InsertSection { .. } => "insert_section",
            Operation::SetStatus { .. } => "set_status",
            Operation::AddTableOfContents { .. } => "add_table_of_contents",
            Operation::Table { .. } => "table",
            Operation::List { .. } => "list",
            Operation::InsertTemplate { .. } => "insert_template",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            Operation::ReplaceSection { query, .. }
            | Operation::RenameSection { query, .. }
            | Operation::DeleteSection { query, .. }
            | Operation::MoveSection { query, .. }
            | Operation::AppendToSection { query, .. } => Some(query.to_string()),
            Operation::InsertSection { title, .. } => Some(title.clone()),
            Operation::Table { locator, .. } | Operation::List { locator, .. } => {
                locator.section.as_ref().map(ToString::to_string)
            }
            Operation::InsertTemplate { section, .. } => section.as_ref().map(ToString::to_string),
            Operation::SetStatus { .. } | Operation::AddTableOfContents { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TocPosition {
    #[default]
    Top,
    Bottom,
}

/// The `ordinal`-th top-level block of a kind, counted within a section's
/// body or across the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocator {
    #[serde(default)]
    pub section: Option<SectionQuery>,
    #[serde(default)]
    pub ordinal: usize,
}

impl BlockLocator {
    pub fn in_section(query: SectionQuery) -> Self {
        Self {
            section: Some(query),
            ordinal: 0,
        }
    }

    fn section_title(&self) -> Option<String> {
        self.section.as_ref().map(|query| query.title.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableEdit {
    SetCell {
        row: usize,
        col: usize,
        content: Vec<Block>,
    },
    AppendRow {
        cells: Vec<Cell>,
    },
    InsertRowAfter {
        row: usize,
        cells: Vec<Cell>,
    },
    DeleteRow {
        row: usize,
    },
    MergeCells {
        row: usize,
        col: usize,
        row_span: usize,
        col_span: usize,
    },
    /// Find the row whose first cell reads `key` and overwrite cells by
    /// header name.
    UpdateRowByKey {
        key: String,
        values: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListEdit {
    /// Creates an unordered list at the end of the scope when it has none.
    AppendItem {
        item: ListItem,
    },
    InsertItemAt {
        index: usize,
        item: ListItem,
    },
    RemoveItemAt {
        index: usize,
    },
    SetItemContent {
        index: usize,
        spans: Vec<InlineSpan>,
    },
    SetOrdered {
        ordered: bool,
    },
    Renumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub markup: String,
    /// The request's version token, untouched.
    pub version: Option<VersionToken>,
    pub changed: bool,
    pub diff: Option<String>,
    pub report: EditReport,
}

/// Parse, edit and re-serialize one page body.
///
/// `changed` and `diff` compare against the input as the formatter would
/// write it, so normalization of untouched markup does not count as a change.
pub fn apply_edit(request: EditRequest) -> EditResult<EditOutcome> {
    let mut document = wikidoc_parser::parse(&request.markup)?;
    let renderer = Renderer::new(request.options.format.clone());
    let baseline = renderer.render_document(&document);

    let report = apply_to_document(&mut document, &request.operation, &request.options)?;
    let markup = renderer.render_document(&document);
    let changed = markup != baseline;

    let diff = if request.options.edit.diff {
        let label = match &request.version {
            Some(version) => format!("page@{version}"),
            None => "page".to_string(),
        };
        build_unified_diff(&baseline, &markup, &label)
    } else {
        None
    };

    Ok(EditOutcome {
        markup,
        version: request.version,
        changed,
        diff,
        report,
    })
}

/// Apply one operation to a document held in memory. On error the document
/// is left as it was.
pub fn apply_to_document(
    document: &mut Document,
    operation: &Operation,
    options: &EditOptions,
) -> EditResult<EditReport> {
    let settings = &options.edit;
    let blocks_before = document.len();
    let mut created = false;

    let span = match operation {
        Operation::ReplaceSection { query, content } => {
            let content = load_content(content)?;
            created = locate(document, query).is_none();
            replace_section_content(document, query, content, settings)?.span()
        }
        Operation::RenameSection {
            query,
            new_title,
            new_level,
        } => rename_section(document, query, new_title, *new_level, settings)?.span(),
        Operation::DeleteSection {
            query,
            keep_content,
        } => delete_section(document, query, *keep_content, settings)?.span(),
        Operation::MoveSection {
            query,
            target,
            position,
        } => move_section(document, query, target, *position, settings)?.span(),
        Operation::AppendToSection { query, content } => {
            let content = load_content(content)?;
            created = locate(document, query).is_none();
            append_to_section(document, query, content, settings)?.span()
        }
        Operation::InsertSection {
            title,
            level,
            content,
            position,
        } => {
            let heading = Heading::new(
                level.unwrap_or(settings.new_section_level),
                title.as_str(),
            )?;
            let content = load_content(content)?;
            insert_section(document, heading, content, position, settings)?.span()
        }
        Operation::SetStatus { label, color } => set_status(document, label, color)?,
        Operation::AddTableOfContents {
            min_level,
            max_level,
            position,
        } => add_table_of_contents(document, *min_level, *max_level, *position)?,
        Operation::Table { locator, edit } => edit_table(document, locator, edit, settings)?,
        Operation::List { locator, edit } => edit_list(document, locator, edit, settings)?,
        Operation::InsertTemplate {
            template,
            values,
            section,
        } => {
            let blocks = TemplateEngine::new(options.template.clone())
                .instantiate(template, values)?
                .into_blocks();
            match section {
                Some(query) => {
                    created = locate(document, query).is_none();
                    append_to_section(document, query, blocks, settings)?.span()
                }
                None => {
                    let start = document.len();
                    document.blocks_mut().extend(blocks);
                    start..document.len()
                }
            }
        }
    };

    let report = EditReport {
        operation: operation.name(),
        target: operation.target(),
        span,
        created,
        blocks_before,
        blocks_after: document.len(),
    };
    debug!(
        "applied {} to {} (blocks {}..{}, {} -> {} top-level blocks)",
        report.operation,
        report.target.as_deref().unwrap_or("document"),
        report.span.start,
        report.span.end,
        report.blocks_before,
        report.blocks_after
    );
    Ok(report)
}

/// Replace the first top-level status lozenge, or insert one right after the
/// first heading (at the top when there is none).
fn set_status(document: &mut Document, label: &str, color: &str) -> EditResult<Range<usize>> {
    let status = Block::status(label, color)?;
    let blocks = document.blocks_mut();

    let index = match blocks.iter().position(|block| matches!(block, Block::Status(_))) {
        Some(index) => {
            blocks[index] = status;
            index
        }
        None => {
            let index = blocks
                .iter()
                .position(|block| block.as_heading().is_some())
                .map_or(0, |heading| heading + 1);
            blocks.insert(index, status);
            index
        }
    };
    Ok(index..index + 1)
}

/// An existing top-level table of contents is updated in place; otherwise a
/// new one goes to the top or bottom of the page.
fn add_table_of_contents(
    document: &mut Document,
    min_level: u8,
    max_level: u8,
    position: TocPosition,
) -> EditResult<Range<usize>> {
    let toc = Block::table_of_contents(min_level, max_level)?;
    let blocks = document.blocks_mut();

    let index = match blocks
        .iter()
        .position(|block| matches!(block, Block::TableOfContents { .. }))
    {
        Some(index) => {
            blocks[index] = toc;
            index
        }
        None => match position {
            TocPosition::Top => {
                blocks.insert(0, toc);
                0
            }
            TocPosition::Bottom => {
                blocks.push(toc);
                blocks.len() - 1
            }
        },
    };
    Ok(index..index + 1)
}

/// Scope searched by a locator and the index of the matching block in it.
fn find_block(
    document: &Document,
    locator: &BlockLocator,
    settings: &EditSettings,
    wanted: fn(&Block) -> bool,
) -> EditResult<(Range<usize>, Option<usize>)> {
    let scope = match &locator.section {
        Some(query) => resolve(document, query, settings.suggestion_threshold)?.body(),
        None => 0..document.len(),
    };

    let found = document.blocks()[scope.clone()]
        .iter()
        .enumerate()
        .filter(|(_, block)| wanted(block))
        .nth(locator.ordinal)
        .map(|(offset, _)| scope.start + offset);
    Ok((scope, found))
}

fn edit_table(
    document: &mut Document,
    locator: &BlockLocator,
    edit: &TableEdit,
    settings: &EditSettings,
) -> EditResult<Range<usize>> {
    let (_, found) = find_block(document, locator, settings, |block| {
        matches!(block, Block::Table(_))
    })?;
    let index = found.ok_or_else(|| EditError::TableNotFound {
        section: locator.section_title(),
        ordinal: locator.ordinal,
    })?;

    let table = document.table_mut(TableRef(index))?;
    match edit {
        TableEdit::SetCell { row, col, content } => table.set_cell(*row, *col, content.clone())?,
        TableEdit::AppendRow { cells } => table.append_row(cells.clone())?,
        TableEdit::InsertRowAfter { row, cells } => table.insert_row_after(*row, cells.clone())?,
        TableEdit::DeleteRow { row } => {
            table.delete_row(*row)?;
        }
        TableEdit::MergeCells {
            row,
            col,
            row_span,
            col_span,
        } => table.merge_cells(*row, *col, *row_span, *col_span)?,
        TableEdit::UpdateRowByKey { key, values } => update_row_by_key(table, key, values)?,
    }
    Ok(index..index + 1)
}

/// All headers are checked before any cell is written.
fn update_row_by_key(
    table: &mut Table,
    key: &str,
    values: &BTreeMap<String, String>,
) -> EditResult<()> {
    let row = table.find_row(key).ok_or_else(|| EditError::RowNotFound {
        key: key.to_string(),
    })?;

    let mut updates = Vec::with_capacity(values.len());
    for (header, value) in values {
        let col = table
            .column_index(header)
            .ok_or_else(|| EditError::ColumnNotFound {
                header: header.clone(),
            })?;
        table.cell(row, col)?;
        updates.push((col, value));
    }

    for (col, value) in updates {
        table.set_cell(row, col, vec![Block::text(value.as_str())])?;
    }
    Ok(())
}

fn edit_list(
    document: &mut Document,
    locator: &BlockLocator,
    edit: &ListEdit,
    settings: &EditSettings,
) -> EditResult<Range<usize>> {
    let (scope, found) = find_block(document, locator, settings, |block| {
        matches!(block, Block::List(_))
    })?;

    let index = match (found, edit) {
        (Some(index), _) => index,
        (None, ListEdit::AppendItem { item }) if locator.ordinal == 0 => {
            let at = scope.end;
            document
                .blocks_mut()
                .insert(at, Block::list(false, vec![item.clone()]));
            return Ok(at..at + 1);
        }
        (None, _) => {
            return Err(EditError::ListNotFound {
                section: locator.section_title(),
                ordinal: locator.ordinal,
            })
        }
    };

    let list = document.list_mut(ListRef(index))?;
    match edit {
        ListEdit::AppendItem { item } => list.append_item(item.clone()),
        ListEdit::InsertItemAt { index, item } => list.insert_item_at(*index, item.clone())?,
        ListEdit::RemoveItemAt { index } => {
            list.remove_item_at(*index)?;
        }
        ListEdit::SetItemContent { index, spans } => {
            list.set_item_content(*index, spans.clone())?
        }
        ListEdit::SetOrdered { ordered } => list.set_ordered(*ordered),
        ListEdit::Renumber => list.renumber(),
    }
    Ok(index..index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(markup: &str, operation: Operation) -> EditRequest {
        EditRequest::new(markup, operation)
    }

    #[test]
    fn appends_to_section() {
        let outcome = apply_edit(request(
            "<h1>Heading</h1><p>Body</p>",
            Operation::AppendToSection {
                query: SectionQuery::new("Heading"),
                content: ContentSource::Markup("<p>New line</p>".into()),
            },
        ))
        .unwrap();
        assert!(outcome.changed);
        assert!(outcome.markup.contains("<p>Body</p>\n<p>New line</p>\n"));
        assert_eq!(outcome.report.span, 0..3);
    }

    #[test]
    fn normalization_alone_is_not_a_change() {
        let outcome = apply_edit(request(
            "<h2>Status</h2><p>x</p>",
            Operation::SetStatus {
                label: "DONE".into(),
                color: "green".into(),
            },
        ))
        .unwrap();
        assert!(outcome.changed);

        let again = apply_edit(request(
            &outcome.markup,
            Operation::SetStatus {
                label: "DONE".into(),
                color: "Green".into(),
            },
        ))
        .unwrap();
        assert!(!again.changed);
        assert!(again.diff.is_none());
        assert_eq!(again.markup, outcome.markup);
    }
}
