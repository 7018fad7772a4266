use serde::{Deserialize, Serialize};

use crate::block::{Block, Document, MacroParameters};
use crate::error::{ModelError, ModelResult};
use crate::inline::plain_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub content: Vec<Block>,
    #[serde(default = "one")]
    pub row_span: usize,
    #[serde(default = "one")]
    pub col_span: usize,
    /// Written as `<th>`: a row-header cell inside the body.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub header: bool,
}

fn one() -> usize {
    1
}

impl Cell {
    pub fn new(content: Vec<Block>) -> Self {
        Cell {
            content,
            row_span: 1,
            col_span: 1,
            header: false,
        }
    }

    pub fn header(content: Vec<Block>) -> Self {
        Cell {
            header: true,
            ..Cell::new(content)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Cell::new(vec![Block::text(text)])
    }

    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    /// Visible text of the paragraphs in this cell, joined by newlines.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph { spans } => Some(plain_text(spans)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row { cells }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Row::new(texts.into_iter().map(Cell::text).collect())
    }

    /// Columns this row's own cells cover, counting column spans.
    pub fn width(&self) -> usize {
        self.cells.iter().map(|cell| cell.col_span).sum()
    }
}

/// Table whose first header row is kept as plain strings.
///
/// Rows may be ragged; the formatter pads them to the header width on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Presentation attributes of the `<table>` element, kept for write-back.
    #[serde(default, skip_serializing_if = "MacroParameters::is_empty")]
    pub attributes: MacroParameters,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            attributes: MacroParameters::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn cell(&self, row: usize, col: usize) -> ModelResult<&Cell> {
        let cells = &self.row(row)?.cells;
        cells.get(col).ok_or(ModelError::IndexOutOfRange {
            what: "column",
            index: col,
            len: cells.len(),
        })
    }

    pub fn row(&self, row: usize) -> ModelResult<&Row> {
        self.rows.get(row).ok_or(ModelError::IndexOutOfRange {
            what: "row",
            index: row,
            len: self.rows.len(),
        })
    }

    /// Replace the content of an existing cell. The table never grows here.
    pub fn set_cell(&mut self, row: usize, col: usize, content: Vec<Block>) -> ModelResult<()> {
        let row_count = self.rows.len();
        let cells = &mut self
            .rows
            .get_mut(row)
            .ok_or(ModelError::IndexOutOfRange {
                what: "row",
                index: row,
                len: row_count,
            })?
            .cells;
        let cell_count = cells.len();
        let cell = cells.get_mut(col).ok_or(ModelError::IndexOutOfRange {
            what: "column",
            index: col,
            len: cell_count,
        })?;
        cell.content = content;
        Ok(())
    }

    pub fn append_row(&mut self, cells: Vec<Cell>) -> ModelResult<()> {
        self.check_width(&cells)?;
        self.rows.push(Row::new(cells));
        Ok(())
    }

    pub fn insert_row_after(&mut self, row: usize, cells: Vec<Cell>) -> ModelResult<()> {
        self.row(row)?;
        self.check_width(&cells)?;
        self.rows.insert(row + 1, Row::new(cells));
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> ModelResult<Row> {
        self.row(row)?;
        Ok(self.rows.remove(row))
    }

    /// Merge the `row_span` x `col_span` block of cells anchored at
    /// (`row`, `col`). Subsumed cells are removed and their non-empty content
    /// is appended to the anchor.
    pub fn merge_cells(
        &mut self,
        row: usize,
        col: usize,
        row_span: usize,
        col_span: usize,
    ) -> ModelResult<()> {
        if row_span == 0 || col_span == 0 {
            return Err(ModelError::InvalidSpan { row_span, col_span });
        }
        let row_end = row
            .checked_add(row_span)
            .ok_or_else(|| ModelError::IndexOutOfRange {
                what: "row span",
                index: row_span,
                len: self.rows.len(),
            })?;
        let col_end = col
            .checked_add(col_span)
            .ok_or_else(|| ModelError::IndexOutOfRange {
                what: "column span",
                index: col_span,
                len: self.rows.get(row).map_or(0, |cells| cells.cells.len()),
            })?;

        for r in row..row_end {
            for c in col..col_end {
                if self.cell(r, c)?.is_merged() {
                    return Err(ModelError::OverlappingMerge { row: r, col: c });
                }
            }
        }

        let mut merged = Vec::new();
        for r in row..row_end {
            let range = if r == row { col + 1..col_end } else { col..col_end };
            for cell in self.rows[r].cells.drain(range) {
                merged.extend(
                    cell.content
                        .into_iter()
                        .filter(|block| !block.is_empty_paragraph()),
                );
            }
        }

        let anchor = &mut self.rows[row].cells[col];
        anchor.row_span = row_span;
        anchor.col_span = col_span;
        anchor.content.extend(merged);
        Ok(())
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|candidate| candidate.trim() == header.trim())
    }

    /// Index of the first row whose leading cell reads `key`.
    pub fn find_row(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|row| {
            row.cells
                .first()
                .map(|cell| cell.plain_text().trim() == key.trim())
                .unwrap_or(false)
        })
    }

    /// Number of physical cells across all body rows.
    pub fn addressable_cells(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).sum()
    }

    /// Columns occupied in each row, including columns covered by row spans
    /// reaching down from earlier rows.
    pub fn occupied_widths(&self) -> Vec<usize> {
        let mut carried: Vec<(usize, usize)> = Vec::new();
        let mut widths = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let inherited: usize = carried.iter().map(|(_, width)| width).sum();
            widths.push(inherited + row.width());

            carried = carried
                .into_iter()
                .filter_map(|(remaining, width)| (remaining > 1).then(|| (remaining - 1, width)))
                .collect();
            for cell in &row.cells {
                if cell.row_span > 1 {
                    carried.push((cell.row_span - 1, cell.col_span));
                }
            }
        }

        widths
    }

    fn check_width(&self, cells: &[Cell]) -> ModelResult<()> {
        if self.headers.is_empty() || cells.len() == self.headers.len() {
            Ok(())
        } else {
            Err(ModelError::ColumnCountMismatch {
                expected: self.headers.len(),
                actual: cells.len(),
            })
        }
    }
}

/// Position of a table among the document's top-level blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef(pub usize);

impl Document {
    pub fn table(&self, table: TableRef) -> ModelResult<&Table> {
        match self.blocks().get(table.0) {
            Some(Block::Table(found)) => Ok(found),
            Some(_) => Err(ModelError::NotATable { index: table.0 }),
            None => Err(ModelError::IndexOutOfRange {
                what: "block",
                index: table.0,
                len: self.len(),
            }),
        }
    }

    pub fn table_mut(&mut self, table: TableRef) -> ModelResult<&mut Table> {
        let len = self.len();
        match self.blocks_mut().get_mut(table.0) {
            Some(Block::Table(found)) => Ok(found),
            Some(_) => Err(ModelError::NotATable { index: table.0 }),
            None => Err(ModelError::IndexOutOfRange {
                what: "block",
                index: table.0,
                len,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status_table() -> Table {
        Table::new(["Name", "Status"]).with_rows(vec![Row::from_texts(["A", "Open"])])
    }

    #[test]
    fn append_then_delete_keeps_remaining_row() {
        let mut table = status_table();
        table.append_row(Row::from_texts(["B", "Closed"]).cells).unwrap();
        table.delete_row(0).unwrap();
        assert_eq!(table.rows, vec![Row::from_texts(["B", "Closed"])]);
    }

    #[test]
    fn append_rejects_wrong_width() {
        let mut table = status_table();
        let err = table.append_row(Row::from_texts(["only"]).cells).unwrap_err();
        assert_eq!(
            err,
            ModelError::ColumnCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn headerless_tables_accept_any_width() {
        let mut table = Table::default();
        table.append_row(Row::from_texts(["a"]).cells).unwrap();
        table.append_row(Row::from_texts(["a", "b", "c"]).cells).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn set_cell_does_not_grow() {
        let mut table = status_table();
        let err = table.set_cell(0, 2, vec![Block::text("x")]).unwrap_err();
        assert_eq!(
            err,
            ModelError::IndexOutOfRange {
                what: "column",
                index: 2,
                len: 2
            }
        );
        table.set_cell(0, 1, vec![Block::text("Closed")]).unwrap();
        assert_eq!(table.cell(0, 1).unwrap().plain_text(), "Closed");
    }

    #[test]
    fn merge_removes_subsumed_cells() {
        let mut table = Table::new(["a", "b", "c"]).with_rows(vec![
            Row::from_texts(["1", "2", "3"]),
            Row::from_texts(["4", "5", "6"]),
        ]);
        let before = table.addressable_cells();

        table.merge_cells(0, 0, 2, 2).unwrap();

        assert_eq!(table.addressable_cells(), before - 3);
        let anchor = table.cell(0, 0).unwrap();
        assert_eq!((anchor.row_span, anchor.col_span), (2, 2));
        assert_eq!(anchor.plain_text(), "1\n2\n4\n5");
        assert_eq!(table.occupied_widths(), vec![3, 3]);
    }

    #[test]
    fn merge_rejects_overlap() {
        let mut table = Table::new(["a", "b"]).with_rows(vec![
            Row::from_texts(["1", "2"]),
            Row::from_texts(["3", "4"]),
        ]);
        table.merge_cells(0, 0, 1, 2).unwrap();
        let err = table.merge_cells(0, 0, 2, 1).unwrap_err();
        assert_eq!(err, ModelError::OverlappingMerge { row: 0, col: 0 });
    }

    #[test]
    fn merge_with_overflowing_span_is_rejected() {
        let mut table = status_table();
        let err = table.merge_cells(0, 1, 1, usize::MAX).unwrap_err();
        assert_eq!(
            err,
            ModelError::IndexOutOfRange {
                what: "column span",
                index: usize::MAX,
                len: 2
            }
        );
        let err = table.merge_cells(usize::MAX, 0, 2, 1).unwrap_err();
        assert!(matches!(err, ModelError::IndexOutOfRange { what: "row span", .. }));
        assert_eq!(table, status_table());
    }

    #[test]
    fn set_cell_keeps_row_header_flag() {
        let mut table = Table::new(["k", "v"]).with_rows(vec![Row::new(vec![
            Cell::header(vec![Block::text("a")]),
            Cell::text("1"),
        ])]);
        table.set_cell(0, 0, vec![Block::text("b")]).unwrap();
        assert!(table.cell(0, 0).unwrap().header);
        assert_eq!(table.cell(0, 0).unwrap().plain_text(), "b");
    }

    #[test]
    fn document_table_access_checks_kind() {
        let mut doc = Document::from_blocks(vec![Block::text("x"), status_table().into()]);
        assert_eq!(
            doc.table(TableRef(0)).unwrap_err(),
            ModelError::NotATable { index: 0 }
        );
        doc.table_mut(TableRef(1))
            .unwrap()
            .append_row(Row::from_texts(["B", "Closed"]).cells)
            .unwrap();
        assert_eq!(doc.table(TableRef(1)).unwrap().rows.len(), 2);
    }
}
