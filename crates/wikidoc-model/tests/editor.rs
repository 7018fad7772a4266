use pretty_assertions::assert_eq;
use wikidoc_model::{
    Block, Cell, Document, InlineSpan, List, ListItem, ListRef, ModelError, Row, Table, TableRef,
};

fn status_document() -> Document {
    let table = Table::new(["Name", "Status"]).with_rows(vec![Row::from_texts(["A", "Open"])]);
    Document::from_blocks(vec![Block::heading(2, "Tracker").unwrap(), table.into()])
}

#[test]
fn append_then_delete_leaves_only_new_row() {
    let mut doc = status_document();
    let table = doc.table_mut(TableRef(1)).unwrap();

    table
        .append_row(vec![Cell::text("B"), Cell::text("Closed")])
        .unwrap();
    table.delete_row(0).unwrap();

    assert_eq!(
        doc.table(TableRef(1)).unwrap().rows,
        vec![Row::from_texts(["B", "Closed"])]
    );
}

#[test]
fn insert_row_after_last_row_appends() {
    let mut doc = status_document();
    let table = doc.table_mut(TableRef(1)).unwrap();
    table
        .insert_row_after(0, Row::from_texts(["C", "Blocked"]).cells)
        .unwrap();
    assert_eq!(table.find_row("C"), Some(1));
    assert!(matches!(
        table.insert_row_after(5, Row::from_texts(["D", "?"]).cells),
        Err(ModelError::IndexOutOfRange { what: "row", .. })
    ));
}

#[test]
fn merge_accounts_for_every_subsumed_cell() {
    for (row_span, col_span) in [(1, 1), (1, 2), (2, 1), (2, 3), (3, 3)] {
        let rows = (0..3)
            .map(|r| Row::from_texts((0..3).map(|c| format!("{r}{c}"))))
            .collect();
        let mut table = Table::new(["a", "b", "c"]).with_rows(rows);
        let before = table.addressable_cells();

        table.merge_cells(0, 0, row_span, col_span).unwrap();

        let merged_in = row_span * col_span - 1;
        assert_eq!(table.addressable_cells(), before - merged_in);

        let anchor = table.cell(0, 0).unwrap();
        let expected: Vec<String> = (0..row_span)
            .flat_map(|r| (0..col_span).map(move |c| format!("{r}{c}")))
            .collect();
        assert_eq!(anchor.plain_text(), expected.join("\n"));
        assert!(table.occupied_widths().iter().all(|width| *width == 3));
    }
}

#[test]
fn merge_beyond_extent_fails_without_mutation() {
    let mut table = Table::new(["a", "b"]).with_rows(vec![Row::from_texts(["1", "2"])]);
    let snapshot = table.clone();

    let err = table.merge_cells(0, 1, 1, 2).unwrap_err();

    assert_eq!(
        err,
        ModelError::IndexOutOfRange {
            what: "column",
            index: 2,
            len: 2
        }
    );
    assert_eq!(table, snapshot);
    assert_eq!(
        table.merge_cells(0, 0, 0, 1).unwrap_err(),
        ModelError::InvalidSpan {
            row_span: 0,
            col_span: 1
        }
    );
}

#[test]
fn toggling_order_rewrites_only_the_flag() {
    let mut doc = Document::from_blocks(vec![Block::List(List::bulleted(vec![
        ListItem::text("first"),
        ListItem::text("second"),
    ]))]);
    let list = doc.list_mut(ListRef(0)).unwrap();
    let items = list.items.clone();

    list.set_ordered(true);
    list.append_item(ListItem::new(vec![
        InlineSpan::text("third "),
        InlineSpan::code("x"),
    ]));
    list.renumber();

    let list = doc.list(ListRef(0)).unwrap();
    assert!(list.ordered);
    assert_eq!(&list.items[..2], &items[..]);
    assert_eq!(list.items[2].plain_text(), "third x");
}

#[test]
fn walk_reports_nested_cell_blocks() {
    let mut table = Table::new(["k"]);
    table
        .append_row(vec![Cell::new(vec![Block::List(List::bulleted(vec![
            ListItem::text("inside"),
        ]))])])
        .unwrap();
    let doc = Document::from_blocks(vec![table.into()]);

    let deepest = doc.walk().map(|(_, depth)| depth).max();
    assert_eq!(deepest, Some(4));
}
