use pretty_assertions::assert_eq;
use wikidoc_config::FormatSettings;
use wikidoc_format::{format, Renderer};
use wikidoc_model::{Block, Cell, Document, LinkTarget, List, ListItem, MacroForm, Row, Table};
use wikidoc_parser::{parse, ParseError};
use wikidoc_test_support::{kitchen_sink, overview_details, STORED_PAGE};

#[test]
fn constructed_documents_survive_format_then_parse() {
    for doc in [kitchen_sink(), overview_details(), Document::new()] {
        let markup = format(&doc);
        let parsed = parse(&markup).unwrap();
        assert_eq!(parsed, doc, "round trip changed document for:\n{markup}");
    }
}

/// Blocks that render inline-level markup, placed next to each other and as
/// the first child of list items.
fn adjacent_inline_blocks() -> Document {
    let url = || Block::link("site", LinkTarget::Url("https://example.com".into()));
    let page = || Block::link("guide", LinkTarget::Page("Guide".into()));

    let mut row_headed = Table::new(["Key", "Value"]);
    row_headed
        .append_row(vec![Cell::header(vec![Block::text("a")]), Cell::text("1")])
        .unwrap();

    Document::from_blocks(vec![
        url(),
        page(),
        Block::text("between"),
        page(),
        Block::List(List::bulleted(vec![
            ListItem::text("x").with_children(vec![url()]),
            ListItem::new(Vec::new()).with_children(vec![page(), url()]),
            ListItem::text(" "),
            ListItem::text("plain"),
        ])),
        row_headed.into(),
    ])
}

#[test]
fn adjacent_inline_blocks_round_trip() {
    let doc = adjacent_inline_blocks();
    let compact = Renderer::new(FormatSettings {
        line_breaks: false,
        pad_ragged_rows: true,
    });

    for markup in [format(&doc), compact.render_document(&doc)] {
        let parsed = parse(&markup).unwrap();
        assert_eq!(parsed, doc, "round trip changed document for:\n{markup}");
    }

    let once = format(&doc);
    assert_eq!(format(&parse(&once).unwrap()), once);
}

#[test]
fn heading_with_embedded_elements_is_written_back_verbatim() {
    let source = concat!(
        "<h2><ac:structured-macro ac:name=\"anchor\">",
        "<ac:parameter ac:name=\"\">intro</ac:parameter></ac:structured-macro>",
        "Intro <ac:emoticon ac:name=\"smile\"/></h2>"
    );
    let doc = parse(source).unwrap();

    let heading = doc.blocks()[0].as_heading().unwrap();
    assert_eq!(heading.normalized(), "Intro");
    assert_eq!(format(&doc), format!("{source}\n"));
}

#[test]
fn row_header_cells_stay_header_cells() {
    let source = concat!(
        "<table><tbody><tr><th>Key</th><th>Value</th></tr>",
        "<tr><th>a</th><td>1</td></tr></tbody></table>"
    );
    let doc = parse(source).unwrap();
    let table = doc.blocks()[0].as_table().unwrap();
    assert!(table.cell(0, 0).unwrap().header);
    assert!(!table.cell(0, 1).unwrap().header);

    let markup = format(&doc);
    assert!(markup.contains("<tr><th><p>a</p>\n</th><td><p>1</p>\n</td></tr>"), "{markup}");
}

#[test]
fn compact_output_round_trips_too() {
    let renderer = Renderer::new(FormatSettings {
        line_breaks: false,
        pad_ragged_rows: true,
    });
    let doc = kitchen_sink();
    assert_eq!(parse(&renderer.render_document(&doc)).unwrap(), doc);
}

#[test]
fn formatting_is_idempotent() {
    let doc = kitchen_sink();
    let once = format(&doc);
    let twice = format(&parse(&once).unwrap());
    assert_eq!(twice, once);

    let stored = format(&parse(STORED_PAGE).unwrap());
    assert_eq!(format(&parse(&stored).unwrap()), stored);
}

#[test]
fn stored_page_keeps_untyped_markup() {
    let markup = format(&parse(STORED_PAGE).unwrap());

    for fragment in [
        "<ac:emoticon ac:name=\"smile\" />",
        "<span style=\"color: red;\">release</span>",
        "<ac:image><ri:attachment ri:filename=\"chart.png\" /></ac:image>",
        "<p style=\"text-align: center;\">centered</p>",
        "<custom-widget foo=\"1\"/>",
        "<ac:parameter ac:name=\"maxLevel\">3</ac:parameter>",
        "<table class=\"wrapped\">",
        "<ac:structured-macro ac:name=\"info\"><ac:rich-text-body><p>Upgrade soon.</p>",
    ] {
        assert!(markup.contains(fragment), "missing {fragment} in:\n{markup}");
    }
}

#[test]
fn unknown_element_is_reproduced_verbatim() {
    let source = "<custom-widget foo=\"1\"/>";
    let doc = parse(source).unwrap();

    match &doc.blocks()[0] {
        Block::Macro(mac) => {
            assert_eq!(mac.name, "custom-widget");
            assert_eq!(mac.form, MacroForm::Element);
            assert_eq!(mac.parameters.get("foo"), Some("1"));
        }
        other => panic!("expected generic macro, got {other:?}"),
    }
    assert_eq!(format(&doc).trim_end(), source);
}

#[test]
fn padded_rows_stabilise_after_one_pass() {
    let table = Table::new(["A", "B"]).with_rows(vec![Row::from_texts(["only"])]);
    let doc = Document::from_blocks(vec![table.into()]);

    let first = format(&doc);
    let reparsed = parse(&first).unwrap();
    assert_eq!(reparsed.blocks()[0].as_table().unwrap().rows[0].cells.len(), 2);
    assert_eq!(format(&reparsed), first);
}

#[test]
fn unbalanced_markup_is_rejected() {
    for source in ["<p>open", "<ul><li>x</ul>", "</p>", "<p>a</p><![CDATA[never closed"] {
        assert!(
            matches!(parse(source), Err(ParseError::MalformedMarkup { .. })),
            "expected failure for {source}"
        );
    }
}
