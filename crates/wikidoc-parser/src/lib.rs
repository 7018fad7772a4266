//! Storage-markup parser that recovers a [`Document`] for read-modify-write
//! edits.
//!
//! Parsing fails only on structurally unbalanced input. Unknown elements are
//! never an error: they come back as generic macros (or raw inline spans)
//! holding their original markup, so `format(parse(markup))` keeps them.

mod convert;
pub mod error;
mod tree;

use wikidoc_model::{Block, Document, InlineSpan};

pub use error::{ParseError, ParseResult};

use crate::convert::Converter;

/// Parse a complete page body.
pub fn parse(markup: &str) -> ParseResult<Document> {
    parse_fragment(markup).map(Document::from_blocks)
}

/// Parse a markup fragment in block context, e.g. replacement section content.
pub fn parse_fragment(markup: &str) -> ParseResult<Vec<Block>> {
    let nodes = tree::build(markup)?;
    Ok(Converter::new(markup).blocks(&nodes))
}

/// Parse a markup fragment in inline context, as found inside `<p>`.
pub fn parse_inline(markup: &str) -> ParseResult<Vec<InlineSpan>> {
    let nodes = tree::build(markup)?;
    Ok(Converter::new(markup).spans(&nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wikidoc_model::{LinkTarget, MacroBody, MacroForm, StatusColor};

    #[test]
    fn loose_text_becomes_a_paragraph() {
        let doc = parse("hello <strong>world</strong>").unwrap();
        assert_eq!(
            doc.blocks(),
            &[Block::paragraph(vec![
                InlineSpan::text("hello "),
                InlineSpan::bold("world")
            ])]
        );
    }

    #[test]
    fn lone_link_becomes_link_block() {
        let doc = parse("<h2>Refs</h2>\n<a href=\"https://example.com\">site</a>\n").unwrap();
        assert_eq!(
            doc.blocks()[1],
            Block::link("site", LinkTarget::Url("https://example.com".into()))
        );
    }

    #[test]
    fn aliases_map_to_canonical_styles() {
        let spans = parse_inline("<b>x</b><i>y</i><del>z</del>").unwrap();
        assert_eq!(
            spans,
            vec![
                InlineSpan::bold("x"),
                InlineSpan::italic("y"),
                InlineSpan::Strike(vec![InlineSpan::text("z")]),
            ]
        );
    }

    #[test]
    fn styled_element_with_attributes_stays_raw() {
        let spans = parse_inline("<strong class=\"x\">a</strong>").unwrap();
        assert_eq!(
            spans,
            vec![InlineSpan::Raw("<strong class=\"x\">a</strong>".into())]
        );
    }

    #[test]
    fn status_colour_is_read_case_insensitively() {
        let doc = parse(concat!(
            "<ac:structured-macro ac:name=\"status\" ac:schema-version=\"1\">",
            "<ac:parameter ac:name=\"title\">DONE</ac:parameter>",
            "<ac:parameter ac:name=\"colour\">Green</ac:parameter>",
            "</ac:structured-macro>"
        ))
        .unwrap();
        match &doc.blocks()[0] {
            Block::Status(status) => {
                assert_eq!(status.label, "DONE");
                assert_eq!(status.color, StatusColor::Green);
            }
            other => panic!("expected status, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_macro_children_are_kept_raw() {
        let markup = concat!(
            "<ac:structured-macro ac:name=\"jira\">",
            "<ac:parameter ac:name=\"key\">ABC-1</ac:parameter>",
            "<ac:parameter ac:name=\"server\"><ri:user ri:username=\"x\"/></ac:parameter>",
            "</ac:structured-macro>"
        );
        let doc = parse(markup).unwrap();
        match &doc.blocks()[0] {
            Block::Macro(mac) => {
                assert_eq!(mac.form, MacroForm::Structured);
                assert_eq!(mac.parameters.get("key"), Some("ABC-1"));
                assert_eq!(
                    mac.body,
                    Some(MacroBody::Raw(
                        "<ac:parameter ac:name=\"server\"><ri:user ri:username=\"x\"/></ac:parameter>"
                            .into()
                    ))
                );
            }
            other => panic!("expected macro, got {other:?}"),
        }
    }

    #[test]
    fn list_item_splits_at_first_block_child() {
        let doc = parse("<ul><li>top<ul><li>nested</li></ul></li></ul>").unwrap();
        let list = doc.blocks()[0].as_list().unwrap();
        assert_eq!(list.items[0].plain_text(), "top");
        assert_eq!(
            list.items[0].children[0].as_list().unwrap().items[0].plain_text(),
            "nested"
        );
    }

    #[test]
    fn table_header_row_and_spans() {
        let doc = parse(concat!(
            "<table class=\"wrapped\"><colgroup><col/><col/></colgroup><tbody>",
            "<tr><th>Name</th><th>Status</th></tr>",
            "<tr><td colspan=\"2\"><p>both</p></td></tr>",
            "</tbody></table>"
        ))
        .unwrap();
        let table = doc.blocks()[0].as_table().unwrap();
        assert_eq!(table.headers, vec!["Name", "Status"]);
        assert_eq!(table.attributes.get("class"), Some("wrapped"));
        assert_eq!(table.rows[0].cells[0].col_span, 2);
        assert_eq!(table.rows[0].cells[0].plain_text(), "both");
    }
}
