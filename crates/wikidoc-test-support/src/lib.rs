//! Shared test harness utilities for wikidoc crates.
//!
//! Fixture builders panic on invalid input; they are only called from tests.

use wikidoc_config::Config;
use wikidoc_model::{
    Block, Cell, Document, Heading, InlineSpan, LinkTarget, List, ListItem, MacroBody,
    MacroParameters, Row, Table,
};

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::default()
}

pub fn heading(level: u8, text: &str) -> Block {
    Block::heading(level, text).expect("valid heading level")
}

/// `## Overview` with two paragraphs, then `## Details` with one.
pub fn overview_details() -> Document {
    Document::from_blocks(vec![
        heading(2, "Overview"),
        Block::text("First paragraph."),
        Block::text("Second paragraph."),
        heading(2, "Details"),
        Block::text("Detail body."),
    ])
}

/// A document that uses every block and inline variant, built only through
/// constructors so it round-trips through format and parse.
pub fn kitchen_sink() -> Document {
    let mut table = Table::new(["Name", "Status", "Notes"]);
    table
        .append_row(vec![Cell::text("A"), Cell::text("Open"), Cell::text("first")])
        .expect("row width");
    table
        .append_row(vec![Cell::text("B"), Cell::text("Closed"), Cell::text("second")])
        .expect("row width");
    table
        .append_row(vec![
            Cell::text("C"),
            Cell::new(vec![Block::List(List::bulleted(vec![ListItem::text("nested")]))]),
            Cell::new(Vec::new()),
        ])
        .expect("row width");
    table.merge_cells(0, 2, 2, 1).expect("merge");

    let jira: MacroParameters = [("key", "PROJ-42"), ("showSummary", "true")]
        .into_iter()
        .collect();
    let mut info = match Block::structured_macro("info", MacroParameters::new()) {
        Block::Macro(mac) => mac,
        _ => unreachable!("structured_macro builds a macro"),
    };
    info.body = Some(MacroBody::RichText(vec![Block::text("Heads up.")]));

    let widget: MacroParameters = [("foo", "1")].into_iter().collect();

    Document::from_blocks(vec![
        Block::table_of_contents(1, 3).expect("toc levels"),
        Block::status("IN PROGRESS", "yellow").expect("colour"),
        heading(1, "Project Plan"),
        Block::paragraph(vec![
            InlineSpan::text("Plain, "),
            InlineSpan::bold("bold"),
            InlineSpan::text(", "),
            InlineSpan::Italic(vec![InlineSpan::underline("nested")]),
            InlineSpan::text(" & "),
            InlineSpan::code("a < b"),
            InlineSpan::LineBreak,
            InlineSpan::Strike(vec![InlineSpan::text("old")]),
            InlineSpan::Superscript(vec![InlineSpan::text("2")]),
            InlineSpan::Subscript(vec![InlineSpan::text("x")]),
            InlineSpan::link("docs", LinkTarget::Url("https://example.com/?a=1&b=2".into())),
            InlineSpan::link("home", LinkTarget::Page("Team Home".into())),
            InlineSpan::link("up", LinkTarget::Anchor("top".into())),
        ]),
        Heading::new(2, "Goals")
            .expect("level")
            .with_id("goals-anchor")
            .into(),
        Block::list(
            false,
            vec![
                ListItem::text("Ship it"),
                ListItem::new(vec![InlineSpan::bold("Measure")]).with_children(vec![Block::list(
                    true,
                    vec![ListItem::text("latency"), ListItem::text("errors")],
                )]),
            ],
        ),
        Block::panel(
            "warning",
            Some("Careful".into()),
            vec![Block::text("Mind the gap.")],
        )
        .expect("panel kind"),
        table.into(),
        Block::code("rust", Some("main.rs".into()), "fn main() {\n    let x = [[1]];\n}\n]]>"),
        Block::code("", None, "plain"),
        Block::Macro(info),
        Block::structured_macro("jira", jira),
        Block::element("custom-widget", widget),
        Block::Divider,
        Block::link("Release page", LinkTarget::Page("Release 1.0".into())),
        Block::quote(vec![Block::text("Quoted.")]),
        Block::expand(Some("More".into()), vec![Block::text("Hidden detail.")]),
        Block::expand(None, Vec::new()),
        heading(3, "Empty"),
        Block::paragraph(Vec::new()),
        Block::List(List::numbered(Vec::new())),
        Table::default()
            .with_rows(vec![Row::from_texts(["headerless", "row"])])
            .into(),
    ])
}

/// Storage markup in the shape the platform itself saves, including
/// constructs the model does not type.
pub const STORED_PAGE: &str = concat!(
    "<p><ac:structured-macro ac:name=\"toc\" ac:schema-version=\"1\" ac:macro-id=\"abc\">",
    "<ac:parameter ac:name=\"maxLevel\">3</ac:parameter></ac:structured-macro></p>",
    "<h1>Release Notes</h1>",
    "<p>Welcome <ac:emoticon ac:name=\"smile\" /> to the <span style=\"color: red;\">release</span>.</p>",
    "<h2>Highlights</h2>",
    "<ul><li><p>Faster sync</p></li><li>Smaller <em>bundles</em></li></ul>",
    "<ac:structured-macro ac:name=\"info\" ac:schema-version=\"1\">",
    "<ac:rich-text-body><p>Upgrade soon.</p></ac:rich-text-body></ac:structured-macro>",
    "<h2>Known Issues</h2>",
    "<table class=\"wrapped\"><colgroup><col /><col /></colgroup><tbody>",
    "<tr><th>Issue</th><th>State</th></tr>",
    "<tr><td>Login</td><td><p>Open</p></td></tr>",
    "</tbody></table>",
    "<ac:image><ri:attachment ri:filename=\"chart.png\" /></ac:image>",
    "<p style=\"text-align: center;\">centered</p>",
    "<custom-widget foo=\"1\"/>",
);
