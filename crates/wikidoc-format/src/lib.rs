//! Storage-markup formatter for wikidoc documents.
//!
//! Every block variant has exactly one production, rendered by recursive
//! descent in document order. Output is deterministic: the same document and
//! settings always produce the same bytes.

pub mod storage;

use wikidoc_config::{Config, FormatSettings};
use wikidoc_model::{
    Block, Cell, CodeBlock, Document, Heading, InlineSpan, LinkTarget, List, Macro, MacroBody,
    MacroForm, MacroParameters, Panel, Status, Table,
};

use crate::storage::{cdata, escape_attribute, escape_text};

/// Formats documents or block slices into storage markup.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    settings: FormatSettings,
}

impl Renderer {
    pub fn new(settings: FormatSettings) -> Self {
        Self { settings }
    }

    /// Build a renderer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.format.clone())
    }

    pub fn settings(&self) -> &FormatSettings {
        &self.settings
    }

    pub fn render_document(&self, document: &Document) -> String {
        self.render_blocks(document.blocks())
    }

    /// Render a partial block sequence, e.g. the new body of a section.
    pub fn render_blocks(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        self.write_blocks(blocks, &mut out);
        out
    }

    fn write_blocks(&self, blocks: &[Block], out: &mut String) {
        for block in blocks {
            self.write_block(block, out);
            self.line_break(out);
        }
    }

    fn write_block(&self, block: &Block, out: &mut String) {
        match block {
            Block::Heading(heading) => write_heading(heading, out),
            Block::Paragraph { spans } => {
                out.push_str("<p>");
                write_spans(spans, out);
                out.push_str("</p>");
            }
            Block::List(list) => self.write_list(list, out),
            Block::Table(table) => self.write_table(table, out),
            Block::CodeBlock(code) => write_code(code, out),
            Block::Panel(panel) => self.write_panel(panel, out),
            Block::Status(status) => write_status(status, out),
            Block::Macro(mac) => self.write_macro(mac, out),
            Block::TableOfContents {
                min_level,
                max_level,
            } => {
                open_macro(storage::TOC_MACRO, out);
                write_parameter("minLevel", &min_level.to_string(), out);
                write_parameter("maxLevel", &max_level.to_string(), out);
                close_macro(out);
            }
            Block::Divider => out.push_str("<hr/>"),
            Block::InlineLink { text, target } => write_link(text, target, out),
            Block::Quote { content } => {
                out.push_str("<blockquote>");
                self.write_blocks(content, out);
                out.push_str("</blockquote>");
            }
            Block::Expand { title, content } => {
                open_macro(storage::EXPAND_MACRO, out);
                if let Some(title) = title {
                    write_parameter("title", title, out);
                }
                self.write_rich_text_body(content, out);
                close_macro(out);
            }
        }
    }

    fn write_list(&self, list: &List, out: &mut String) {
        let tag = if list.ordered { "ol" } else { "ul" };
        out.push('<');
        out.push_str(tag);
        out.push('>');
        self.line_break(out);
        for item in &list.items {
            out.push_str("<li>");
            if matches!(item.children.first(), Some(Block::InlineLink { .. })) {
                out.push_str("<p>");
                write_spans(&item.spans, out);
                out.push_str("</p>");
            } else {
                write_spans(&item.spans, out);
            }
            self.write_blocks(&item.children, out);
            out.push_str("</li>");
            self.line_break(out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn write_table(&self, table: &Table, out: &mut String) {
        out.push_str("<table");
        write_attributes(&table.attributes, out);
        out.push_str("><tbody>");
        self.line_break(out);

        if !table.headers.is_empty() {
            out.push_str("<tr>");
            for header in &table.headers {
                out.push_str("<th>");
                out.push_str(&escape_text(header));
                out.push_str("</th>");
            }
            out.push_str("</tr>");
            self.line_break(out);
        }

        let widths = table.occupied_widths();
        for (row, width) in table.rows.iter().zip(widths) {
            out.push_str("<tr>");
            for cell in &row.cells {
                self.write_cell(cell, out);
            }
            if self.settings.pad_ragged_rows {
                for _ in width..table.headers.len() {
                    out.push_str("<td></td>");
                }
            }
            out.push_str("</tr>");
            self.line_break(out);
        }

        out.push_str("</tbody></table>");
    }

    fn write_cell(&self, cell: &Cell, out: &mut String) {
        let tag = if cell.header { "th" } else { "td" };
        out.push('<');
        out.push_str(tag);
        if cell.row_span > 1 {
            out.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
        }
        if cell.col_span > 1 {
            out.push_str(&format!(" colspan=\"{}\"", cell.col_span));
        }
        out.push('>');
        self.write_blocks(&cell.content, out);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn write_panel(&self, panel: &Panel, out: &mut String) {
        open_macro(storage::PANEL_MACRO, out);
        write_parameter("type", panel.kind.as_str(), out);
        if let Some(title) = &panel.title {
            write_parameter("title", title, out);
        }
        self.write_rich_text_body(&panel.content, out);
        close_macro(out);
    }

    fn write_macro(&self, mac: &Macro, out: &mut String) {
        match mac.form {
            MacroForm::Structured => {
                open_macro(&mac.name, out);
                for (name, value) in mac.parameters.iter() {
                    write_parameter(name, value, out);
                }
                match &mac.body {
                    Some(MacroBody::RichText(blocks)) => self.write_rich_text_body(blocks, out),
                    Some(MacroBody::PlainText(text)) => write_plain_text_body(text, out),
                    Some(MacroBody::Raw(raw)) => out.push_str(raw),
                    None => {}
                }
                close_macro(out);
            }
            MacroForm::Element => {
                out.push('<');
                out.push_str(&mac.name);
                write_attributes(&mac.parameters, out);
                match &mac.body {
                    None => out.push_str("/>"),
                    Some(body) => {
                        out.push('>');
                        match body {
                            MacroBody::RichText(blocks) => self.write_blocks(blocks, out),
                            MacroBody::PlainText(text) => out.push_str(&escape_text(text)),
                            MacroBody::Raw(raw) => out.push_str(raw),
                        }
                        out.push_str("</");
                        out.push_str(&mac.name);
                        out.push('>');
                    }
                }
            }
        }
    }

    fn write_rich_text_body(&self, blocks: &[Block], out: &mut String) {
        out.push('<');
        out.push_str(storage::RICH_TEXT_BODY);
        out.push('>');
        self.write_blocks(blocks, out);
        out.push_str("</");
        out.push_str(storage::RICH_TEXT_BODY);
        out.push('>');
    }

    fn line_break(&self, out: &mut String) {
        if self.settings.line_breaks {
            out.push('\n');
        }
    }
}

/// Format a whole document with default settings.
pub fn format(document: &Document) -> String {
    Renderer::default().render_document(document)
}

/// Format a block sequence with default settings.
pub fn format_blocks(blocks: &[Block]) -> String {
    Renderer::default().render_blocks(blocks)
}

/// Format inline spans as they appear inside a paragraph.
pub fn format_spans(spans: &[InlineSpan]) -> String {
    let mut out = String::new();
    write_spans(spans, &mut out);
    out
}

fn write_heading(heading: &Heading, out: &mut String) {
    let level = heading.level();
    match &heading.id {
        Some(id) => out.push_str(&format!("<h{level} id=\"{}\">", escape_attribute(id))),
        None => out.push_str(&format!("<h{level}>")),
    }
    match &heading.markup {
        Some(markup) => out.push_str(markup),
        None => out.push_str(&escape_text(&heading.text)),
    }
    out.push_str(&format!("</h{level}>"));
}

fn write_code(code: &CodeBlock, out: &mut String) {
    open_macro(storage::CODE_MACRO, out);
    if !code.language.is_empty() {
        write_parameter("language", &code.language, out);
    }
    if let Some(title) = &code.title {
        write_parameter("title", title, out);
    }
    write_plain_text_body(&code.text, out);
    close_macro(out);
}

fn write_status(status: &Status, out: &mut String) {
    open_macro(storage::STATUS_MACRO, out);
    write_parameter("colour", status.color.as_str(), out);
    write_parameter("title", &status.label, out);
    close_macro(out);
}

fn write_spans(spans: &[InlineSpan], out: &mut String) {
    for span in spans {
        match span {
            InlineSpan::Text(text) => out.push_str(&escape_text(text)),
            InlineSpan::Bold(children) => wrap("strong", children, out),
            InlineSpan::Italic(children) => wrap("em", children, out),
            InlineSpan::Underline(children) => wrap("u", children, out),
            InlineSpan::Strike(children) => wrap("strike", children, out),
            InlineSpan::Superscript(children) => wrap("sup", children, out),
            InlineSpan::Subscript(children) => wrap("sub", children, out),
            InlineSpan::Code(text) => {
                out.push_str("<code>");
                out.push_str(&escape_text(text));
                out.push_str("</code>");
            }
            InlineSpan::Link { text, target } => write_link(text, target, out),
            InlineSpan::LineBreak => out.push_str("<br/>"),
            InlineSpan::Raw(raw) => out.push_str(raw),
        }
    }
}

fn wrap(tag: &str, children: &[InlineSpan], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_spans(children, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_link(text: &str, target: &LinkTarget, out: &mut String) {
    match target {
        LinkTarget::Url(url) => {
            out.push_str(&format!("<a href=\"{}\">", escape_attribute(url)));
            out.push_str(&escape_text(text));
            out.push_str("</a>");
        }
        LinkTarget::Page(title) => {
            out.push_str(&format!(
                "<{link}><{page} {attr}=\"{}\"/>",
                escape_attribute(title),
                link = storage::LINK,
                page = storage::PAGE,
                attr = storage::CONTENT_TITLE_ATTR,
            ));
            write_link_body(text, out);
        }
        LinkTarget::Anchor(anchor) => {
            out.push_str(&format!(
                "<{link} {attr}=\"{}\">",
                escape_attribute(anchor),
                link = storage::LINK,
                attr = storage::ANCHOR_ATTR,
            ));
            write_link_body(text, out);
        }
    }
}

fn write_link_body(text: &str, out: &mut String) {
    out.push_str(&format!(
        "<{body}>{}</{body}></{link}>",
        cdata(text),
        body = storage::PLAIN_TEXT_LINK_BODY,
        link = storage::LINK,
    ));
}

fn open_macro(name: &str, out: &mut String) {
    out.push_str(&format!(
        "<{} {}=\"{}\">",
        storage::STRUCTURED_MACRO,
        storage::NAME_ATTR,
        escape_attribute(name)
    ));
}

fn close_macro(out: &mut String) {
    out.push_str("</");
    out.push_str(storage::STRUCTURED_MACRO);
    out.push('>');
}

fn write_parameter(name: &str, value: &str, out: &mut String) {
    out.push_str(&format!(
        "<{tag} {attr}=\"{}\">{}</{tag}>",
        escape_attribute(name),
        escape_text(value),
        tag = storage::PARAMETER,
        attr = storage::NAME_ATTR,
    ));
}

fn write_plain_text_body(text: &str, out: &mut String) {
    out.push_str(&format!(
        "<{tag}>{}</{tag}>",
        cdata(text),
        tag = storage::PLAIN_TEXT_BODY
    ));
}

fn write_attributes(attributes: &MacroParameters, out: &mut String) {
    for (name, value) in attributes.iter() {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wikidoc_model::{ListItem, Row};

    fn compact() -> Renderer {
        Renderer::new(FormatSettings {
            line_breaks: false,
            pad_ragged_rows: true,
        })
    }

    #[test]
    fn escapes_text_content() {
        let doc = Document::from_blocks(vec![Block::text("a < b & c")]);
        assert_eq!(format(&doc), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn nested_styles_render_in_order() {
        let spans = vec![
            InlineSpan::text("x "),
            InlineSpan::Bold(vec![InlineSpan::italic("y")]),
            InlineSpan::LineBreak,
            InlineSpan::Strike(vec![InlineSpan::text("z")]),
        ];
        assert_eq!(
            format_spans(&spans),
            "x <strong><em>y</em></strong><br/><strike>z</strike>"
        );
    }

    #[test]
    fn heading_id_is_emitted_only_when_custom() {
        let blocks = vec![
            Block::heading(2, "Plain").unwrap(),
            Heading::new(3, "Named").unwrap().with_id("named-1").into(),
        ];
        assert_eq!(
            compact().render_blocks(&blocks),
            "<h2>Plain</h2><h3 id=\"named-1\">Named</h3>"
        );
    }

    #[test]
    fn code_block_uses_plain_text_body() {
        let block = Block::code("rust", Some("main.rs".into()), "fn main() {}");
        assert_eq!(
            compact().render_blocks(&[block]),
            concat!(
                "<ac:structured-macro ac:name=\"code\">",
                "<ac:parameter ac:name=\"language\">rust</ac:parameter>",
                "<ac:parameter ac:name=\"title\">main.rs</ac:parameter>",
                "<ac:plain-text-body><![CDATA[fn main() {}]]></ac:plain-text-body>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn status_writes_colour_then_title() {
        let block = Block::status("IN PROGRESS", "yellow").unwrap();
        assert_eq!(
            compact().render_blocks(&[block]),
            concat!(
                "<ac:structured-macro ac:name=\"status\">",
                "<ac:parameter ac:name=\"colour\">yellow</ac:parameter>",
                "<ac:parameter ac:name=\"title\">IN PROGRESS</ac:parameter>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn ragged_rows_are_padded_to_header_width() {
        let table = Table::new(["A", "B", "C"]).with_rows(vec![Row::from_texts(["1"])]);
        let markup = compact().render_blocks(&[table.into()]);
        assert_eq!(
            markup,
            concat!(
                "<table><tbody><tr><th>A</th><th>B</th><th>C</th></tr>",
                "<tr><td><p>1</p></td><td></td><td></td></tr>",
                "</tbody></table>"
            )
        );
    }

    #[test]
    fn unknown_element_is_self_closing() {
        let attrs: MacroParameters = [("foo", "1")].into_iter().collect();
        let block = Block::element("custom-widget", attrs);
        assert_eq!(format_blocks(&[block]), "<custom-widget foo=\"1\"/>\n");
    }

    #[test]
    fn page_and_anchor_links() {
        let spans = vec![
            InlineSpan::link("Home", LinkTarget::Page("Start Here".into())),
            InlineSpan::link("top", LinkTarget::Anchor("top".into())),
        ];
        assert_eq!(
            format_spans(&spans),
            concat!(
                "<ac:link><ri:page ri:content-title=\"Start Here\"/>",
                "<ac:plain-text-link-body><![CDATA[Home]]></ac:plain-text-link-body></ac:link>",
                "<ac:link ac:anchor=\"top\">",
                "<ac:plain-text-link-body><![CDATA[top]]></ac:plain-text-link-body></ac:link>"
            )
        );
    }

    #[test]
    fn nested_list_renders_inside_item() {
        let nested = Block::list(true, vec![ListItem::text("inner")]);
        let list = Block::list(false, vec![ListItem::text("outer").with_children(vec![nested])]);
        assert_eq!(
            compact().render_blocks(&[list]),
            "<ul><li>outer<ol><li>inner</li></ol></li></ul>"
        );
    }
}
