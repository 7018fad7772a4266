//! Conversion from the node tree into the block model.
//!
//! Recognised constructs become typed blocks. Anything else is kept as a
//! generic macro (block context) or raw inline markup (inline context) whose
//! source text is copied verbatim, so formatting a parsed document never loses
//! content it did not understand.

use log::trace;
use wikidoc_format::storage;
use wikidoc_model::{
    normalize_spans, Block, Cell, CodeBlock, Heading, HeadingLevel, InlineSpan, LinkTarget,
    ListItem, Macro, MacroBody, MacroForm, MacroParameters, Panel, PanelKind, Row, Status,
    StatusColor, Table,
};

use crate::tree::{Element, Node};

/// Elements that form inline content. Everything else is a block in block
/// context.
const INLINE_ELEMENTS: &[&str] = &[
    "strong", "b", "em", "i", "u", "s", "strike", "del", "sup", "sub", "code", "br", "a",
    storage::LINK,
];

pub(crate) struct Converter<'s> {
    source: &'s str,
}

impl<'s> Converter<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Converter { source }
    }

    /// Convert a sequence of nodes in block context. Runs of inline content
    /// are grouped into paragraphs; blank text between blocks is dropped.
    pub(crate) fn blocks(&self, nodes: &[Node]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut inline: Vec<&Node> = Vec::new();

        for node in nodes {
            match node {
                Node::Element(element) if !is_inline(element) => {
                    self.flush_inline(&mut inline, &mut blocks);
                    blocks.push(self.block(element));
                }
                Node::Comment { span } => {
                    trace!("skipping comment at byte {}", span.start);
                }
                _ => inline.push(node),
            }
        }
        self.flush_inline(&mut inline, &mut blocks);
        blocks
    }

    fn flush_inline(&self, inline: &mut Vec<&Node>, blocks: &mut Vec<Block>) {
        let nodes = std::mem::take(inline);
        let content: Vec<&Node> = nodes.iter().copied().filter(|node| !node.is_blank()).collect();
        if content.is_empty() {
            return;
        }

        // A run made only of link elements is a sequence of block-level links.
        let links: Option<Vec<Block>> = content
            .iter()
            .map(|node| {
                let (text, target) = self.link(node.as_element()?)?;
                Some(Block::InlineLink { text, target })
            })
            .collect();
        if let Some(links) = links {
            blocks.extend(links);
            return;
        }

        trace!("wrapping {} loose inline node(s) in a paragraph", nodes.len());
        let spans = nodes.into_iter().filter_map(|node| self.span(node)).collect();
        blocks.push(Block::paragraph(spans));
    }

    fn block(&self, element: &Element) -> Block {
        let typed = match element.name.as_str() {
            "p" => self.paragraph(element),
            "ul" => self.list(element, false),
            "ol" => self.list(element, true),
            "table" => self.table(element).map(Block::Table),
            "blockquote" if element.has_no_attributes() => {
                Some(Block::quote(self.blocks(&element.children)))
            }
            "hr" if element.has_no_attributes() && element.children.is_empty() => {
                Some(Block::Divider)
            }
            name if name == storage::STRUCTURED_MACRO => self.structured_macro(element),
            name => heading_level(name).and_then(|level| self.heading(element, level)),
        };

        typed.unwrap_or_else(|| self.element_macro(element))
    }

    fn heading(&self, element: &Element, level: HeadingLevel) -> Option<Block> {
        if !element.attributes_within(&["id"]) {
            return None;
        }
        let markup = match &element.inner {
            Some(inner) if !element.is_text_only() => {
                trace!("keeping inner markup of <{}> verbatim", element.name);
                Some(self.source[inner.clone()].to_string())
            }
            _ => None,
        };
        Some(Block::Heading(Heading {
            level,
            text: visible_text(&element.children),
            id: element.attr("id").map(str::to_string),
            markup,
        }))
    }

    fn paragraph(&self, element: &Element) -> Option<Block> {
        if !element.has_no_attributes() {
            return None;
        }
        Some(Block::paragraph(self.spans(&element.children)))
    }

    fn list(&self, element: &Element, ordered: bool) -> Option<Block> {
        if !element.has_no_attributes() {
            return None;
        }

        let mut items = Vec::new();
        for child in element.content_children() {
            let item = child
                .as_element()
                .filter(|item| item.name == "li" && item.has_no_attributes())?;
            items.push(self.list_item(item));
        }
        Some(Block::list(ordered, items))
    }

    fn list_item(&self, item: &Element) -> ListItem {
        if let Some(wrapped) = self.wrapped_list_item(item) {
            return wrapped;
        }

        let split = item
            .children
            .iter()
            .position(|child| matches!(child, Node::Element(element) if !is_inline(element)))
            .unwrap_or(item.children.len());
        let (inline, nested) = item.children.split_at(split);

        // Whitespace before a nested block is layout, not item text.
        let spans = if !nested.is_empty() && inline.iter().all(Node::is_blank) {
            Vec::new()
        } else {
            self.spans(inline)
        };
        ListItem::new(spans).with_children(self.blocks(nested))
    }

    /// `<li><p>text</p><a ..>..</a>..</li>`: the item text is wrapped in a
    /// paragraph because its first child is a block-level link, which would
    /// otherwise read as part of the text.
    fn wrapped_list_item(&self, item: &Element) -> Option<ListItem> {
        let first = item.children.iter().position(|child| !child.is_blank())?;
        let paragraph = item.children[first]
            .as_element()
            .filter(|element| element.name == "p" && element.has_no_attributes())?;
        self.link(item.children.get(first + 1)?.as_element()?)?;

        let spans = self.spans(&paragraph.children);
        Some(ListItem::new(spans).with_children(self.blocks(&item.children[first + 1..])))
    }

    fn table(&self, element: &Element) -> Option<Table> {
        let mut rows: Vec<&Element> = Vec::new();
        for child in element.content_children() {
            let child = child.as_element()?;
            match child.name.as_str() {
                "colgroup" => trace!("dropping <colgroup> column widths"),
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" if child.has_no_attributes() => {
                    for row in child.content_children() {
                        rows.push(row.as_element().filter(|row| row.name == "tr")?);
                    }
                }
                _ => return None,
            }
        }

        let mut table = Table::default();
        table.attributes = element
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if !row.has_no_attributes() {
                return None;
            }
            let cells: Vec<&Element> = row
                .content_children()
                .map(|cell| cell.as_element().filter(|cell| cell.name == "td" || cell.name == "th"))
                .collect::<Option<_>>()?;

            let header_row = index == 0
                && !cells.is_empty()
                && cells
                    .iter()
                    .all(|cell| cell.name == "th" && cell.has_no_attributes());
            if header_row {
                table.headers = cells.iter().map(|cell| cell.text_content()).collect();
                continue;
            }

            let cells = cells
                .into_iter()
                .map(|cell| self.cell(cell))
                .collect::<Option<Vec<_>>>()?;
            table.rows.push(Row::new(cells));
        }

        Some(table)
    }

    fn cell(&self, element: &Element) -> Option<Cell> {
        if !element.attributes_within(&["rowspan", "colspan"]) {
            return None;
        }
        let span = |name: &str| match element.attr(name) {
            Some(value) => value.trim().parse::<usize>().ok().filter(|span| *span >= 1),
            None => Some(1),
        };
        Some(Cell {
            content: self.blocks(&element.children),
            row_span: span("rowspan")?,
            col_span: span("colspan")?,
            header: element.name == "th",
        })
    }

    fn structured_macro(&self, element: &Element) -> Option<Block> {
        let name = element.attr(storage::NAME_ATTR)?.to_string();
        let extra_attribute = element.attributes.iter().any(|(key, _)| {
            key != storage::NAME_ATTR && !storage::IGNORED_MACRO_ATTRS.contains(&key.as_str())
        });
        if extra_attribute {
            return None;
        }

        let mut parameters = MacroParameters::new();
        let mut body = None;
        let mut body_start = None;
        let mut raw = false;

        for child in element.content_children() {
            let recognised = match child.as_element() {
                Some(param) if param.name == storage::PARAMETER && body_start.is_none() => {
                    match param.attr(storage::NAME_ATTR) {
                        Some(key)
                            if param.attributes.len() == 1
                                && param.is_text_only()
                                && !parameters.contains_key(key) =>
                        {
                            parameters.insert(key, param.text_content());
                            true
                        }
                        _ => false,
                    }
                }
                Some(rich) if rich.name == storage::RICH_TEXT_BODY && body.is_none() => {
                    body_start = Some(child.span().start);
                    body = Some(MacroBody::RichText(self.blocks(&rich.children)));
                    rich.has_no_attributes()
                }
                Some(plain)
                    if plain.name == storage::PLAIN_TEXT_BODY
                        && body.is_none()
                        && plain.is_text_only() =>
                {
                    body_start = Some(child.span().start);
                    body = Some(MacroBody::PlainText(plain.text_content()));
                    plain.has_no_attributes()
                }
                _ => false,
            };

            if !recognised {
                body_start.get_or_insert(child.span().start);
                raw = true;
                break;
            }
        }

        if raw {
            let start = body_start?;
            let end = element.inner.as_ref()?.end;
            trace!("keeping body of macro '{name}' as raw markup");
            body = Some(MacroBody::Raw(self.source[start..end].to_string()));
        }

        Some(typed_macro(&name, &parameters, body.as_ref()).unwrap_or(Block::Macro(Macro {
            name,
            parameters,
            body,
            form: MacroForm::Structured,
        })))
    }

    /// Fallback for any element the model does not represent: the tag name,
    /// its attributes and its inner markup verbatim.
    fn element_macro(&self, element: &Element) -> Block {
        trace!("keeping <{}> as a generic element macro", element.name);
        let parameters = element
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let body = element
            .inner
            .as_ref()
            .map(|inner| MacroBody::Raw(self.source[inner.clone()].to_string()));
        Block::Macro(Macro {
            name: element.name.clone(),
            parameters,
            body,
            form: MacroForm::Element,
        })
    }

    /// Convert nodes in inline context. The result is normalized.
    pub(crate) fn spans(&self, nodes: &[Node]) -> Vec<InlineSpan> {
        normalize_spans(nodes.iter().filter_map(|node| self.span(node)).collect())
    }

    fn span(&self, node: &Node) -> Option<InlineSpan> {
        match node {
            Node::Text { text, .. } | Node::CData { text, .. } => Some(InlineSpan::text(text.clone())),
            Node::Comment { .. } => None,
            Node::Element(element) => Some(self.inline_element(element)),
        }
    }

    fn inline_element(&self, element: &Element) -> InlineSpan {
        let span = match element.name.as_str() {
            "strong" | "b" => self.styled(element, InlineSpan::Bold),
            "em" | "i" => self.styled(element, InlineSpan::Italic),
            "u" => self.styled(element, InlineSpan::Underline),
            "strike" | "s" | "del" => self.styled(element, InlineSpan::Strike),
            "sup" => self.styled(element, InlineSpan::Superscript),
            "sub" => self.styled(element, InlineSpan::Subscript),
            "code" if element.has_no_attributes() && element.is_text_only() => {
                Some(InlineSpan::Code(element.text_content()))
            }
            "br" if element.has_no_attributes() && element.children.is_empty() => {
                Some(InlineSpan::LineBreak)
            }
            _ => self
                .link(element)
                .map(|(text, target)| InlineSpan::Link { text, target }),
        };

        span.unwrap_or_else(|| {
            trace!("keeping inline <{}> as raw markup", element.name);
            InlineSpan::Raw(self.source[element.outer.clone()].to_string())
        })
    }

    fn styled(
        &self,
        element: &Element,
        wrap: fn(Vec<InlineSpan>) -> InlineSpan,
    ) -> Option<InlineSpan> {
        element
            .has_no_attributes()
            .then(|| wrap(self.spans(&element.children)))
    }

    /// Recognise the link spellings the formatter writes.
    fn link(&self, element: &Element) -> Option<(String, LinkTarget)> {
        if element.name == "a" {
            let href = element.attr("href")?;
            if element.attributes.len() != 1 || !element.is_text_only() {
                return None;
            }
            return Some((element.text_content(), LinkTarget::Url(href.to_string())));
        }

        if element.name != storage::LINK || !element.attributes_within(&[storage::ANCHOR_ATTR]) {
            return None;
        }

        let mut page = None;
        let mut text = None;
        for child in element.content_children() {
            let child = child.as_element()?;
            if child.name == storage::PAGE && page.is_none() && text.is_none() {
                if child.attributes.len() != 1 || !child.children.is_empty() {
                    return None;
                }
                page = Some(child.attr(storage::CONTENT_TITLE_ATTR)?.to_string());
            } else if child.name == storage::PLAIN_TEXT_LINK_BODY
                && text.is_none()
                && child.has_no_attributes()
                && child.is_text_only()
            {
                text = Some(child.text_content());
            } else {
                return None;
            }
        }

        let text = text?;
        match (page, element.attr(storage::ANCHOR_ATTR)) {
            (Some(title), None) => Some((text, LinkTarget::Page(title))),
            (None, Some(anchor)) => Some((text, LinkTarget::Anchor(anchor.to_string()))),
            _ => None,
        }
    }
}

/// Character data a reader sees in a heading: macro parameters and bodies
/// are skipped.
fn visible_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text { text, .. } | Node::CData { text, .. } => out.push_str(text),
            Node::Element(element) if element.name != storage::STRUCTURED_MACRO => {
                out.push_str(&visible_text(&element.children))
            }
            Node::Element(_) | Node::Comment { .. } => {}
        }
    }
    out
}

fn is_inline(element: &Element) -> bool {
    INLINE_ELEMENTS.contains(&element.name.as_str())
}

fn heading_level(name: &str) -> Option<HeadingLevel> {
    let digit = name.strip_prefix('h')?;
    if digit.len() != 1 {
        return None;
    }
    HeadingLevel::new(digit.parse().ok()?).ok()
}

/// Map the platform macros the model types natively. Returns `None` when the
/// parameters or body deviate from the spelling the formatter writes.
fn typed_macro(name: &str, parameters: &MacroParameters, body: Option<&MacroBody>) -> Option<Block> {
    let only = |allowed: &[&str]| parameters.keys().all(|key| allowed.contains(&key));

    match (name, body) {
        (storage::CODE_MACRO, Some(MacroBody::PlainText(text))) if only(&["language", "title"]) => {
            Some(Block::CodeBlock(CodeBlock {
                language: parameters.get("language").unwrap_or_default().to_string(),
                title: parameters.get("title").map(str::to_string),
                text: text.clone(),
            }))
        }
        (storage::PANEL_MACRO, Some(MacroBody::RichText(content))) if only(&["type", "title"]) => {
            let kind: PanelKind = parameters.get("type")?.parse().ok()?;
            Some(Block::Panel(Panel {
                kind,
                title: parameters.get("title").map(str::to_string),
                content: content.clone(),
            }))
        }
        (storage::STATUS_MACRO, None) if only(&["colour", "title"]) => {
            let color: StatusColor = parameters.get("colour")?.parse().ok()?;
            Some(Block::Status(Status {
                label: parameters.get("title")?.to_string(),
                color,
            }))
        }
        (storage::TOC_MACRO, None) if only(&["minLevel", "maxLevel"]) => {
            let min = parameters.get("minLevel")?.trim().parse().ok()?;
            let max = parameters.get("maxLevel")?.trim().parse().ok()?;
            Block::table_of_contents(min, max).ok()
        }
        (storage::EXPAND_MACRO, Some(MacroBody::RichText(content))) if only(&["title"]) => {
            Some(Block::expand(
                parameters.get("title").map(str::to_string),
                content.clone(),
            ))
        }
        _ => None,
    }
}
