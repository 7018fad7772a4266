//! Read-only traversal and text visitors over a block tree.

use crate::block::{Block, Document, Macro, MacroBody};
use crate::inline::InlineSpan;
use crate::list::ListItem;
use crate::table::{Cell, Row};

/// Any node reachable from a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Block(&'a Block),
    Item(&'a ListItem),
    Row(&'a Row),
    Cell(&'a Cell),
}

impl<'a> Node<'a> {
    pub fn children(self) -> Vec<Node<'a>> {
        match self {
            Node::Block(Block::List(list)) => list.items.iter().map(Node::Item).collect(),
            Node::Block(Block::Table(table)) => table.rows.iter().map(Node::Row).collect(),
            Node::Block(block) => block
                .children()
                .map(|blocks| blocks.iter().map(Node::Block).collect())
                .unwrap_or_default(),
            Node::Item(item) => item.children.iter().map(Node::Block).collect(),
            Node::Row(row) => row.cells.iter().map(Node::Cell).collect(),
            Node::Cell(cell) => cell.content.iter().map(Node::Block).collect(),
        }
    }

    pub fn as_block(self) -> Option<&'a Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }
}

/// Lazy pre-order iterator yielding each node with its depth (top level is 0).
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(Node<'a>, usize)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(blocks: &'a [Block]) -> Self {
        Walk {
            stack: blocks.iter().rev().map(|block| (Node::Block(block), 0)).collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Node<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children().into_iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

/// Call `visitor` for every user-visible text slot in the document, in
/// document order. Raw passthrough markup is not visited.
pub fn visit_text(document: &Document, visitor: &mut dyn FnMut(&str)) {
    for block in document.blocks() {
        block_text(block, visitor);
    }
}

/// Mutable counterpart of [`visit_text`], visiting the same slots.
pub fn visit_text_mut(document: &mut Document, visitor: &mut dyn FnMut(&mut String)) {
    for block in document.blocks_mut() {
        block_text_mut(block, visitor);
    }
}

fn block_text(block: &Block, visitor: &mut dyn FnMut(&str)) {
    match block {
        Block::Heading(heading) => visitor(&heading.text),
        Block::Paragraph { spans } => spans_text(spans, visitor),
        Block::List(list) => {
            for item in &list.items {
                spans_text(&item.spans, visitor);
                item.children.iter().for_each(|child| block_text(child, visitor));
            }
        }
        Block::Table(table) => {
            table.headers.iter().for_each(|header| visitor(header));
            for cell in table.rows.iter().flat_map(|row| &row.cells) {
                cell.content.iter().for_each(|child| block_text(child, visitor));
            }
        }
        Block::CodeBlock(code) => {
            if let Some(title) = &code.title {
                visitor(title);
            }
            visitor(&code.text);
        }
        Block::Panel(panel) => {
            if let Some(title) = &panel.title {
                visitor(title);
            }
            panel.content.iter().for_each(|child| block_text(child, visitor));
        }
        Block::Status(status) => visitor(&status.label),
        Block::Macro(Macro {
            parameters, body, ..
        }) => {
            parameters.iter().for_each(|(_, value)| visitor(value));
            match body {
                Some(MacroBody::RichText(blocks)) => {
                    blocks.iter().for_each(|child| block_text(child, visitor))
                }
                Some(MacroBody::PlainText(text)) => visitor(text),
                Some(MacroBody::Raw(_)) | None => {}
            }
        }
        Block::InlineLink { text, target } => {
            visitor(text);
            visitor(target.value());
        }
        Block::Quote { content } => content.iter().for_each(|child| block_text(child, visitor)),
        Block::Expand { title, content } => {
            if let Some(title) = title {
                visitor(title);
            }
            content.iter().for_each(|child| block_text(child, visitor));
        }
        Block::TableOfContents { .. } | Block::Divider => {}
    }
}

fn spans_text(spans: &[InlineSpan], visitor: &mut dyn FnMut(&str)) {
    for span in spans {
        match span {
            InlineSpan::Text(text) | InlineSpan::Code(text) => visitor(text),
            InlineSpan::Link { text, target } => {
                visitor(text);
                visitor(target.value());
            }
            InlineSpan::LineBreak | InlineSpan::Raw(_) => {}
            styled => {
                if let Some(children) = styled.children() {
                    spans_text(children, visitor);
                }
            }
        }
    }
}

fn block_text_mut(block: &mut Block, visitor: &mut dyn FnMut(&mut String)) {
    match block {
        Block::Heading(heading) => visitor(&mut heading.text),
        Block::Paragraph { spans } => spans_text_mut(spans, visitor),
        Block::List(list) => {
            for item in &mut list.items {
                spans_text_mut(&mut item.spans, visitor);
                item.children
                    .iter_mut()
                    .for_each(|child| block_text_mut(child, visitor));
            }
        }
        Block::Table(table) => {
            table.headers.iter_mut().for_each(|header| visitor(header));
            for cell in table.rows.iter_mut().flat_map(|row| &mut row.cells) {
                cell.content
                    .iter_mut()
                    .for_each(|child| block_text_mut(child, visitor));
            }
        }
        Block::CodeBlock(code) => {
            if let Some(title) = &mut code.title {
                visitor(title);
            }
            visitor(&mut code.text);
        }
        Block::Panel(panel) => {
            if let Some(title) = &mut panel.title {
                visitor(title);
            }
            panel
                .content
                .iter_mut()
                .for_each(|child| block_text_mut(child, visitor));
        }
        Block::Status(status) => visitor(&mut status.label),
        Block::Macro(Macro {
            parameters, body, ..
        }) => {
            parameters.values_mut().for_each(|value| visitor(value));
            match body {
                Some(MacroBody::RichText(blocks)) => blocks
                    .iter_mut()
                    .for_each(|child| block_text_mut(child, visitor)),
                Some(MacroBody::PlainText(text)) => visitor(text),
                Some(MacroBody::Raw(_)) | None => {}
            }
        }
        Block::InlineLink { text, target } => {
            visitor(text);
            visitor(target.value_mut());
        }
        Block::Quote { content } => content
            .iter_mut()
            .for_each(|child| block_text_mut(child, visitor)),
        Block::Expand { title, content } => {
            if let Some(title) = title {
                visitor(title);
            }
            content
                .iter_mut()
                .for_each(|child| block_text_mut(child, visitor));
        }
        Block::TableOfContents { .. } | Block::Divider => {}
    }
}

fn spans_text_mut(spans: &mut [InlineSpan], visitor: &mut dyn FnMut(&mut String)) {
    for span in spans {
        match span {
            InlineSpan::Text(text) | InlineSpan::Code(text) => visitor(text),
            InlineSpan::Link { text, target } => {
                visitor(text);
                visitor(target.value_mut());
            }
            InlineSpan::LineBreak | InlineSpan::Raw(_) => {}
            styled => {
                if let Some(children) = styled.children_mut() {
                    spans_text_mut(children, visitor);
                }
            }
        }
    }
}
