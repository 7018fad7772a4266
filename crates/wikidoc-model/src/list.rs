use serde::{Deserialize, Serialize};

use crate::block::{Block, Document};
use crate::error::{ModelError, ModelResult};
use crate::inline::{normalize_spans, plain_text, InlineSpan};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub spans: Vec<InlineSpan>,
    /// Nested blocks following the item text, usually sub-lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl ListItem {
    pub fn new(spans: Vec<InlineSpan>) -> Self {
        ListItem {
            spans: normalize_spans(spans),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ListItem::new(vec![InlineSpan::text(text)])
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.spans)
    }
}

/// Ordered or bulleted list. Numbering is positional and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn bulleted(items: Vec<ListItem>) -> Self {
        List {
            ordered: false,
            items,
        }
    }

    pub fn numbered(items: Vec<ListItem>) -> Self {
        List {
            ordered: true,
            items,
        }
    }

    pub fn append_item(&mut self, item: ListItem) {
        self.items.push(item);
    }

    /// Insert before position `index`; `index == len` appends.
    pub fn insert_item_at(&mut self, index: usize, item: ListItem) -> ModelResult<()> {
        if index > self.items.len() {
            return Err(self.out_of_range(index));
        }
        self.items.insert(index, item);
        Ok(())
    }

    pub fn remove_item_at(&mut self, index: usize) -> ModelResult<ListItem> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.items.remove(index))
    }

    /// Replace the inline text of an item, keeping its nested children.
    pub fn set_item_content(&mut self, index: usize, spans: Vec<InlineSpan>) -> ModelResult<()> {
        let error = self.out_of_range(index);
        let item = self.items.get_mut(index).ok_or(error)?;
        item.spans = normalize_spans(spans);
        Ok(())
    }

    /// Numbers are derived from item positions when the list is written, so
    /// there is nothing to rewrite. Kept so callers can express intent after
    /// a batch of edits.
    pub fn renumber(&mut self) {}

    pub fn set_ordered(&mut self, ordered: bool) {
        self.ordered = ordered;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn out_of_range(&self, index: usize) -> ModelError {
        ModelError::IndexOutOfRange {
            what: "item",
            index,
            len: self.items.len(),
        }
    }
}

/// Position of a list among the document's top-level blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRef(pub usize);

impl Document {
    pub fn list(&self, list: ListRef) -> ModelResult<&List> {
        match self.blocks().get(list.0) {
            Some(Block::List(found)) => Ok(found),
            Some(_) => Err(ModelError::NotAList { index: list.0 }),
            None => Err(ModelError::IndexOutOfRange {
                what: "block",
                index: list.0,
                len: self.len(),
            }),
        }
    }

    pub fn list_mut(&mut self, list: ListRef) -> ModelResult<&mut List> {
        let len = self.len();
        match self.blocks_mut().get_mut(list.0) {
            Some(Block::List(found)) => Ok(found),
            Some(_) => Err(ModelError::NotAList { index: list.0 }),
            None => Err(ModelError::IndexOutOfRange {
                what: "block",
                index: list.0,
                len,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(list: &List) -> Vec<String> {
        list.items.iter().map(ListItem::plain_text).collect()
    }

    #[test]
    fn insert_at_len_appends() {
        let mut list = List::numbered(vec![ListItem::text("one")]);
        list.insert_item_at(1, ListItem::text("two")).unwrap();
        list.insert_item_at(0, ListItem::text("zero")).unwrap();
        assert_eq!(texts(&list), vec!["zero", "one", "two"]);
    }

    #[test]
    fn insert_past_len_fails() {
        let mut list = List::bulleted(Vec::new());
        let err = list.insert_item_at(1, ListItem::text("x")).unwrap_err();
        assert_eq!(
            err,
            ModelError::IndexOutOfRange {
                what: "item",
                index: 1,
                len: 0
            }
        );
    }

    #[test]
    fn set_content_keeps_children() {
        let nested = Block::list(false, vec![ListItem::text("child")]);
        let mut list = List::bulleted(vec![ListItem::text("parent").with_children(vec![nested.clone()])]);

        list.set_item_content(0, vec![InlineSpan::bold("Parent")]).unwrap();

        assert_eq!(list.items[0].spans, vec![InlineSpan::bold("Parent")]);
        assert_eq!(list.items[0].children, vec![nested]);
        assert!(list.set_item_content(3, Vec::new()).is_err());
    }

    #[test]
    fn remove_then_renumber_keeps_order() {
        let mut list = List::numbered(vec![
            ListItem::text("a"),
            ListItem::text("b"),
            ListItem::text("c"),
        ]);
        let removed = list.remove_item_at(1).unwrap();
        list.renumber();
        assert_eq!(removed.plain_text(), "b");
        assert_eq!(texts(&list), vec!["a", "c"]);
    }

    #[test]
    fn document_list_access_checks_kind() {
        let doc = Document::from_blocks(vec![Block::text("x")]);
        assert_eq!(
            doc.list(ListRef(0)).unwrap_err(),
            ModelError::NotAList { index: 0 }
        );
        assert!(matches!(
            doc.list(ListRef(4)),
            Err(ModelError::IndexOutOfRange { what: "block", .. })
        ));
    }
}
