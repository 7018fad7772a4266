use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::inline::{normalize_spans, InlineSpan, LinkTarget};
use crate::list::{List, ListItem};
use crate::table::Table;
use crate::visit::Walk;

pub const MIN_HEADING_LEVEL: u8 = 1;
pub const MAX_HEADING_LEVEL: u8 = 6;
/// The platform's table-of-contents macro accepts one level deeper than headings.
pub const MAX_TOC_LEVEL: u8 = 7;

/// Heading level guaranteed to lie in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> ModelResult<Self> {
        if (MIN_HEADING_LEVEL..=MAX_HEADING_LEVEL).contains(&level) {
            Ok(HeadingLevel(level))
        } else {
            Err(ModelError::InvalidLevel {
                level,
                min: MIN_HEADING_LEVEL,
                max: MAX_HEADING_LEVEL,
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        HeadingLevel::new(value)
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    /// Explicit anchor id. When absent the id is derived from the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stored inner markup of a heading that holds elements (anchor macros,
    /// emoticons). Written back verbatim instead of `text`, which then only
    /// carries the visible title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> ModelResult<Self> {
        Ok(Heading {
            level: HeadingLevel::new(level)?,
            text: text.into(),
            id: None,
            markup: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }

    /// Replace the title. Stored inner markup is dropped with the old text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.markup = None;
    }

    pub fn level(&self) -> u8 {
        self.level.get()
    }

    pub fn id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => anchor_id(&self.text),
        }
    }

    /// Heading text with whitespace collapsed, the form used for section lookup.
    pub fn normalized(&self) -> String {
        normalize_title(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Info,
    Warning,
    Note,
    Success,
    Error,
}

impl PanelKind {
    pub const ALL: &'static [PanelKind] = &[
        PanelKind::Info,
        PanelKind::Warning,
        PanelKind::Note,
        PanelKind::Success,
        PanelKind::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PanelKind::Info => "info",
            PanelKind::Warning => "warning",
            PanelKind::Note => "note",
            PanelKind::Success => "success",
            PanelKind::Error => "error",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PanelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ModelError::InvalidPanelKind {
                kind: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Grey,
    Red,
    Yellow,
    Green,
    Blue,
}

impl StatusColor {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusColor::Grey => "grey",
            StatusColor::Red => "red",
            StatusColor::Yellow => "yellow",
            StatusColor::Green => "green",
            StatusColor::Blue => "blue",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusColor {
    type Err = ModelError;

    /// Colour names are matched case-insensitively; stored pages often use `Green`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "grey" | "gray" => Ok(StatusColor::Grey),
            "red" => Ok(StatusColor::Red),
            "yellow" => Ok(StatusColor::Yellow),
            "green" => Ok(StatusColor::Green),
            "blue" => Ok(StatusColor::Blue),
            _ => Err(ModelError::InvalidStatusColor {
                color: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub kind: PanelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub label: String,
    pub color: StatusColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Highlighting language; empty when unspecified.
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

/// Insertion-ordered string mapping used for macro parameters and element
/// attributes. Order matters because passthrough markup is re-emitted as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroParameters(Vec<(String, String)>);

impl MacroParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the first entry named `key`, or appends a new one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.iter_mut().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MacroParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = MacroParameters::new();
        for (key, value) in iter {
            parameters.insert(key, value);
        }
        parameters
    }
}

/// How a macro is spelled in storage markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroForm {
    /// `<ac:structured-macro ac:name="..">` with `<ac:parameter>` children.
    Structured,
    /// Any other element; `name` is the tag and parameters are its attributes.
    Element,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MacroBody {
    RichText(Vec<Block>),
    PlainText(String),
    /// Inner markup kept byte-for-byte.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    pub name: String,
    #[serde(default)]
    pub parameters: MacroParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<MacroBody>,
    pub form: MacroForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading(Heading),
    Paragraph {
        spans: Vec<InlineSpan>,
    },
    List(List),
    Table(Table),
    CodeBlock(CodeBlock),
    Panel(Panel),
    Status(Status),
    Macro(Macro),
    TableOfContents {
        min_level: u8,
        max_level: u8,
    },
    Divider,
    InlineLink {
        text: String,
        target: LinkTarget,
    },
    Quote {
        content: Vec<Block>,
    },
    Expand {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        content: Vec<Block>,
    },
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> ModelResult<Block> {
        Ok(Block::Heading(Heading::new(level, text)?))
    }

    pub fn paragraph(spans: Vec<InlineSpan>) -> Block {
        Block::Paragraph {
            spans: normalize_spans(spans),
        }
    }

    /// Paragraph holding a single plain-text run.
    pub fn text(text: impl Into<String>) -> Block {
        Block::paragraph(vec![InlineSpan::text(text)])
    }

    pub fn list(ordered: bool, items: Vec<ListItem>) -> Block {
        Block::List(List { ordered, items })
    }

    pub fn code(language: impl Into<String>, title: Option<String>, text: impl Into<String>) -> Block {
        Block::CodeBlock(CodeBlock {
            language: language.into(),
            title,
            text: text.into(),
        })
    }

    pub fn panel(kind: &str, title: Option<String>, content: Vec<Block>) -> ModelResult<Block> {
        Ok(Block::Panel(Panel {
            kind: kind.parse()?,
            title,
            content,
        }))
    }

    pub fn status(label: impl Into<String>, color: &str) -> ModelResult<Block> {
        Ok(Block::Status(Status {
            label: label.into(),
            color: color.parse()?,
        }))
    }

    pub fn structured_macro(name: impl Into<String>, parameters: MacroParameters) -> Block {
        Block::Macro(Macro {
            name: name.into(),
            parameters,
            body: None,
            form: MacroForm::Structured,
        })
    }

    pub fn element(name: impl Into<String>, attributes: MacroParameters) -> Block {
        Block::Macro(Macro {
            name: name.into(),
            parameters: attributes,
            body: None,
            form: MacroForm::Element,
        })
    }

    pub fn table_of_contents(min_level: u8, max_level: u8) -> ModelResult<Block> {
        if !(MIN_HEADING_LEVEL..=MAX_TOC_LEVEL).contains(&min_level) {
            return Err(ModelError::InvalidLevel {
                level: min_level,
                min: MIN_HEADING_LEVEL,
                max: MAX_TOC_LEVEL,
            });
        }
        if !(min_level..=MAX_TOC_LEVEL).contains(&max_level) {
            return Err(ModelError::InvalidLevel {
                level: max_level,
                min: min_level,
                max: MAX_TOC_LEVEL,
            });
        }
        Ok(Block::TableOfContents {
            min_level,
            max_level,
        })
    }

    pub fn link(text: impl Into<String>, target: LinkTarget) -> Block {
        Block::InlineLink {
            text: text.into(),
            target,
        }
    }

    pub fn quote(content: Vec<Block>) -> Block {
        Block::Quote { content }
    }

    pub fn expand(title: Option<String>, content: Vec<Block>) -> Block {
        Block::Expand { title, content }
    }

    pub fn as_heading(&self) -> Option<&Heading> {
        match self {
            Block::Heading(heading) => Some(heading),
            _ => None,
        }
    }

    pub fn as_heading_mut(&mut self) -> Option<&mut Heading> {
        match self {
            Block::Heading(heading) => Some(heading),
            _ => None,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        self.as_heading().map(Heading::level)
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Block::List(list) => Some(list),
            _ => None,
        }
    }

    /// True for a paragraph with no visible content.
    pub fn is_empty_paragraph(&self) -> bool {
        match self {
            Block::Paragraph { spans } => spans.iter().all(|span| match span {
                InlineSpan::Text(text) => text.trim().is_empty(),
                _ => false,
            }),
            _ => false,
        }
    }

    /// Nested block content for container blocks (panels, quotes, expands and
    /// rich-text macros). Lists and tables expose their children through
    /// [`crate::Node`] instead.
    pub fn children(&self) -> Option<&[Block]> {
        match self {
            Block::Panel(panel) => Some(&panel.content),
            Block::Quote { content } | Block::Expand { content, .. } => Some(content),
            Block::Macro(Macro {
                body: Some(MacroBody::RichText(blocks)),
                ..
            }) => Some(blocks),
            _ => None,
        }
    }
}

impl From<Heading> for Block {
    fn from(heading: Heading) -> Self {
        Block::Heading(heading)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Block::Table(table)
    }
}

impl From<List> for Block {
    fn from(list: List) -> Self {
        Block::List(list)
    }
}

/// Heading of the document outline, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub index: usize,
    pub level: u8,
    pub title: String,
}

/// Ordered top-level blocks of a page. The document exclusively owns its tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Document { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Depth-first traversal over every node of the tree.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.blocks)
    }

    /// Top-level headings in document order.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.walk()
            .filter(|(_, depth)| *depth == 0)
            .filter_map(|(node, _)| node.as_block())
            .enumerate()
            .filter_map(|(index, block)| {
                block.as_heading().map(|heading| OutlineEntry {
                    index,
                    level: heading.level(),
                    title: heading.normalized(),
                })
            })
            .collect()
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        Document::from_blocks(blocks)
    }
}

impl FromIterator<Block> for Document {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Document::from_blocks(iter.into_iter().collect())
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_title(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Slug used as the default heading anchor.
pub fn anchor_id(text: &str) -> String {
    let mut anchor = String::new();
    let mut last_was_dash = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            anchor.push(ch);
            last_was_dash = false;
        } else if (ch.is_whitespace() || ch == '-') && !anchor.is_empty() && !last_was_dash {
            anchor.push('-');
            last_was_dash = true;
        }
    }

    if anchor.ends_with('-') {
        anchor.pop();
    }

    anchor
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_out_of_range_heading_levels() {
        assert_eq!(
            Block::heading(7, "Too deep").unwrap_err(),
            ModelError::InvalidLevel {
                level: 7,
                min: 1,
                max: 6
            }
        );
        assert!(Block::heading(0, "Zero").is_err());
        assert!(Block::heading(6, "Deepest").is_ok());
    }

    #[test]
    fn rejects_unknown_panel_kind() {
        let err = Block::panel("tip", None, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidPanelKind {
                kind: "tip".into()
            }
        );
    }

    #[test]
    fn status_colour_is_case_insensitive() {
        let block = Block::status("DONE", "Green").unwrap();
        assert_eq!(
            block,
            Block::Status(Status {
                label: "DONE".into(),
                color: StatusColor::Green
            })
        );
        assert!(Block::status("?", "purple").is_err());
    }

    #[test]
    fn toc_levels_are_validated() {
        assert!(Block::table_of_contents(1, 7).is_ok());
        assert!(Block::table_of_contents(0, 3).is_err());
        assert!(Block::table_of_contents(4, 2).is_err());
    }

    #[test]
    fn heading_id_defaults_to_slug() {
        let heading = Heading::new(2, "Release Notes: v1.2").unwrap();
        assert_eq!(heading.id(), "release-notes-v12");
        assert_eq!(heading.with_id("custom").id(), "custom");
    }

    #[test]
    fn macro_parameters_keep_insertion_order() {
        let mut params: MacroParameters = [("b", "2"), ("a", "1")].into_iter().collect();
        params.insert("b", "3");
        params.insert("c", "4");
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(params.get("b"), Some("3"));
    }

    #[test]
    fn collected_parameters_keep_one_entry_per_key() {
        let params: MacroParameters = [("key", "a"), ("server", "x"), ("key", "b")]
            .into_iter()
            .collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("key"), Some("b"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["key", "server"]);
    }

    #[test]
    fn outline_lists_top_level_headings_only() {
        let doc = Document::from_blocks(vec![
            Block::heading(1, "Top").unwrap(),
            Block::quote(vec![Block::heading(2, "Quoted").unwrap()]),
            Block::heading(2, "  Next  step ").unwrap(),
        ]);
        let outline = doc.outline();
        assert_eq!(
            outline,
            vec![
                OutlineEntry {
                    index: 0,
                    level: 1,
                    title: "Top".into()
                },
                OutlineEntry {
                    index: 2,
                    level: 2,
                    title: "Next step".into()
                },
            ]
        );
    }

    #[test]
    fn retitling_drops_stored_markup() {
        let mut heading = Heading::new(2, "Intro")
            .unwrap()
            .with_markup("<ac:emoticon ac:name=\"smile\"/>Intro");
        heading.set_text("Introduction");
        assert_eq!(heading.text, "Introduction");
        assert_eq!(heading.markup, None);
    }

    #[test]
    fn heading_level_deserialization_is_validated() {
        let err = serde_json::from_str::<Block>(r#"{"type":"heading","level":9,"text":"x"}"#);
        assert!(err.is_err());
        let ok: Block =
            serde_json::from_str(r#"{"type":"heading","level":2,"text":"Overview"}"#).unwrap();
        assert_eq!(ok, Block::heading(2, "Overview").unwrap());
    }
}
