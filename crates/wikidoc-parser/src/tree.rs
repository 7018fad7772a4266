//! Tokenizer and tree builder for storage markup.
//!
//! The builder is a small state machine over the source bytes. It keeps the
//! byte range of every node so callers can slice the original text back out
//! when a construct has to be preserved verbatim.

use std::ops::Range;

use crate::error::{ParseError, ParseResult};

/// HTML elements that never have content, even when written without `/>`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Element(Element),
    /// Character data with entities decoded.
    Text { text: String, span: Range<usize> },
    CData { text: String, span: Range<usize> },
    Comment { span: Range<usize> },
}

impl Node {
    pub(crate) fn span(&self) -> Range<usize> {
        match self {
            Node::Element(element) => element.outer.clone(),
            Node::Text { span, .. } | Node::CData { span, .. } | Node::Comment { span } => {
                span.clone()
            }
        }
    }

    /// True for nodes that carry no content in block context.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Node::Text { text, .. } => text.trim().is_empty(),
            Node::Comment { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Whole element, tags included.
    pub outer: Range<usize>,
    /// Content between the tags; `None` for self-closing elements.
    pub inner: Option<Range<usize>>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn has_no_attributes(&self) -> bool {
        self.attributes.is_empty()
    }

    /// True when every attribute name is in `allowed`.
    pub(crate) fn attributes_within(&self, allowed: &[&str]) -> bool {
        self.attributes
            .iter()
            .all(|(key, _)| allowed.contains(&key.as_str()))
    }

    /// True when the element holds only character data (or nothing).
    pub(crate) fn is_text_only(&self) -> bool {
        self.children
            .iter()
            .all(|child| matches!(child, Node::Text { .. } | Node::CData { .. }))
    }

    /// Concatenated character data of all descendants.
    pub(crate) fn text_content(&self) -> String {
        let mut out = String::new();
        push_text(&self.children, &mut out);
        out
    }

    /// Children that carry content, skipping blank text and comments.
    pub(crate) fn content_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| !child.is_blank())
    }
}

fn push_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text, .. } | Node::CData { text, .. } => out.push_str(text),
            Node::Element(element) => push_text(&element.children, out),
            Node::Comment { .. } => {}
        }
    }
}

/// Build the node tree for `source`.
pub(crate) fn build(source: &str) -> ParseResult<Vec<Node>> {
    let mut builder = TreeBuilder {
        source,
        pos: 0,
        stack: Vec::new(),
        roots: Vec::new(),
    };
    builder.run()?;
    builder.finish()
}

struct OpenElement {
    element: Element,
    inner_start: usize,
}

struct TreeBuilder<'s> {
    source: &'s str,
    pos: usize,
    stack: Vec<OpenElement>,
    roots: Vec<Node>,
}

impl<'s> TreeBuilder<'s> {
    fn run(&mut self) -> ParseResult<()> {
        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];
            if rest.starts_with("<!--") {
                self.comment()?;
            } else if rest.starts_with("<![CDATA[") {
                self.cdata()?;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.declaration()?;
            } else if starts_tag(rest) {
                self.open_tag()?;
            } else {
                self.text();
            }
        }
        Ok(())
    }

    fn finish(self) -> ParseResult<Vec<Node>> {
        match self.stack.last() {
            Some(open) => Err(ParseError::malformed(
                open.element.outer.start,
                format!("unterminated element <{}>", open.element.name),
            )),
            None => Ok(self.roots),
        }
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(open) => open.element.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        // A stray '<' that does not open a tag is kept as text.
        let skip = if self.source[start..].starts_with('<') { 1 } else { 0 };
        let end = self.source[start + skip..]
            .find('<')
            .map(|offset| start + skip + offset)
            .unwrap_or(self.source.len());
        let text = html_escape::decode_html_entities(&self.source[start..end]).into_owned();
        self.pos = end;
        self.push(Node::Text {
            text,
            span: start..end,
        });
    }

    fn comment(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let end = self.find_after(start + 4, "-->", "unterminated comment")?;
        self.pos = end;
        self.push(Node::Comment { span: start..end });
        Ok(())
    }

    fn cdata(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let content_start = start + "<![CDATA[".len();
        let end = self.find_after(content_start, "]]>", "unterminated CDATA section")?;
        let text = self.source[content_start..end - 3].to_string();
        self.pos = end;
        self.push(Node::CData {
            text,
            span: start..end,
        });
        Ok(())
    }

    fn declaration(&mut self) -> ParseResult<()> {
        self.pos = self.find_after(self.pos + 2, ">", "unterminated declaration")?;
        Ok(())
    }

    fn open_tag(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        let mut cursor = start + 1;
        while cursor < bytes.len() && !is_tag_delimiter(bytes[cursor]) {
            cursor += 1;
        }
        let name = self.source[start + 1..cursor].to_string();
        let mut attributes = Vec::new();

        let self_closing = loop {
            cursor = skip_whitespace(bytes, cursor);
            match bytes.get(cursor) {
                None => {
                    return Err(ParseError::malformed(
                        start,
                        format!("unterminated tag <{name}"),
                    ))
                }
                Some(b'>') => {
                    cursor += 1;
                    break false;
                }
                Some(b'/') if bytes.get(cursor + 1) == Some(&b'>') => {
                    cursor += 2;
                    break true;
                }
                Some(_) => {
                    let (attribute, next) = self.attribute(cursor, start)?;
                    attributes.push(attribute);
                    cursor = next;
                }
            }
        };

        self.pos = cursor;
        let element = Element {
            name,
            attributes,
            children: Vec::new(),
            outer: start..cursor,
            inner: None,
        };

        if self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
            self.push(Node::Element(element));
        } else {
            self.stack.push(OpenElement {
                element,
                inner_start: cursor,
            });
        }
        Ok(())
    }

    fn attribute(&self, from: usize, tag_start: usize) -> ParseResult<((String, String), usize)> {
        let bytes = self.source.as_bytes();
        let mut cursor = from;
        while cursor < bytes.len() && !is_tag_delimiter(bytes[cursor]) && bytes[cursor] != b'=' {
            cursor += 1;
        }
        let name = self.source[from..cursor].to_string();
        if name.is_empty() {
            return Err(ParseError::malformed(cursor, "invalid attribute syntax"));
        }

        let after_name = skip_whitespace(bytes, cursor);
        if bytes.get(after_name) != Some(&b'=') {
            return Ok(((name, String::new()), cursor));
        }

        let value_start = skip_whitespace(bytes, after_name + 1);
        match bytes.get(value_start) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let close = self.source[value_start + 1..]
                    .find(quote as char)
                    .map(|offset| value_start + 1 + offset)
                    .ok_or_else(|| {
                        ParseError::malformed(
                            tag_start,
                            format!("unterminated value for attribute {name}"),
                        )
                    })?;
                let value = html_escape::decode_html_entities(&self.source[value_start + 1..close])
                    .into_owned();
                Ok(((name, value), close + 1))
            }
            Some(_) => {
                let mut end = value_start;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                    end += 1;
                }
                let value =
                    html_escape::decode_html_entities(&self.source[value_start..end]).into_owned();
                Ok(((name, value), end))
            }
            None => Err(ParseError::malformed(
                tag_start,
                format!("unterminated tag <{name}"),
            )),
        }
    }

    fn close_tag(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let end = self.find_after(start + 2, ">", "unterminated closing tag")?;
        let name = self.source[start + 2..end - 1].trim();
        self.pos = end;

        let Some(open) = self.stack.pop() else {
            if VOID_ELEMENTS.contains(&name) {
                return Ok(());
            }
            return Err(ParseError::malformed(
                start,
                format!("unexpected closing tag </{name}>"),
            ));
        };

        if open.element.name != name {
            if VOID_ELEMENTS.contains(&name) {
                self.stack.push(open);
                return Ok(());
            }
            return Err(ParseError::malformed(
                start,
                format!(
                    "closing tag </{name}> does not match <{}>",
                    open.element.name
                ),
            ));
        }

        let mut element = open.element;
        element.inner = Some(open.inner_start..start);
        element.outer = element.outer.start..end;
        self.push(Node::Element(element));
        Ok(())
    }

    /// Offset just past the next `needle` at or after `from`.
    fn find_after(&self, from: usize, needle: &str, message: &str) -> ParseResult<usize> {
        self.source
            .get(from..)
            .and_then(|rest| rest.find(needle))
            .map(|offset| from + offset + needle.len())
            .ok_or_else(|| ParseError::malformed(self.pos, message))
    }
}

fn starts_tag(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<') && chars.next().map_or(false, |ch| ch.is_ascii_alphabetic())
}

fn is_tag_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'>' || byte == b'/'
}

fn skip_whitespace(bytes: &[u8], mut cursor: usize) -> usize {
    while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
        cursor += 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_element(source: &str) -> Element {
        let nodes = build(source).unwrap();
        assert_eq!(nodes.len(), 1, "expected one root node for {source}");
        nodes[0].as_element().cloned().unwrap()
    }

    #[test]
    fn records_outer_and_inner_ranges() {
        let source = "<p>a <b>c</b></p>";
        let element = single_element(source);
        assert_eq!(&source[element.outer.clone()], source);
        assert_eq!(&source[element.inner.clone().unwrap()], "a <b>c</b>");
    }

    #[test]
    fn decodes_attribute_and_text_entities() {
        let element = single_element("<a href=\"?a=1&amp;b=2\">x &lt; y</a>");
        assert_eq!(element.attr("href"), Some("?a=1&b=2"));
        assert_eq!(element.text_content(), "x < y");
    }

    #[test]
    fn void_elements_need_no_slash() {
        let element = single_element("<p>a<br>b</p>");
        assert_eq!(element.children.len(), 3);
    }

    #[test]
    fn cdata_is_kept_verbatim() {
        let element = single_element("<x><![CDATA[<b>&amp;</b>]]></x>");
        assert_eq!(element.text_content(), "<b>&amp;</b>");
    }

    #[test]
    fn unterminated_element_reports_its_offset() {
        let err = build("<p>ok</p><ul><li>x</li>").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedMarkup {
                offset: 9,
                message: "unterminated element <ul>".into()
            }
        );
    }

    #[test]
    fn mismatched_and_stray_closing_tags_fail() {
        assert!(matches!(
            build("<p><b>x</p>"),
            Err(ParseError::MalformedMarkup { offset: 7, .. })
        ));
        assert!(build("text</p>").is_err());
        assert!(build("<!-- open").is_err());
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let nodes = build("a < b").unwrap();
        let text: String = nodes
            .iter()
            .map(|node| match node {
                Node::Text { text, .. } => text.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "a < b");
    }
}
