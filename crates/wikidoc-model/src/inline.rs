use serde::{Deserialize, Serialize};

/// Destination of a link span or link block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LinkTarget {
    /// External URL, rendered as a plain anchor element.
    Url(String),
    /// Another page in the same space, addressed by title.
    Page(String),
    /// Anchor on the current page.
    Anchor(String),
}

impl LinkTarget {
    pub fn value(&self) -> &str {
        match self {
            LinkTarget::Url(value) | LinkTarget::Page(value) | LinkTarget::Anchor(value) => value,
        }
    }

    pub fn value_mut(&mut self) -> &mut String {
        match self {
            LinkTarget::Url(value) | LinkTarget::Page(value) | LinkTarget::Anchor(value) => value,
        }
    }
}

/// Inline run inside a paragraph, list item, or cell paragraph.
///
/// Styled runs own their children so styles nest (`<strong><em>..</em></strong>`).
/// Order is significant and preserved through formatting and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InlineSpan {
    Text(String),
    Bold(Vec<InlineSpan>),
    Italic(Vec<InlineSpan>),
    Underline(Vec<InlineSpan>),
    Strike(Vec<InlineSpan>),
    Superscript(Vec<InlineSpan>),
    Subscript(Vec<InlineSpan>),
    Code(String),
    Link { text: String, target: LinkTarget },
    LineBreak,
    /// Inline markup the model does not understand, kept verbatim.
    Raw(String),
}

impl InlineSpan {
    pub fn text(text: impl Into<String>) -> Self {
        InlineSpan::Text(text.into())
    }

    pub fn bold(text: impl Into<String>) -> Self {
        InlineSpan::Bold(vec![InlineSpan::text(text)])
    }

    pub fn italic(text: impl Into<String>) -> Self {
        InlineSpan::Italic(vec![InlineSpan::text(text)])
    }

    pub fn underline(text: impl Into<String>) -> Self {
        InlineSpan::Underline(vec![InlineSpan::text(text)])
    }

    pub fn code(text: impl Into<String>) -> Self {
        InlineSpan::Code(text.into())
    }

    pub fn link(text: impl Into<String>, target: LinkTarget) -> Self {
        InlineSpan::Link {
            text: text.into(),
            target,
        }
    }

    /// Children of a styled run, `None` for leaf spans.
    pub fn children(&self) -> Option<&[InlineSpan]> {
        match self {
            InlineSpan::Bold(children)
            | InlineSpan::Italic(children)
            | InlineSpan::Underline(children)
            | InlineSpan::Strike(children)
            | InlineSpan::Superscript(children)
            | InlineSpan::Subscript(children) => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<InlineSpan>> {
        match self {
            InlineSpan::Bold(children)
            | InlineSpan::Italic(children)
            | InlineSpan::Underline(children)
            | InlineSpan::Strike(children)
            | InlineSpan::Superscript(children)
            | InlineSpan::Subscript(children) => Some(children),
            _ => None,
        }
    }
}

/// Canonical form of a span sequence: adjacent text runs are merged and empty
/// text runs dropped, recursively. The parser produces this form, so documents
/// built through the constructors compare equal after a round trip.
pub fn normalize_spans(spans: Vec<InlineSpan>) -> Vec<InlineSpan> {
    let mut normalized: Vec<InlineSpan> = Vec::with_capacity(spans.len());

    for mut span in spans {
        if let Some(children) = span.children_mut() {
            let taken = std::mem::take(children);
            *children = normalize_spans(taken);
        }

        match span {
            InlineSpan::Text(text) if text.is_empty() => {}
            InlineSpan::Text(text) => match normalized.last_mut() {
                Some(InlineSpan::Text(previous)) => previous.push_str(&text),
                _ => normalized.push(InlineSpan::Text(text)),
            },
            other => normalized.push(other),
        }
    }

    normalized
}

/// Visible text of a span sequence. Raw passthrough markup contributes nothing.
pub fn plain_text(spans: &[InlineSpan]) -> String {
    let mut output = String::new();
    push_plain_text(spans, &mut output);
    output
}

fn push_plain_text(spans: &[InlineSpan], output: &mut String) {
    for span in spans {
        match span {
            InlineSpan::Text(text) | InlineSpan::Code(text) => output.push_str(text),
            InlineSpan::Link { text, .. } => output.push_str(text),
            InlineSpan::LineBreak => output.push('\n'),
            InlineSpan::Raw(_) => {}
            styled => {
                if let Some(children) = styled.children() {
                    push_plain_text(children, output);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merges_adjacent_text_recursively() {
        let spans = vec![
            InlineSpan::text("a"),
            InlineSpan::text(""),
            InlineSpan::text("b"),
            InlineSpan::Bold(vec![InlineSpan::text("c"), InlineSpan::text("d")]),
            InlineSpan::text("e"),
        ];
        assert_eq!(
            normalize_spans(spans),
            vec![
                InlineSpan::text("ab"),
                InlineSpan::Bold(vec![InlineSpan::text("cd")]),
                InlineSpan::text("e"),
            ]
        );
    }

    #[test]
    fn plain_text_skips_raw_markup() {
        let spans = vec![
            InlineSpan::text("see "),
            InlineSpan::link("docs", LinkTarget::Page("Docs".into())),
            InlineSpan::Raw("<ac:emoticon ac:name=\"smile\"/>".into()),
        ];
        assert_eq!(plain_text(&spans), "see docs");
    }
}
