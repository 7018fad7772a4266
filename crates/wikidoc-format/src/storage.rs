//! Names and escaping rules of the storage markup shared with the parser.

use std::borrow::Cow;

pub const STRUCTURED_MACRO: &str = "ac:structured-macro";
pub const PARAMETER: &str = "ac:parameter";
pub const RICH_TEXT_BODY: &str = "ac:rich-text-body";
pub const PLAIN_TEXT_BODY: &str = "ac:plain-text-body";
pub const NAME_ATTR: &str = "ac:name";

pub const LINK: &str = "ac:link";
pub const ANCHOR_ATTR: &str = "ac:anchor";
pub const PAGE: &str = "ri:page";
pub const CONTENT_TITLE_ATTR: &str = "ri:content-title";
pub const PLAIN_TEXT_LINK_BODY: &str = "ac:plain-text-link-body";

pub const CODE_MACRO: &str = "code";
pub const PANEL_MACRO: &str = "panel";
pub const STATUS_MACRO: &str = "status";
pub const TOC_MACRO: &str = "toc";
pub const EXPAND_MACRO: &str = "expand";

/// Structured-macro attributes the platform adds on save and that carry no
/// content of their own.
pub const IGNORED_MACRO_ATTRS: &[&str] = &["ac:schema-version", "ac:macro-id"];

pub fn escape_text(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

/// Wrap `text` in a CDATA section, splitting any `]]>` so the section stays
/// well-formed.
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
