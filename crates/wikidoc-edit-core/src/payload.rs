use serde::{Deserialize, Serialize};
use wikidoc_model::Block;

use crate::error::EditResult;

/// New content for a section operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Blocks(Vec<Block>),
    /// Storage-markup fragment, parsed in block context.
    Markup(String),
}

impl From<Vec<Block>> for ContentSource {
    fn from(blocks: Vec<Block>) -> Self {
        ContentSource::Blocks(blocks)
    }
}

pub fn load_content(source: &ContentSource) -> EditResult<Vec<Block>> {
    match source {
        ContentSource::Blocks(blocks) => Ok(blocks.clone()),
        ContentSource::Markup(markup) => Ok(wikidoc_parser::parse_fragment(markup)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use wikidoc_model::InlineSpan;

    #[test]
    fn parses_markup_fragment() {
        let blocks = load_content(&ContentSource::Markup(
            "<p>New <strong>body</strong></p>".into(),
        ))
        .unwrap();
        assert_eq!(
            blocks,
            vec![Block::paragraph(vec![
                InlineSpan::text("New "),
                InlineSpan::bold("body")
            ])]
        );
    }

    #[test]
    fn rejects_unbalanced_fragment() {
        let err = load_content(&ContentSource::Markup("<p>open".into())).unwrap_err();
        assert!(matches!(err, EditError::Parse(_)));
    }

    #[test]
    fn empty_markup_is_empty_content() {
        assert!(load_content(&ContentSource::Markup(String::new()))
            .unwrap()
            .is_empty());
    }
}
