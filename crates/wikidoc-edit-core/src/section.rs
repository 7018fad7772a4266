//! Heading-rooted sections of a document.
//!
//! A section is never stored. It is recomputed from the current block
//! sequence on every lookup: the heading at `start` plus every following
//! top-level block up to (excluding) the next heading whose level is less
//! than or equal to its own. Levels may skip or go backwards; nothing here
//! assumes well-formed nesting.

use std::fmt;
use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;
use wikidoc_config::EditSettings;
use wikidoc_model::{normalize_title, Block, Document, Heading, HeadingLevel};

use crate::error::{EditError, EditResult};

/// Title (compared after whitespace normalization, case-sensitive) and an
/// optional level filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuery {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl SectionQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: None,
        }
    }

    pub fn at_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

}

impl fmt::Display for SectionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{} (h{level})", self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Transient view of a section as top-level block indices. Invalid after any
/// mutation of the document it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    pub level: u8,
}

impl Section {
    /// Heading plus body.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Blocks strictly after the heading.
    pub fn body(&self) -> Range<usize> {
        self.start + 1..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.span().contains(&index)
    }
}

/// The section rooted at `start`, if that block is a heading.
pub fn section_at(blocks: &[Block], start: usize) -> Option<Section> {
    let level = blocks.get(start)?.heading_level()?;
    let end = blocks
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, block)| block.heading_level().is_some_and(|next| next <= level))
        .map_or(blocks.len(), |(index, _)| index);
    Some(Section { start, end, level })
}

/// Every section of the document in heading order.
pub fn sections(document: &Document) -> Vec<Section> {
    let blocks = document.blocks();
    (0..blocks.len())
        .filter_map(|index| section_at(blocks, index))
        .collect()
}

/// First section whose heading matches the query.
pub fn locate(document: &Document, query: &SectionQuery) -> Option<Section> {
    let wanted = normalize_title(&query.title);
    document
        .outline()
        .into_iter()
        .find(|entry| {
            entry.title == wanted && query.level.map_or(true, |level| entry.level == level)
        })
        .and_then(|entry| section_at(document.blocks(), entry.index))
}

/// Like [`locate`], but a miss becomes `SectionNotFound` with the closest
/// existing heading as a suggestion when it scores above `threshold`.
pub fn resolve(document: &Document, query: &SectionQuery, threshold: f64) -> EditResult<Section> {
    if let Some(section) = locate(document, query) {
        debug!(
            "resolved section '{query}' to blocks {}..{}",
            section.start, section.end
        );
        return Ok(section);
    }

    let wanted = normalize_title(&query.title);
    let suggestion = document
        .outline()
        .into_iter()
        .map(|entry| {
            let score = normalized_levenshtein(&wanted, &entry.title);
            (entry.title, score)
        })
        .filter(|(_, score)| *score > threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(title, _)| title);

    Err(EditError::SectionNotFound {
        title: query.title.clone(),
        level: query.level,
        suggestion,
    })
}

/// Replace the body of a section, keeping its heading block untouched.
///
/// When the section is missing and `settings.create_if_absent` is set, a new
/// heading (at the query level or `settings.new_section_level`) and the
/// content are appended to the document instead.
pub fn replace_section_content(
    document: &mut Document,
    query: &SectionQuery,
    content: Vec<Block>,
    settings: &EditSettings,
) -> EditResult<Section> {
    let section = match resolve(document, query, settings.suggestion_threshold) {
        Ok(section) => section,
        Err(EditError::SectionNotFound { .. }) if settings.create_if_absent => {
            return create_section(document, query, content, settings);
        }
        Err(err) => return Err(err),
    };

    let inserted = content.len();
    document.blocks_mut().splice(section.body(), content);
    Ok(Section {
        end: section.start + 1 + inserted,
        ..section
    })
}

/// Change the heading text and, optionally, its level. The body stays where
/// it is; a level change may widen or narrow the section's extent.
pub fn rename_section(
    document: &mut Document,
    query: &SectionQuery,
    new_title: &str,
    new_level: Option<u8>,
    settings: &EditSettings,
) -> EditResult<Section> {
    let section = resolve(document, query, settings.suggestion_threshold)?;
    let level = new_level.map(HeadingLevel::new).transpose()?;

    let blocks = document.blocks_mut();
    if let Some(heading) = blocks[section.start].as_heading_mut() {
        heading.set_text(new_title);
        if let Some(level) = level {
            heading.level = level;
        }
    }

    Ok(section_at(blocks, section.start).unwrap_or(section))
}

/// Remove a section. With `keep_content` only the heading goes and the body
/// stays in place under whatever heading precedes it.
///
/// Returns the removed span in the coordinates of the document before the
/// edit.
pub fn delete_section(
    document: &mut Document,
    query: &SectionQuery,
    keep_content: bool,
    settings: &EditSettings,
) -> EditResult<Section> {
    let section = resolve(document, query, settings.suggestion_threshold)?;
    let blocks = document.blocks_mut();
    if keep_content {
        blocks.remove(section.start);
    } else {
        blocks.drain(section.span());
    }
    Ok(section)
}

/// Where a moved section lands relative to its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePosition {
    Before,
    #[default]
    After,
}

/// Move a section (heading and body, order preserved) before or after the
/// target section's full span.
pub fn move_section(
    document: &mut Document,
    query: &SectionQuery,
    target: &SectionQuery,
    position: MovePosition,
    settings: &EditSettings,
) -> EditResult<Section> {
    let moving = resolve(document, query, settings.suggestion_threshold)?;
    let anchor = resolve(document, target, settings.suggestion_threshold)?;

    if moving.contains(anchor.start) {
        return Err(EditError::CyclicMove {
            title: query.title.clone(),
            target: target.title.clone(),
        });
    }

    let blocks = document.blocks_mut();
    let moved: Vec<Block> = blocks.drain(moving.span()).collect();
    let count = moved.len();

    let anchor_start = if anchor.start > moving.start {
        anchor.start - count
    } else {
        anchor.start
    };
    let insert_at = match position {
        MovePosition::Before => anchor_start,
        MovePosition::After => section_at(blocks, anchor_start)
            .map_or(anchor_start + 1, |section| section.end),
    };

    blocks.splice(insert_at..insert_at, moved);
    Ok(Section {
        start: insert_at,
        end: insert_at + count,
        level: moving.level,
    })
}

/// Append blocks at the end of a section's body. Honours
/// `create_if_absent` like [`replace_section_content`].
pub fn append_to_section(
    document: &mut Document,
    query: &SectionQuery,
    content: Vec<Block>,
    settings: &EditSettings,
) -> EditResult<Section> {
    let section = match resolve(document, query, settings.suggestion_threshold) {
        Ok(section) => section,
        Err(EditError::SectionNotFound { .. }) if settings.create_if_absent => {
            return create_section(document, query, content, settings);
        }
        Err(err) => return Err(err),
    };

    let inserted = content.len();
    document
        .blocks_mut()
        .splice(section.end..section.end, content);
    Ok(Section {
        end: section.end + inserted,
        ..section
    })
}

/// Placement of a brand new section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    Start,
    #[default]
    End,
    Before(SectionQuery),
    After(SectionQuery),
}

/// Insert a heading followed by `content`.
pub fn insert_section(
    document: &mut Document,
    heading: Heading,
    content: Vec<Block>,
    position: &InsertPosition,
    settings: &EditSettings,
) -> EditResult<Section> {
    let at = match position {
        InsertPosition::Start => 0,
        InsertPosition::End => document.len(),
        InsertPosition::Before(query) => {
            resolve(document, query, settings.suggestion_threshold)?.start
        }
        InsertPosition::After(query) => {
            resolve(document, query, settings.suggestion_threshold)?.end
        }
    };

    let level = heading.level();
    let count = content.len() + 1;
    let blocks = std::iter::once(Block::Heading(heading)).chain(content);
    document.blocks_mut().splice(at..at, blocks);
    Ok(Section {
        start: at,
        end: at + count,
        level,
    })
}

fn create_section(
    document: &mut Document,
    query: &SectionQuery,
    content: Vec<Block>,
    settings: &EditSettings,
) -> EditResult<Section> {
    let level = query.level.unwrap_or(settings.new_section_level);
    let heading = Heading::new(level, normalize_title(&query.title))?;
    debug!("section '{query}' not found; creating it at level {level}");
    insert_section(document, heading, content, &InsertPosition::End, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading(level: u8, text: &str) -> Block {
        Block::heading(level, text).unwrap()
    }

    fn titles(document: &Document) -> Vec<String> {
        document
            .blocks()
            .iter()
            .map(|block| match block {
                Block::Heading(heading) => format!("h{}:{}", heading.level(), heading.text),
                Block::Paragraph { spans } => wikidoc_model::plain_text(spans),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn section_ends_at_next_heading_of_same_or_higher_rank() {
        let doc = Document::from_blocks(vec![
            heading(2, "A"),
            Block::text("a"),
            heading(4, "A.1"),
            Block::text("a1"),
            heading(3, "A.2"),
            heading(1, "B"),
            Block::text("b"),
        ]);

        let a = locate(&doc, &SectionQuery::new("A")).unwrap();
        assert_eq!(a.span(), 0..5);
        let a1 = locate(&doc, &SectionQuery::new("A.1")).unwrap();
        assert_eq!(a1.span(), 2..4);
        let b = locate(&doc, &SectionQuery::new("B")).unwrap();
        assert_eq!(b.span(), 5..7);
        assert_eq!(sections(&doc).len(), 4);
    }

    #[test]
    fn title_match_is_exact_after_whitespace_normalization() {
        let doc = Document::from_blocks(vec![heading(2, "  Release   Notes ")]);
        assert!(locate(&doc, &SectionQuery::new("Release Notes")).is_some());
        assert!(locate(&doc, &SectionQuery::new("release notes")).is_none());
        assert!(locate(&doc, &SectionQuery::new("Release Notes").at_level(3)).is_none());
    }

    #[test]
    fn miss_suggests_closest_heading() {
        let doc = Document::from_blocks(vec![heading(2, "Overview"), heading(2, "Details")]);
        let err = resolve(&doc, &SectionQuery::new("Overviw"), 0.6).unwrap_err();
        assert_eq!(
            err,
            EditError::SectionNotFound {
                title: "Overviw".into(),
                level: None,
                suggestion: Some("Overview".into()),
            }
        );

        let err = resolve(&doc, &SectionQuery::new("Zzz"), 0.6).unwrap_err();
        assert!(matches!(
            err,
            EditError::SectionNotFound {
                suggestion: None,
                ..
            }
        ));
    }

    #[test]
    fn move_before_and_after_keep_internal_order() {
        let original = Document::from_blocks(vec![
            heading(2, "One"),
            Block::text("1"),
            heading(2, "Two"),
            Block::text("2a"),
            Block::text("2b"),
            heading(2, "Three"),
        ]);
        let settings = EditSettings::default();

        let mut doc = original.clone();
        let moved = move_section(
            &mut doc,
            &SectionQuery::new("Two"),
            &SectionQuery::new("Three"),
            MovePosition::After,
            &settings,
        )
        .unwrap();
        assert_eq!(titles(&doc), ["h2:One", "1", "h2:Three", "h2:Two", "2a", "2b"]);
        assert_eq!(moved.span(), 3..6);

        let mut doc = original;
        move_section(
            &mut doc,
            &SectionQuery::new("Three"),
            &SectionQuery::new("One"),
            MovePosition::Before,
            &settings,
        )
        .unwrap();
        assert_eq!(titles(&doc), ["h2:Three", "h2:One", "1", "h2:Two", "2a", "2b"]);
    }

    #[test]
    fn moving_a_section_after_its_parent_lands_after_the_parent_remainder() {
        let mut doc = Document::from_blocks(vec![
            heading(1, "Parent"),
            heading(2, "Child"),
            Block::text("c"),
            heading(2, "Sibling"),
            heading(1, "Next"),
        ]);
        move_section(
            &mut doc,
            &SectionQuery::new("Child"),
            &SectionQuery::new("Parent"),
            MovePosition::After,
            &EditSettings::default(),
        )
        .unwrap();
        assert_eq!(
            titles(&doc),
            ["h1:Parent", "h2:Sibling", "h2:Child", "c", "h1:Next"]
        );
    }

    #[test]
    fn moving_into_a_subsection_is_cyclic() {
        let mut doc = Document::from_blocks(vec![
            heading(1, "Parent"),
            heading(2, "Child"),
            heading(1, "Other"),
        ]);
        let before = doc.clone();
        let err = move_section(
            &mut doc,
            &SectionQuery::new("Parent"),
            &SectionQuery::new("Child"),
            MovePosition::After,
            &EditSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::CyclicMove { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn rename_can_change_level_and_extent() {
        let mut doc = Document::from_blocks(vec![
            heading(2, "A"),
            heading(3, "B"),
            Block::text("b"),
            heading(2, "C"),
        ]);
        let section = rename_section(
            &mut doc,
            &SectionQuery::new("B"),
            "B prime",
            Some(1),
            &EditSettings::default(),
        )
        .unwrap();
        assert_eq!(section.span(), 1..4);
        assert_eq!(titles(&doc)[1], "h1:B prime");

        let err = rename_section(
            &mut doc,
            &SectionQuery::new("C"),
            "C",
            Some(9),
            &EditSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Model(_)));
    }

    #[test]
    fn insert_section_positions() {
        let mut doc = Document::from_blocks(vec![heading(2, "A"), heading(2, "B")]);
        let settings = EditSettings::default();
        let new = |title: &str| Heading::new(2, title).unwrap();

        insert_section(&mut doc, new("Start"), vec![], &InsertPosition::Start, &settings).unwrap();
        insert_section(&mut doc, new("End"), vec![], &InsertPosition::End, &settings).unwrap();
        insert_section(
            &mut doc,
            new("Before B"),
            vec![Block::text("x")],
            &InsertPosition::Before(SectionQuery::new("B")),
            &settings,
        )
        .unwrap();
        insert_section(
            &mut doc,
            new("After A"),
            vec![],
            &InsertPosition::After(SectionQuery::new("A")),
            &settings,
        )
        .unwrap();

        assert_eq!(
            titles(&doc),
            ["h2:Start", "h2:A", "h2:After A", "h2:Before B", "x", "h2:B", "h2:End"]
        );
    }
}
