//! Token stream → block sequence.
//!
//! A single left-to-right pass over the tokens of one chapter. Lists and
//! blockquotes do not carry their styling on the inline tokens they
//! contain, so the pass threads a [`ListState`] accumulator from one token
//! to the next. Each step looks at the current token (and at most two
//! tokens ahead), produces at most one [`Block`], and says how far to move.
//!
//! A token that cannot be turned into a block is recorded as [`Skipped`]
//! and the walk continues, so one malformed token never costs the rest of
//! the chapter.

use thiserror::Error;

use crate::block::{Block, StyledRun};
use crate::config::BodyStyle;
use crate::runs::build_runs;
use crate::token::{Token, TokenCursor, TokenKind};

const BULLET_MARKER: &str = "• ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bullet,
    Ordered,
}

/// Fold accumulator for the walk. Starts fresh for every chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListState {
    pub in_list: bool,
    pub list_type: Option<ListType>,
    pub ordered_counter: u32,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            in_list: false,
            list_type: None,
            ordered_counter: 1,
        }
    }
}

impl ListState {
    fn open(list_type: ListType) -> Self {
        Self {
            in_list: true,
            list_type: Some(list_type),
            ordered_counter: 1,
        }
    }

    /// Marker text for the next list paragraph, if inside a list.
    fn marker(&self) -> Option<String> {
        if !self.in_list {
            return None;
        }
        match self.list_type? {
            ListType::Bullet => Some(BULLET_MARKER.to_string()),
            ListType::Ordered => Some(format!("{}. ", self.ordered_counter)),
        }
    }
}

/// Why a token produced no block.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The token after a heading or paragraph opener is not `inline`.
    #[error("expected an inline token to follow")]
    NotInline,
    /// `blockquote_open` is not followed by `paragraph_open`, `inline`.
    #[error("blockquote is not followed by a paragraph")]
    BrokenBlockquote,
    /// Lookahead ran past the last token.
    #[error("token stream ended before the block was complete")]
    EndOfStream,
    /// An `inline` token under a paragraph has no children.
    #[error("inline token has no children")]
    MissingChildren,
    /// An `inline` token whose text is needed has no content.
    #[error("inline token has no content")]
    MissingContent,
}

impl SkipReason {
    /// Structural skips are the expected shape of odd-but-valid markdown;
    /// the rest mean the token itself is missing data.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SkipReason::NotInline | SkipReason::BrokenBlockquote | SkipReason::EndOfStream
        )
    }
}

/// A token that was consumed without emitting a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
    pub index: usize,
    pub reason: SkipReason,
}

/// Blocks of one chapter plus the tokens that were skipped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub blocks: Vec<Block>,
    pub skipped: Vec<Skipped>,
}

impl Conversion {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of handling the token under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: ListState,
    pub emitted: Result<Option<Block>, SkipReason>,
    pub advance: usize,
}

impl Step {
    fn new(state: ListState, emitted: Result<Option<Block>, SkipReason>, advance: usize) -> Self {
        Self {
            state,
            emitted,
            advance,
        }
    }
}

/// Convert one chapter's tokens into blocks.
pub fn convert(tokens: &[Token], style: &BodyStyle) -> Conversion {
    let mut cursor = TokenCursor::new(tokens);
    let mut state = ListState::default();
    let mut conversion = Conversion::default();

    while !cursor.is_done() {
        let index = cursor.position();
        let Step {
            state: next,
            emitted,
            advance,
        } = step(state, &cursor, style);

        match emitted {
            Ok(Some(block)) => conversion.blocks.push(block),
            Ok(None) => {}
            Err(reason) => {
                if reason.is_structural() {
                    tracing::debug!(index, %reason, "skipped token");
                } else {
                    tracing::warn!(index, %reason, "skipped malformed token");
                }
                conversion.skipped.push(Skipped { index, reason });
            }
        }

        state = next;
        cursor.advance(advance);
    }

    conversion
}

/// Handle the token under the cursor. The advance distance depends only on
/// the token type, never on whether a block was emitted.
pub fn step(state: ListState, cursor: &TokenCursor<'_>, style: &BodyStyle) -> Step {
    let Some(token) = cursor.peek(0) else {
        return Step::new(state, Ok(None), 1);
    };

    match token.kind {
        TokenKind::HeadingOpen => {
            let level = heading_level(token.tag.as_deref());
            let emitted = inline_after(cursor).and_then(|inline| {
                let text = inline.content.clone().ok_or(SkipReason::MissingContent)?;
                Ok(Some(Block::Heading { level, text }))
            });
            Step::new(state, emitted, 2)
        }

        TokenKind::ParagraphOpen => match paragraph(state, cursor, style) {
            Ok((next, block)) => Step::new(next, Ok(Some(block)), 2),
            Err(reason) => Step::new(state, Err(reason), 2),
        },

        TokenKind::BulletListOpen => Step::new(ListState::open(ListType::Bullet), Ok(None), 1),
        TokenKind::OrderedListOpen => Step::new(ListState::open(ListType::Ordered), Ok(None), 1),
        TokenKind::BulletListClose | TokenKind::OrderedListClose => {
            Step::new(ListState::default(), Ok(Some(Block::Spacer)), 1)
        }

        TokenKind::BlockquoteOpen => Step::new(state, blockquote(cursor), 3),

        _ => Step::new(state, Ok(None), 1),
    }
}

fn heading_level(tag: Option<&str>) -> u8 {
    match tag {
        Some("h1") => 1,
        Some("h2") => 2,
        _ => 3,
    }
}

fn inline_after<'a>(cursor: &TokenCursor<'a>) -> Result<&'a Token, SkipReason> {
    match cursor.peek(1) {
        Some(next) if next.is(TokenKind::Inline) => Ok(next),
        Some(_) => Err(SkipReason::NotInline),
        None => Err(SkipReason::EndOfStream),
    }
}

fn paragraph(
    state: ListState,
    cursor: &TokenCursor<'_>,
    style: &BodyStyle,
) -> Result<(ListState, Block), SkipReason> {
    let inline = inline_after(cursor)?;
    let children = inline.children.as_deref().ok_or(SkipReason::MissingChildren)?;
    let mut runs = build_runs(children, style);
    let mut next = state;

    if let Some(marker) = state.marker() {
        runs.insert(0, StyledRun::plain(marker, &style.font, style.size_pt));
        if state.list_type == Some(ListType::Ordered) {
            next.ordered_counter += 1;
        }
    }

    Ok((
        next,
        Block::Paragraph {
            runs,
            justified: true,
        },
    ))
}

fn blockquote(cursor: &TokenCursor<'_>) -> Result<Option<Block>, SkipReason> {
    let (Some(paragraph), Some(inline)) = (cursor.peek(1), cursor.peek(2)) else {
        return Err(SkipReason::EndOfStream);
    };
    if !paragraph.is(TokenKind::ParagraphOpen) || !inline.is(TokenKind::Inline) {
        return Err(SkipReason::BrokenBlockquote);
    }

    let text = inline.content.clone().ok_or(SkipReason::MissingContent)?;
    Ok(Some(Block::Blockquote { text, italic: true }))
}
