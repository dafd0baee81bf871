use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token types in the flat markdown token stream.
///
/// Names follow the markdown-it convention (`heading_open`, `inline`, ...)
/// so token streams produced by other tools deserialize unchanged. Any
/// type this crate does not know about lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    HeadingOpen,
    HeadingClose,
    ParagraphOpen,
    ParagraphClose,
    Inline,
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    BlockquoteOpen,
    BlockquoteClose,
    Fence,
    CodeBlock,
    Hr,
    HtmlBlock,
    TableOpen,
    TableClose,
    TheadOpen,
    TheadClose,
    TbodyOpen,
    TbodyClose,
    TrOpen,
    TrClose,
    ThOpen,
    ThClose,
    TdOpen,
    TdClose,

    // Inline children
    Text,
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    UnderlineOpen,
    UnderlineClose,
    SOpen,
    SClose,
    CodeInline,
    Softbreak,
    Hardbreak,
    LinkOpen,
    LinkClose,
    Image,
    HtmlInline,

    #[serde(other)]
    Other,
}

/// One token of the stream. Block-level tokens carry a `tag` (`h2`, `p`,
/// `ul`, ...); `inline` tokens carry the raw `content` of the run of text
/// and its parsed `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<Token>>,
}

/// Children of an `inline` token share the token shape.
pub type InlineChild = Token;

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            tag: None,
            content: None,
            children: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = Some(children);
        self
    }

    /// An `inline` token whose only child is a plain text node.
    pub fn inline_text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self::new(TokenKind::Inline)
            .with_content(content.clone())
            .with_children(vec![Self::new(TokenKind::Text).with_content(content)])
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Load a token stream produced by another tokenizer.
///
/// The input must be a JSON array of tokens.
pub fn tokens_from_json(json: &str) -> Result<Vec<Token>> {
    Ok(serde_json::from_str(json)?)
}

/// Read-only cursor over a token slice with bounded lookahead.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Token at `offset` positions past the current one (`0` is current).
    pub fn peek(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }
}
