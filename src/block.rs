use serde::Serialize;

/// A span of paragraph text sharing one set of style flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italics: bool,
    pub underline: bool,
    pub font: String,
    pub size_pt: f32,
}

impl StyledRun {
    /// Unstyled run in the given font
    pub fn plain(text: impl Into<String>, font: &str, size_pt: f32) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italics: false,
            underline: false,
            font: font.to_string(),
            size_pt,
        }
    }
}

/// Renderer-agnostic block elements produced from a chapter's token stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Heading, level is always 1, 2 or 3
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<StyledRun>, justified: bool },
    /// Blank line emitted after a list closes
    Spacer,
    Blockquote { text: String, italic: bool },
}

impl Block {
    /// Concatenated text of a paragraph's runs, or the block's text.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Blockquote { text, .. } => text.clone(),
            Block::Paragraph { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
            Block::Spacer => String::new(),
        }
    }
}
