//! Export books written in Markdown to PDF and DOCX.
//!
//! Each chapter goes through the same pipeline:
//!
//! 1. [`tokenize`] turns its Markdown into a flat token stream
//! 2. [`convert`] walks the tokens once and emits [`Block`]s
//! 3. a renderer in [`render`] assembles the blocks of all chapters
//!
//! [`export_book`] runs the whole pipeline for a [`Book`].

mod block;
mod book;
mod config;
mod convert;
mod error;
mod export;
pub mod outline;
pub mod render;
mod runs;
mod token;
mod tokenizer;

pub use block::{Block, StyledRun};
pub use book::{Book, Chapter};
pub use config::{BodyStyle, Config, RunStyling};
pub use convert::{Conversion, ListState, ListType, SkipReason, Skipped, Step, convert, step};
pub use error::{Error, Result};
pub use export::{Artifact, ExportFormat, attachment_file_name, export_book};
pub use runs::build_runs;
pub use token::{InlineChild, Token, TokenCursor, TokenKind, tokens_from_json};
pub use tokenizer::tokenize;

/// Parse markdown text into blocks using the given body style.
pub fn markdown_to_blocks(markdown: &str, style: &BodyStyle) -> Conversion {
    let tokens = tokenize(markdown);
    convert(&tokens, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_pipeline() {
        let markdown = "# Title\n\nIntro with *style*.\n\n1. one\n2. two\n\n> a quote\n\n### Deep\n";
        let conversion = markdown_to_blocks(markdown, &BodyStyle::default());
        assert!(conversion.is_complete());

        let texts: Vec<String> = conversion.blocks.iter().map(Block::plain_text).collect();
        assert_eq!(
            texts,
            vec!["Title", "Intro with style.", "1. one", "2. two", "", "a quote", "Deep"]
        );
        assert!(matches!(conversion.blocks[6], Block::Heading { level: 3, .. }));
    }

    #[test]
    fn empty_markdown_has_no_blocks() {
        assert!(markdown_to_blocks("", &BodyStyle::default()).blocks.is_empty());
    }
}
