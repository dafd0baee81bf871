//! Document assemblers.
//!
//! Both renderers read the same [`Manuscript`]: the book's metadata plus
//! one block sequence per chapter. Chapter breaks are the renderer's job;
//! the converter never emits them.

pub mod docx;
pub mod pdf;

use crate::block::Block;
use crate::book::Book;
use crate::config::BodyStyle;
use crate::convert::{self, Skipped};
use crate::tokenizer::tokenize;

/// One chapter ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterBlocks {
    pub title: String,
    pub blocks: Vec<Block>,
    pub skipped: Vec<Skipped>,
}

/// A book converted chapter by chapter into blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Manuscript<'a> {
    pub book: &'a Book,
    pub chapters: Vec<ChapterBlocks>,
}

impl<'a> Manuscript<'a> {
    /// Tokenize and convert every chapter, each from a fresh list state.
    pub fn from_book(book: &'a Book, style: &BodyStyle) -> Self {
        let chapters = book
            .chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| {
                let tokens = tokenize(&chapter.content);
                let conversion = convert::convert(&tokens, style);
                if !conversion.is_complete() {
                    tracing::warn!(
                        chapter = index,
                        title = %chapter.title,
                        skipped = conversion.skipped.len(),
                        "chapter converted with skipped tokens"
                    );
                }
                tracing::debug!(
                    chapter = index,
                    tokens = tokens.len(),
                    blocks = conversion.blocks.len(),
                    "converted chapter"
                );
                ChapterBlocks {
                    title: chapter.title.clone(),
                    blocks: conversion.blocks,
                    skipped: conversion.skipped,
                }
            })
            .collect();

        Self { book, chapters }
    }
}
