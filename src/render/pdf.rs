//! Page-stream renderer: manuscript → Typst markup → PDF.
//!
//! Paragraph runs are flattened to their text; per-run styling is only
//! kept by the DOCX renderer.

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use super::Manuscript;
use crate::block::Block;
use crate::config::Config;
use crate::error::{Error, Result};

// Bundled with typst-kit, used when the configured font is not installed
const FALLBACK_FONT: &str = "Libertinus Serif";

/// Convert a manuscript to Typst markup
pub fn manuscript_to_typst(manuscript: &Manuscript<'_>, config: &Config) -> String {
    let mut out = String::new();
    let pdf = &config.pdf;

    out.push_str(&format!("#set page(margin: {}pt)\n", pdf.margin_pt));
    out.push_str(&format!(
        "#set text(font: ({}, {}), size: {}pt)\n",
        typst_string(&config.fonts.body),
        typst_string(FALLBACK_FONT),
        pdf.body
    ));
    out.push_str("#set par(linebreaks: \"optimized\")\n\n");

    emit_title_page(manuscript, config, &mut out);

    for (index, chapter) in manuscript.chapters.iter().enumerate() {
        if index > 0 {
            out.push_str("#pagebreak()\n\n");
        }
        out.push_str(&format!("#underline[#text(size: {}pt)[", pdf.chapter_title));
        escape_into(&chapter.title, &mut out);
        out.push_str("]]\n\n#v(1em)\n\n");

        for block in &chapter.blocks {
            emit_block(block, &mut out);
        }
    }

    out
}

fn emit_title_page(manuscript: &Manuscript<'_>, config: &Config, out: &mut String) {
    let book = manuscript.book;
    let pdf = &config.pdf;

    out.push_str("#align(center)[\n");
    emit_sized_line(&book.title, pdf.title, out);
    if let Some(subtitle) = book.display_subtitle() {
        emit_sized_line(subtitle, pdf.subtitle, out);
    }
    emit_sized_line(&book.byline(), pdf.author, out);
    out.push_str("]\n\n#v(1em)\n\n");
}

fn emit_sized_line(text: &str, size: f32, out: &mut String) {
    out.push_str(&format!("#text(size: {}pt)[", size));
    escape_into(text, out);
    out.push_str("]\n\n");
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, text } => {
            out.push_str(&format!("#heading(level: {})[", level));
            escape_into(text, out);
            out.push_str("]\n\n");
        }
        Block::Paragraph { runs, justified } => {
            out.push_str(&format!("#par(justify: {})[", justified));
            for run in runs {
                escape_into(&run.text, out);
            }
            out.push_str("]\n\n");
        }
        Block::Spacer => {
            out.push_str("#v(1em)\n\n");
        }
        Block::Blockquote { text, italic } => {
            out.push_str("#pad(left: 2em)[");
            if *italic {
                out.push_str("#emph[");
                escape_into(text, out);
                out.push(']');
            } else {
                escape_into(text, out);
            }
            out.push_str("]\n\n");
        }
    }
}

/// Escape text for Typst markup. Line breaks become spaces so a block
/// never splits into several paragraphs, and every character that can
/// start markup at the beginning of a line is escaped.
fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '=' | '-' | '+'
            | '/' | '~' | '.' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(ch),
        }
    }
}

/// A Typst string literal
fn typst_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Compile a manuscript to PDF bytes.
pub fn render_pdf(manuscript: &Manuscript<'_>, config: &Config) -> Result<Vec<u8>> {
    let typst_content = manuscript_to_typst(manuscript, config);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Typst(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Pdf(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{Book, Chapter};
    use crate::config::BodyStyle;

    fn book(chapters: &[(&str, &str)]) -> Book {
        Book {
            title: "My Book".to_string(),
            subtitle: Some("A Story".to_string()),
            author: "Jo".to_string(),
            chapters: chapters
                .iter()
                .map(|(title, content)| Chapter {
                    title: title.to_string(),
                    content: content.to_string(),
                    ..Chapter::default()
                })
                .collect(),
            ..Book::default()
        }
    }

    fn typst_for(book: &Book) -> String {
        let config = Config::compiled_default();
        let manuscript = Manuscript::from_book(book, &BodyStyle::default());
        manuscript_to_typst(&manuscript, &config)
    }

    #[test]
    fn title_page() {
        let out = typst_for(&book(&[]));
        assert!(out.starts_with("#set page(margin: 50pt)\n"));
        assert!(out.contains("#set text(font: (\"Charter\", \"Libertinus Serif\"), size: 12pt)"));
        assert!(out.contains("#text(size: 28pt)[My Book]"));
        assert!(out.contains("#text(size: 20pt)[A Story]"));
        assert!(out.contains("#text(size: 16pt)[By Jo]"));
        assert!(!out.contains("#pagebreak()"));
    }

    #[test]
    fn blank_subtitle_is_left_out() {
        let mut b = book(&[]);
        b.subtitle = Some("  ".to_string());
        assert!(!typst_for(&b).contains("#text(size: 20pt)"));
    }

    #[test]
    fn page_break_between_chapters_only() {
        let out = typst_for(&book(&[("One", "a"), ("Two", "b"), ("Three", "c")]));
        assert_eq!(out.matches("#pagebreak()").count(), 2);
        assert!(out.contains("#underline[#text(size: 22pt)[One]]"));
        let one = out.find("[One]").unwrap();
        let first_break = out.find("#pagebreak()").unwrap();
        assert!(one < first_break);
    }

    #[test]
    fn blocks() {
        let out = typst_for(&book(&[(
            "C",
            "## Section\n\nSome **bold** text\n\n- item\n\n> quoted\n",
        )]));
        assert!(out.contains("#heading(level: 2)[Section]"));
        assert!(out.contains("#par(justify: true)[Some bold text]"));
        assert!(out.contains("#par(justify: true)[• item]\n\n#v(1em)"));
        assert!(out.contains("#pad(left: 2em)[#emph[quoted]]"));
    }

    #[test]
    fn ordered_markers_are_escaped() {
        let out = typst_for(&book(&[("C", "1. first\n2. second\n")]));
        assert!(out.contains("#par(justify: true)[1\\. first]"));
        assert!(out.contains("#par(justify: true)[2\\. second]"));
    }

    #[test]
    fn escapes_special_chars() {
        let mut out = String::new();
        escape_into("a * b # c [d] // e", &mut out);
        assert_eq!(out, "a \\* b \\# c \\[d\\] \\/\\/ e");

        let mut out = String::new();
        escape_into("line\nbreak", &mut out);
        assert_eq!(out, "line break");
    }

    #[test]
    fn compiles_to_pdf() {
        let b = book(&[("One", "# Intro\n\nHello *world*.\n\n1. a\n2. b\n"), ("Two", "> q\n")]);
        let config = Config::compiled_default();
        let manuscript = Manuscript::from_book(&b, &config.body_style());

        let result = render_pdf(&manuscript, &config);
        assert!(result.is_ok(), "PDF generation failed: {:?}", result.err());
        assert!(result.unwrap().starts_with(b"%PDF"));
    }
}
