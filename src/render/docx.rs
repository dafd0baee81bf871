//! Package-document renderer: manuscript → WordprocessingML in a ZIP.
//!
//! The package is the minimal set of parts Word needs: content types,
//! package relationships, the main document with its styles, and core
//! properties carrying the title and author.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use super::Manuscript;
use crate::block::{Block, StyledRun};
use crate::config::Config;
use crate::error::Result;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

/// Paragraph alignment (`w:jc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Center,
    Both,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Center => "center",
            Align::Both => "both",
        }
    }
}

#[derive(Debug, Default)]
struct Run<'a> {
    text: &'a str,
    bold: bool,
    italics: bool,
    underline: bool,
    font: Option<&'a str>,
    size_pt: Option<f32>,
    color: Option<&'a str>,
}

impl<'a> Run<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    fn styled(run: &'a StyledRun) -> Self {
        Self {
            text: &run.text,
            bold: run.bold,
            italics: run.italics,
            underline: run.underline,
            font: Some(&run.font),
            size_pt: Some(run.size_pt),
            color: None,
        }
    }
}

#[derive(Debug, Default)]
struct Para<'a> {
    style: Option<String>,
    align: Option<Align>,
    before: Option<u32>,
    after: Option<u32>,
    indent_left: Option<u32>,
    page_break_before: bool,
    border_bottom: Option<&'a str>,
    runs: Vec<Run<'a>>,
}

impl Para<'_> {
    fn write(&self, out: &mut String) {
        out.push_str("<w:p>");

        let mut props = String::new();
        if let Some(style) = &self.style {
            props.push_str(&format!("<w:pStyle w:val=\"{}\"/>", xml_text(style.as_str())));
        }
        if self.page_break_before {
            props.push_str("<w:pageBreakBefore/>");
        }
        if let Some(color) = self.border_bottom {
            props.push_str(&format!(
                "<w:pBdr><w:bottom w:val=\"single\" w:sz=\"12\" w:space=\"1\" w:color=\"{}\"/></w:pBdr>",
                xml_text(color)
            ));
        }
        if self.before.is_some() || self.after.is_some() {
            props.push_str("<w:spacing");
            if let Some(before) = self.before {
                props.push_str(&format!(" w:before=\"{}\"", before));
            }
            if let Some(after) = self.after {
                props.push_str(&format!(" w:after=\"{}\"", after));
            }
            props.push_str("/>");
        }
        if let Some(left) = self.indent_left {
            props.push_str(&format!("<w:ind w:left=\"{}\"/>", left));
        }
        if let Some(align) = self.align {
            props.push_str(&format!("<w:jc w:val=\"{}\"/>", align.as_str()));
        }
        if !props.is_empty() {
            out.push_str("<w:pPr>");
            out.push_str(&props);
            out.push_str("</w:pPr>");
        }

        for run in &self.runs {
            write_run(run, out);
        }

        out.push_str("</w:p>\n");
    }
}

fn write_run(run: &Run<'_>, out: &mut String) {
    out.push_str("<w:r>");

    let mut props = String::new();
    if let Some(font) = run.font {
        let font = xml_text(font);
        props.push_str(&format!(
            "<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>"
        ));
    }
    if run.bold {
        props.push_str("<w:b/>");
    }
    if run.italics {
        props.push_str("<w:i/>");
    }
    if let Some(color) = run.color {
        props.push_str(&format!("<w:color w:val=\"{}\"/>", xml_text(color)));
    }
    if let Some(size) = run.size_pt {
        props.push_str(&format!("<w:sz w:val=\"{}\"/>", half_points(size)));
    }
    // rPr children are ordered by the schema; underline follows size
    if run.underline {
        props.push_str("<w:u w:val=\"single\"/>");
    }
    if !props.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&props);
        out.push_str("</w:rPr>");
    }

    out.push_str(&format!(
        "<w:t xml:space=\"preserve\">{}</w:t>",
        xml_text(run.text)
    ));
    out.push_str("</w:r>");
}

/// Escape text for element content or an attribute value. Control
/// characters other than tab, newline and carriage return are not allowed in
/// XML 1.0 and are dropped.
fn xml_text(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|&c| c >= ' ' || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(allowed.as_str()).into_owned()
}

fn half_points(size_pt: f32) -> u32 {
    (size_pt * 2.0).round() as u32
}

/// Generate `word/document.xml`
pub fn document_xml(manuscript: &Manuscript<'_>, config: &Config) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!("<w:document xmlns:w=\"{}\" xmlns:r=\"{}\">\n", NS_W, NS_R));
    out.push_str("<w:body>\n");

    write_title_section(manuscript, config, &mut out);

    for (index, chapter) in manuscript.chapters.iter().enumerate() {
        if index > 0 {
            Para {
                page_break_before: true,
                ..Para::default()
            }
            .write(&mut out);
        }
        Para {
            style: Some(heading_style(1)),
            before: Some(config.spacing.chapter_before),
            runs: vec![Run::text(&chapter.title)],
            ..Para::default()
        }
        .write(&mut out);

        for block in &chapter.blocks {
            block_para(block, config).write(&mut out);
        }
    }

    let margin = config.page.margin_twips;
    out.push_str(&format!(
        "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/><w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>\n",
        m = margin
    ));
    out.push_str("</w:body>\n");
    out.push_str("</w:document>");
    out
}

fn write_title_section(manuscript: &Manuscript<'_>, config: &Config, out: &mut String) {
    let book = manuscript.book;
    let heading_font = config.fonts.heading.as_str();
    let byline = book.byline();

    let mut lines = vec![Run {
        text: &book.title,
        bold: true,
        font: Some(heading_font),
        size_pt: Some(config.sizes.title),
        color: Some(&config.colors.title),
        ..Run::default()
    }];
    if let Some(subtitle) = book.display_subtitle() {
        lines.push(Run {
            text: subtitle,
            font: Some(heading_font),
            size_pt: Some(config.sizes.subtitle),
            color: Some(&config.colors.subtitle),
            ..Run::default()
        });
    }
    lines.push(Run {
        text: &byline,
        font: Some(heading_font),
        size_pt: Some(config.sizes.author),
        color: Some(&config.colors.author),
        ..Run::default()
    });

    for run in lines {
        Para {
            align: Some(Align::Center),
            after: Some(config.spacing.title_after),
            runs: vec![run],
            ..Para::default()
        }
        .write(out);
    }

    // Decorative rule under the title block
    Para {
        border_bottom: Some(&config.colors.rule),
        ..Para::default()
    }
    .write(out);
}

fn block_para<'a>(block: &'a Block, config: &'a Config) -> Para<'a> {
    let spacing = &config.spacing;
    match block {
        Block::Heading { level, text } => Para {
            style: Some(heading_style(*level)),
            before: Some(spacing.heading_before),
            after: Some(spacing.heading_after),
            runs: vec![Run::text(text)],
            ..Para::default()
        },
        Block::Paragraph { runs, justified } => Para {
            align: justified.then_some(Align::Both),
            before: Some(spacing.paragraph_before),
            after: Some(spacing.paragraph_after),
            runs: runs.iter().map(Run::styled).collect(),
            ..Para::default()
        },
        Block::Spacer => Para {
            after: Some(spacing.spacer_after),
            ..Para::default()
        },
        Block::Blockquote { text, italic } => Para {
            align: Some(Align::Both),
            before: Some(spacing.blockquote),
            after: Some(spacing.blockquote),
            indent_left: Some(spacing.blockquote_indent),
            runs: vec![Run {
                text,
                italics: *italic,
                font: Some(&config.fonts.body),
                size_pt: Some(config.sizes.body),
                color: Some(&config.colors.blockquote),
                ..Run::default()
            }],
            ..Para::default()
        },
    }
}

fn heading_style(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 3))
}

/// Generate `word/styles.xml` with Normal and Heading1-3
pub fn styles_xml(config: &Config) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!("<w:styles xmlns:w=\"{}\">\n", NS_W));

    let body_font = xml_text(config.fonts.body.as_str());
    out.push_str(&format!(
        "<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii=\"{f}\" w:hAnsi=\"{f}\" w:cs=\"{f}\"/><w:sz w:val=\"{}\"/></w:rPr></w:rPrDefault></w:docDefaults>\n",
        half_points(config.sizes.body),
        f = body_font
    ));
    out.push_str(
        "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>\n",
    );

    let heading_font = xml_text(config.fonts.heading.as_str());
    for level in 1..=3u8 {
        out.push_str(&format!(
            "<w:style w:type=\"paragraph\" w:styleId=\"Heading{level}\"><w:name w:val=\"heading {level}\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val=\"{outline}\"/></w:pPr><w:rPr><w:rFonts w:ascii=\"{f}\" w:hAnsi=\"{f}\" w:cs=\"{f}\"/><w:b/><w:sz w:val=\"{size}\"/></w:rPr></w:style>\n",
            level = level,
            outline = level - 1,
            f = heading_font,
            size = half_points(config.sizes.for_heading(level)),
        ));
    }

    out.push_str("</w:styles>");
    out
}

/// Generate `docProps/core.xml`
pub fn core_xml(manuscript: &Manuscript<'_>) -> String {
    let book = manuscript.book;
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title><dc:creator>{}</dc:creator></cp:coreProperties>"
        ),
        xml_text(book.title.as_str()),
        xml_text(book.author.as_str())
    )
}

/// Assemble the DOCX package bytes.
pub fn render_docx(manuscript: &Manuscript<'_>, config: &Config) -> Result<Vec<u8>> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("docProps/core.xml", core_xml(manuscript)),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        ("word/document.xml", document_xml(manuscript, config)),
        ("word/styles.xml", styles_xml(config)),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, contents) in parts {
        zip.start_file(path, options)?;
        zip.write_all(contents.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{Book, Chapter};
    use std::io::Read;

    fn sample_book() -> Book {
        Book {
            title: "Tom & Jerry".to_string(),
            subtitle: Some("Chase <Stories>".to_string()),
            author: "Hanna".to_string(),
            chapters: vec![
                Chapter {
                    title: "First".to_string(),
                    content: "## Start\n\nPlain **bold** end\n\n- item\n".to_string(),
                    ..Chapter::default()
                },
                Chapter {
                    title: "Second".to_string(),
                    content: "> quoted words\n".to_string(),
                    ..Chapter::default()
                },
            ],
            ..Book::default()
        }
    }

    fn document_for(book: &Book) -> String {
        let config = Config::compiled_default();
        let manuscript = Manuscript::from_book(book, &config.body_style());
        document_xml(&manuscript, &config)
    }

    #[test]
    fn title_section() {
        let xml = document_for(&sample_book());
        assert!(xml.contains("Tom &amp; Jerry"));
        assert!(xml.contains("Chase &lt;Stories&gt;"));
        assert!(xml.contains("By Hanna"));
        assert!(xml.contains("<w:color w:val=\"1A202C\"/><w:sz w:val=\"64\"/>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.contains("<w:bottom w:val=\"single\" w:sz=\"12\" w:space=\"1\" w:color=\"4F46E5\"/>"));
    }

    #[test]
    fn blank_subtitle_is_left_out() {
        let mut book = sample_book();
        book.subtitle = Some(" ".to_string());
        assert!(!document_for(&book).contains("3B3B3B"));
    }

    #[test]
    fn chapters_and_blocks() {
        let xml = document_for(&sample_book());

        assert_eq!(xml.matches("<w:pageBreakBefore/>").count(), 1);
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/><w:spacing w:before=\"400\"/>"));
        assert!(xml.contains(
            "<w:pStyle w:val=\"Heading2\"/><w:spacing w:before=\"300\" w:after=\"150\"/>"
        ));
        assert!(xml.contains("<w:spacing w:before=\"100\" w:after=\"100\"/><w:jc w:val=\"both\"/>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">• </w:t>"));
        assert!(xml.contains("<w:ind w:left=\"720\"/>"));
        assert!(xml.contains("<w:i/><w:color w:val=\"666666\"/>"));
        assert!(xml.contains("quoted words"));

        let first = xml.find(">First<").unwrap();
        let page_break = xml.find("<w:pageBreakBefore/>").unwrap();
        let second = xml.find(">Second<").unwrap();
        assert!(first < page_break && page_break < second);
    }

    #[test]
    fn body_runs_carry_font_and_flags() {
        let xml = document_for(&sample_book());
        assert!(xml.contains("<w:rFonts w:ascii=\"Charter\" w:hAnsi=\"Charter\" w:cs=\"Charter\"/><w:b/><w:sz w:val=\"24\"/>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">bold</w:t>"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let book = Book {
            title: "T\u{1}".to_string(),
            author: "A\u{1b}uthor".to_string(),
            chapters: vec![Chapter {
                title: "One".to_string(),
                content: "form\u{c}feed and vt\u{b}here".to_string(),
                ..Chapter::default()
            }],
            ..Book::default()
        };
        let config = Config::compiled_default();
        let manuscript = Manuscript::from_book(&book, &config.body_style());

        for xml in [document_xml(&manuscript, &config), core_xml(&manuscript)] {
            let invalid: Vec<u32> = xml
                .chars()
                .filter(|&c| c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
                .map(u32::from)
                .collect();
            assert!(invalid.is_empty(), "invalid XML chars: {:?}", invalid);
        }
        assert!(core_xml(&manuscript).contains("<dc:title>T</dc:title>"));
        assert!(document_xml(&manuscript, &config).contains("here"));
    }

    #[test]
    fn xml_text_keeps_whitespace_and_escapes() {
        assert_eq!(xml_text("a\tb\nc\r<&>\u{7}"), "a\tb\nc\r&lt;&amp;&gt;");
    }

    #[test]
    fn styles_define_headings() {
        let styles = styles_xml(&Config::compiled_default());
        assert!(styles.contains("w:styleId=\"Heading1\""));
        assert!(styles.contains("w:styleId=\"Heading3\""));
        assert!(styles.contains("<w:sz w:val=\"40\"/>"));
        assert!(styles.contains("w:ascii=\"Inter\""));
    }

    #[test]
    fn package_contains_parts() {
        let book = sample_book();
        let config = Config::compiled_default();
        let manuscript = Manuscript::from_book(&book, &config.body_style());
        let bytes = render_docx(&manuscript, &config).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/styles.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {}", part);
        }

        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .unwrap()
            .read_to_string(&mut core)
            .unwrap();
        assert!(core.contains("<dc:title>Tom &amp; Jerry</dc:title>"));
        assert!(core.contains("<dc:creator>Hanna</dc:creator>"));
    }
}
