use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::token::{Token, TokenKind};

/// Parse markdown text into a flat token stream.
///
/// The stream has the markdown-it shape: every heading and paragraph is an
/// `*_open`, `inline`, `*_close` triple, and list items always wrap their
/// text in a paragraph, even in tight lists.
pub fn tokenize(markdown: &str) -> Vec<Token> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(markdown, options);
    let mut state = TokenizeState::default();

    for event in parser {
        process_event(event, &mut state);
    }

    state.close_implicit_paragraph();
    state.tokens
}

#[derive(Default)]
struct TokenizeState {
    tokens: Vec<Token>,

    // Inline content being collected for the current heading/paragraph/cell
    inline: Option<InlineBuilder>,
    // The open paragraph was synthesized for a tight list item
    implicit_paragraph: bool,

    // Code block state
    code: Option<CodeBuilder>,

    // Link destinations, innermost last
    link_stack: Vec<String>,
    // Image alt text being collected
    image: Option<(String, String)>,

    // Table state
    in_table_head: bool,
    in_table_body: bool,
}

#[derive(Default)]
struct InlineBuilder {
    // Source-like text of the whole inline run, markers included
    content: String,
    children: Vec<Token>,
}

struct CodeBuilder {
    kind: TokenKind,
    language: Option<String>,
    content: String,
}

impl TokenizeState {
    fn push(&mut self, kind: TokenKind, tag: &str) {
        self.tokens.push(Token::new(kind).with_tag(tag));
    }

    fn begin_inline(&mut self) {
        self.inline = Some(InlineBuilder::default());
    }

    fn flush_inline(&mut self) {
        let builder = self.inline.take().unwrap_or_default();
        self.tokens.push(
            Token::new(TokenKind::Inline)
                .with_content(builder.content)
                .with_children(builder.children),
        );
    }

    /// Inline builder for the current block, opening an implicit paragraph
    /// when text shows up directly inside a list item.
    fn inline_mut(&mut self) -> &mut InlineBuilder {
        if self.inline.is_none() {
            self.push(TokenKind::ParagraphOpen, "p");
            self.implicit_paragraph = true;
        }
        self.inline.get_or_insert_with(InlineBuilder::default)
    }

    fn close_implicit_paragraph(&mut self) {
        if self.implicit_paragraph {
            self.implicit_paragraph = false;
            self.flush_inline();
            self.push(TokenKind::ParagraphClose, "p");
        }
    }

    fn child(&mut self, kind: TokenKind, content: &str, markup: &str) {
        let inline = self.inline_mut();
        inline.content.push_str(markup);
        inline.children.push(Token::new(kind).with_content(content));
    }
}

fn process_event(event: Event, state: &mut TokenizeState) {
    // Everything inside an image up to its end is alt text
    if let Some((_, alt)) = state.image.as_mut() {
        match &event {
            Event::End(TagEnd::Image) => {}
            Event::Text(text) | Event::Code(text) => {
                alt.push_str(text);
                return;
            }
            Event::SoftBreak | Event::HardBreak => {
                alt.push(' ');
                return;
            }
            _ => return,
        }
    }

    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::HeadingOpen, &heading_tag(level));
            state.begin_inline();
        }
        Event::End(TagEnd::Heading(level)) => {
            state.flush_inline();
            state.push(TokenKind::HeadingClose, &heading_tag(level));
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::ParagraphOpen, "p");
            state.begin_inline();
        }
        Event::End(TagEnd::Paragraph) => {
            state.flush_inline();
            state.push(TokenKind::ParagraphClose, "p");
        }

        // Lists
        Event::Start(Tag::List(first_number)) => {
            state.close_implicit_paragraph();
            if first_number.is_some() {
                state.push(TokenKind::OrderedListOpen, "ol");
            } else {
                state.push(TokenKind::BulletListOpen, "ul");
            }
        }
        Event::End(TagEnd::List(ordered)) => {
            state.close_implicit_paragraph();
            if ordered {
                state.push(TokenKind::OrderedListClose, "ol");
            } else {
                state.push(TokenKind::BulletListClose, "ul");
            }
        }
        Event::Start(Tag::Item) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::ListItemOpen, "li");
        }
        Event::End(TagEnd::Item) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::ListItemClose, "li");
        }

        // Blockquotes
        Event::Start(Tag::BlockQuote(_)) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::BlockquoteOpen, "blockquote");
        }
        Event::End(TagEnd::BlockQuote(_)) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::BlockquoteClose, "blockquote");
        }

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.close_implicit_paragraph();
            let (kind, language) = match kind {
                CodeBlockKind::Fenced(lang) => {
                    let lang = lang.into_string();
                    (TokenKind::Fence, if lang.is_empty() { None } else { Some(lang) })
                }
                CodeBlockKind::Indented => (TokenKind::CodeBlock, None),
            };
            state.code = Some(CodeBuilder {
                kind,
                language,
                content: String::new(),
            });
        }
        Event::End(TagEnd::CodeBlock) => {
            if let Some(code) = state.code.take() {
                // The fence language takes the tag slot, as markdown-it's `info`
                let tag = code.language.unwrap_or_else(|| "code".to_string());
                state
                    .tokens
                    .push(Token::new(code.kind).with_tag(tag).with_content(code.content));
            }
        }

        // Tables
        Event::Start(Tag::Table(_)) => {
            state.close_implicit_paragraph();
            state.push(TokenKind::TableOpen, "table");
        }
        Event::End(TagEnd::Table) => {
            if state.in_table_body {
                state.in_table_body = false;
                state.push(TokenKind::TbodyClose, "tbody");
            }
            state.push(TokenKind::TableClose, "table");
        }
        Event::Start(Tag::TableHead) => {
            state.in_table_head = true;
            state.push(TokenKind::TheadOpen, "thead");
            state.push(TokenKind::TrOpen, "tr");
        }
        Event::End(TagEnd::TableHead) => {
            state.in_table_head = false;
            state.push(TokenKind::TrClose, "tr");
            state.push(TokenKind::TheadClose, "thead");
        }
        Event::Start(Tag::TableRow) => {
            if !state.in_table_body {
                state.in_table_body = true;
                state.push(TokenKind::TbodyOpen, "tbody");
            }
            state.push(TokenKind::TrOpen, "tr");
        }
        Event::End(TagEnd::TableRow) => {
            state.push(TokenKind::TrClose, "tr");
        }
        Event::Start(Tag::TableCell) => {
            if state.in_table_head {
                state.push(TokenKind::ThOpen, "th");
            } else {
                state.push(TokenKind::TdOpen, "td");
            }
            state.begin_inline();
        }
        Event::End(TagEnd::TableCell) => {
            state.flush_inline();
            if state.in_table_head {
                state.push(TokenKind::ThClose, "th");
            } else {
                state.push(TokenKind::TdClose, "td");
            }
        }

        // Text content
        Event::Text(text) => {
            if let Some(code) = state.code.as_mut() {
                code.content.push_str(&text);
            } else {
                state.child(TokenKind::Text, &text, &text);
            }
        }
        Event::Code(code) => {
            let markup = format!("`{}`", code);
            state.child(TokenKind::CodeInline, &code, &markup);
        }

        // Emphasis markers
        Event::Start(Tag::Strong) => state.child(TokenKind::StrongOpen, "", "**"),
        Event::End(TagEnd::Strong) => state.child(TokenKind::StrongClose, "", "**"),
        Event::Start(Tag::Emphasis) => state.child(TokenKind::EmOpen, "", "*"),
        Event::End(TagEnd::Emphasis) => state.child(TokenKind::EmClose, "", "*"),
        Event::Start(Tag::Strikethrough) => state.child(TokenKind::SOpen, "", "~~"),
        Event::End(TagEnd::Strikethrough) => state.child(TokenKind::SClose, "", "~~"),

        // Links
        Event::Start(Tag::Link { dest_url, .. }) => {
            state.link_stack.push(dest_url.into_string());
            state.child(TokenKind::LinkOpen, "", "[");
        }
        Event::End(TagEnd::Link) => {
            let url = state.link_stack.pop().unwrap_or_default();
            state.child(TokenKind::LinkClose, "", &format!("]({})", url));
        }

        // Images keep their alt text as content
        Event::Start(Tag::Image { dest_url, .. }) => {
            state.image = Some((dest_url.into_string(), String::new()));
        }
        Event::End(TagEnd::Image) => {
            if let Some((url, alt)) = state.image.take() {
                state.child(TokenKind::Image, &alt, &format!("![{}]({})", alt, url));
            }
        }

        // Soft/hard breaks
        Event::SoftBreak => state.child(TokenKind::Softbreak, " ", "\n"),
        Event::HardBreak => state.child(TokenKind::Hardbreak, "\n", "\n"),

        // Task list checkboxes
        Event::TaskListMarker(checked) => {
            let marker = if checked { "[x] " } else { "[ ] " };
            state.child(TokenKind::Text, marker, marker);
        }

        // HTML
        Event::Html(html) => {
            state.close_implicit_paragraph();
            state
                .tokens
                .push(Token::new(TokenKind::HtmlBlock).with_content(html.into_string()));
        }
        Event::InlineHtml(html) => state.child(TokenKind::HtmlInline, &html, &html),

        // Horizontal rule
        Event::Rule => {
            state.close_implicit_paragraph();
            state.push(TokenKind::Hr, "hr");
        }

        // Ignore other events
        _ => {}
    }
}

fn heading_tag(level: HeadingLevel) -> String {
    let depth = match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    };
    format!("h{}", depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_markdown() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn heading() {
        let tokens = tokenize("## Hello *there*");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::HeadingOpen, TokenKind::Inline, TokenKind::HeadingClose]
        );
        assert_eq!(tokens[0].tag.as_deref(), Some("h2"));
        assert_eq!(tokens[1].content.as_deref(), Some("Hello *there*"));
    }

    #[test]
    fn paragraph_children() {
        let tokens = tokenize("Some **bold** text");
        let children = tokens[1].children.as_ref().unwrap();
        assert_eq!(
            kinds(children),
            vec![
                TokenKind::Text,
                TokenKind::StrongOpen,
                TokenKind::Text,
                TokenKind::StrongClose,
                TokenKind::Text,
            ]
        );
        assert_eq!(children[2].content.as_deref(), Some("bold"));
        assert_eq!(tokens[1].content.as_deref(), Some("Some **bold** text"));
    }

    #[test]
    fn tight_list_items_get_paragraphs() {
        let tokens = tokenize("- one\n- two");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BulletListOpen,
                TokenKind::ListItemOpen,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::ListItemClose,
                TokenKind::ListItemOpen,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::ListItemClose,
                TokenKind::BulletListClose,
            ]
        );
    }

    #[test]
    fn loose_ordered_list() {
        let tokens = tokenize("1. one\n\n2. two\n");
        assert_eq!(tokens.first().map(|t| t.kind), Some(TokenKind::OrderedListOpen));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::OrderedListClose));
        let paragraphs = tokens
            .iter()
            .filter(|t| t.is(TokenKind::ParagraphOpen))
            .count();
        assert_eq!(paragraphs, 2);
    }

    #[test]
    fn nested_list_closes_outer_item_text() {
        let tokens = tokenize("- outer\n  - inner\n");
        let inline_texts: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(TokenKind::Inline))
            .filter_map(|t| t.content.as_deref())
            .collect();
        assert_eq!(inline_texts, vec!["outer", "inner"]);
    }

    #[test]
    fn blockquote() {
        let tokens = tokenize("> quoted\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BlockquoteOpen,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::BlockquoteClose,
            ]
        );
        assert_eq!(tokens[2].content.as_deref(), Some("quoted"));
    }

    #[test]
    fn soft_break_is_a_space_run() {
        let tokens = tokenize("line one\nline two");
        let children = tokens[1].children.as_ref().unwrap();
        assert_eq!(children[1].kind, TokenKind::Softbreak);
        assert_eq!(children[1].content.as_deref(), Some(" "));
        assert_eq!(tokens[1].content.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn code_block_and_rule() {
        let tokens = tokenize("```rust\nlet x = 1;\n```\n\n---\n");
        assert_eq!(kinds(&tokens), vec![TokenKind::Fence, TokenKind::Hr]);
        assert_eq!(tokens[0].tag.as_deref(), Some("rust"));
        assert_eq!(tokens[0].content.as_deref(), Some("let x = 1;\n"));
    }

    #[test]
    fn table_tokens() {
        let tokens = tokenize("| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(tokens[0].kind, TokenKind::TableOpen);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::TableClose));
        assert!(tokens.iter().any(|t| t.is(TokenKind::ThOpen)));
        assert!(tokens.iter().any(|t| t.is(TokenKind::TbodyOpen)));
        assert!(!tokens.iter().any(|t| t.is(TokenKind::ParagraphOpen)));
    }

    #[test]
    fn link_and_code_markup() {
        let tokens = tokenize("See [docs](https://example.com) and `x`");
        assert_eq!(
            tokens[1].content.as_deref(),
            Some("See [docs](https://example.com) and `x`")
        );
    }

    #[test]
    fn image_alt_text_absorbs_inline_markup() {
        let tokens = tokenize("![a *b* [c](l) `d`](u.png) after");
        let inline = &tokens[1];
        assert_eq!(inline.content.as_deref(), Some("![a b c d](u.png) after"));

        let children = inline.children.as_deref().unwrap_or_default();
        assert_eq!(kinds(children), vec![TokenKind::Image, TokenKind::Text]);
        assert_eq!(children[0].content.as_deref(), Some("a b c d"));
    }
}
