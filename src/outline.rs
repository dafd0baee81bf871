//! Prompts for the text-generation service and parsing of its replies.
//!
//! The service itself is called by the host application; this module only
//! builds the request text and turns a reply into chapters.

use serde::{Deserialize, Serialize};

use crate::book::{Book, Chapter};
use crate::error::{Error, Result};

pub const DEFAULT_CHAPTER_COUNT: u32 = 5;

/// One entry of a generated outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineChapter {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Request for a book outline
#[derive(Debug, Clone, Default)]
pub struct OutlineRequest {
    pub topic: String,
    pub style: String,
    pub description: Option<String>,
    pub chapter_count: Option<u32>,
}

impl OutlineRequest {
    pub fn prompt(&self) -> Result<String> {
        if self.topic.trim().is_empty() {
            return Err(Error::Outline("a topic is required".to_string()));
        }
        let count = self
            .chapter_count
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CHAPTER_COUNT);
        let description = self.description.as_deref().unwrap_or("");

        Ok(format!(
            "Write an outline for a book.\n\n\
             Topic: \"{topic}\"\n\
             Description: \"{description}\"\n\
             Writing style: {style}\n\
             Chapters: {count}\n\n\
             Produce exactly {count} chapters that build on each other. Give each a clear title \
             and a description of two or three sentences, both written in the {style} style.\n\n\
             Reply with a JSON array only, no surrounding text. Every element must be an object \
             with exactly the keys \"title\" and \"description\".\n",
            topic = self.topic,
            description = description,
            style = self.style,
            count = count,
        ))
    }
}

/// Request for the prose of one chapter
#[derive(Debug, Clone, Default)]
pub struct ChapterRequest {
    pub title: String,
    pub description: Option<String>,
    pub style: String,
}

impl ChapterRequest {
    pub fn prompt(&self) -> Result<String> {
        if self.title.trim().is_empty() {
            return Err(Error::Outline("a chapter title is required".to_string()));
        }

        let mut prompt = format!(
            "Write a complete book chapter in a {tone} tone.\n\nChapter title: \"{title}\"\n",
            tone = self.style.to_lowercase(),
            title = self.title,
        );
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            prompt.push_str(&format!(
                "Chapter description: \"{}\"\nCover every point in the description.\n",
                description
            ));
        }
        prompt.push_str(
            "\nAim for 1500 to 2500 words. Open with a strong first paragraph, use clear \
             paragraph breaks and subheadings where they help, and close with a conclusion or a \
             transition to the next chapter.\n",
        );
        Ok(prompt)
    }
}

/// The slice from the first `[` to the last `]` of a reply.
pub fn extract_json_array(reply: &str) -> Result<&str> {
    match (reply.find('['), reply.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(Error::Outline("no JSON array found in reply".to_string())),
    }
}

/// Parse a generated outline, tolerating text around the JSON array.
pub fn parse_outline(reply: &str) -> Result<Vec<OutlineChapter>> {
    let json = extract_json_array(reply).inspect_err(|_| {
        tracing::warn!(reply_len = reply.len(), "outline reply has no JSON array");
    })?;
    Ok(serde_json::from_str(json)?)
}

/// A book skeleton with one empty chapter per outline entry.
pub fn book_from_outline(title: &str, author: &str, outline: Vec<OutlineChapter>) -> Book {
    Book {
        title: title.to_string(),
        author: author.to_string(),
        status: Some("draft".to_string()),
        chapters: outline
            .into_iter()
            .map(|entry| Chapter {
                title: entry.title,
                description: Some(entry.description).filter(|d| !d.is_empty()),
                content: String::new(),
            })
            .collect(),
        ..Book::default()
    }
}
