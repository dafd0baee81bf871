use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A stored book record: metadata plus ordered markdown chapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl Book {
    /// Parse a book from JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let book: Book = serde_json::from_str(content)?;
        book.validate()?;
        Ok(book)
    }

    /// Parse a book from TOML (`[[chapters]]` tables).
    pub fn from_toml(content: &str) -> Result<Self> {
        let book: Book = toml::from_str(content)?;
        book.validate()?;
        Ok(book)
    }

    /// Load a book file; `.json` is read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Title and author are required; everything else may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidBook("title is required".to_string()));
        }
        if self.author.trim().is_empty() {
            return Err(Error::InvalidBook("author is required".to_string()));
        }
        Ok(())
    }

    /// Subtitle, when present and not blank
    pub fn display_subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn byline(&self) -> String {
        format!("By {}", self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_json_record() {
        let book = Book::from_json(
            r#"{
                "title": "Rust at Sea",
                "subtitle": "",
                "author": "A. Writer",
                "coverImage": "/uploads/cover.png",
                "chapters": [
                    {"title": "One", "description": "Start", "content": "Hello"},
                    {"title": "Two"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(book.cover_image.as_deref(), Some("/uploads/cover.png"));
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[1].content, "");
        assert_eq!(book.display_subtitle(), None);
        assert_eq!(book.byline(), "By A. Writer");
    }

    #[test]
    fn from_toml_record() {
        let book = Book::from_toml(
            "title = \"T\"\nauthor = \"A\"\nsubtitle = \"Sub\"\n\n[[chapters]]\ntitle = \"C\"\ncontent = \"# H\"\n",
        )
        .unwrap();
        assert_eq!(book.display_subtitle(), Some("Sub"));
        assert_eq!(book.chapters[0].content, "# H");
    }

    #[test]
    fn requires_title_and_author() {
        assert!(matches!(
            Book::from_json(r#"{"title": " ", "author": "A"}"#),
            Err(Error::InvalidBook(_))
        ));
        assert!(matches!(
            Book::from_json(r#"{"title": "T", "author": ""}"#),
            Err(Error::InvalidBook(_))
        ));
        assert!(matches!(Book::from_json("[]"), Err(Error::Json(_))));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"title": "T", "author": "A"}}"#).unwrap();

        let book = Book::load(&path).unwrap();
        assert_eq!(book.title, "T");
        assert!(book.chapters.is_empty());
    }
}
