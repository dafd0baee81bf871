use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fonts: FontConfig,
    pub sizes: SizeConfig,
    pub spacing: SpacingConfig,
    pub colors: ColorConfig,
    pub page: PageConfig,
    pub pdf: PdfConfig,
    pub runs: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FontConfig {
    pub body: String,
    pub heading: String,
}

/// Point sizes for the DOCX package
#[derive(Debug, Clone, Deserialize)]
pub struct SizeConfig {
    pub title: f32,
    pub subtitle: f32,
    pub author: f32,
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
    pub body: f32,
}

impl SizeConfig {
    pub fn for_heading(&self, level: u8) -> f32 {
        match level {
            1 => self.h1,
            2 => self.h2,
            _ => self.h3,
        }
    }
}

/// Paragraph spacing in twips
#[derive(Debug, Clone, Deserialize)]
pub struct SpacingConfig {
    pub title_after: u32,
    pub chapter_before: u32,
    pub heading_before: u32,
    pub heading_after: u32,
    pub paragraph_before: u32,
    pub paragraph_after: u32,
    pub spacer_after: u32,
    /// Before and after a blockquote
    pub blockquote: u32,
    pub blockquote_indent: u32,
}

/// Hex RGB colors without the leading `#`
#[derive(Debug, Clone, Deserialize)]
pub struct ColorConfig {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub rule: String,
    pub blockquote: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub margin_twips: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    pub margin_pt: f32,
    pub title: f32,
    pub subtitle: f32,
    pub author: f32,
    pub chapter_title: f32,
    pub body: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub styling: RunStyling,
}

/// How inline style markers apply to the children of an inline token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStyling {
    /// Only the marker child itself (`strong_open`, ...) carries the flag.
    #[default]
    Marker,
    /// Children between an open marker and its close inherit the flag.
    Scoped,
}

/// Body font and size applied to every paragraph run
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStyle {
    pub font: String,
    pub size_pt: f32,
    pub styling: RunStyling,
}

impl Default for BodyStyle {
    fn default() -> Self {
        Config::compiled_default().body_style()
    }
}

impl Config {
    /// The defaults compiled into the binary from `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs rejects a default config that does not parse
        toml::from_str(DEFAULT_CONFIG).expect("default_config.toml is validated at build time")
    }

    /// Parse a TOML config, filling missing keys from the compiled defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut base: toml::Table = DEFAULT_CONFIG
            .parse()
            .map_err(|e| Error::Config(format!("default config: {}", e)))?;
        let overlay: toml::Table = content.parse().map_err(|e| Error::Config(format!("{}", e)))?;
        merge(&mut base, overlay);

        let merged = toml::to_string(&base).map_err(|e| Error::Config(e.to_string()))?;
        toml::from_str(&merged).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::compiled_default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn body_style(&self) -> BodyStyle {
        BodyStyle {
            font: self.fonts.body.clone(),
            size_pt: self.sizes.body,
            styling: self.runs.styling,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::compiled_default()
    }
}

/// Recursively overlay `overlay` onto `base`; nested tables merge key by key.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
