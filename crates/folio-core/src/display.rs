//! Display modes and directive verbs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The directive marker character.
pub const DIRECTIVE_CHAR: char = '%';

/// How a group of consecutive bundles is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Hidden,
    Inline,
    Contents,
    Image,
    Html,
    Record,
    Table,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Inline => "inline",
            Self::Contents => "contents",
            Self::Image => "image",
            Self::Html => "html",
            Self::Record => "record",
            Self::Table => "table",
        }
    }

    /// Parses a mode name; unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hidden" => Some(Self::Hidden),
            "inline" => Some(Self::Inline),
            "contents" => Some(Self::Contents),
            "image" => Some(Self::Image),
            "html" => Some(Self::Html),
            "record" => Some(Self::Record),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The arguments of the most recent `display` directive.
///
/// Kept as raw tokens: the mode is only validated when a bundle group is
/// actually flushed, so a bad mode with nothing to display is harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplaySpec(pub Vec<String>);

impl DisplaySpec {
    pub fn new<S: Into<String>>(tokens: impl IntoIterator<Item = S>) -> Self {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// The mode token, if any.
    pub fn mode(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Tokens after the mode.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl Default for DisplaySpec {
    fn default() -> Self {
        Self::new(["table", "default"])
    }
}

/// The verb (first token) of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveVerb {
    Title,
    Schema,
    AddSchema,
    Add,
    Display,
    Search,
    /// `%%` lines and bare `%` lines. Any first token starting with `%`
    /// counts, so `%%note` is a comment too.
    Comment,
}

impl DirectiveVerb {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "title" => Some(Self::Title),
            "schema" => Some(Self::Schema),
            "addschema" => Some(Self::AddSchema),
            "add" => Some(Self::Add),
            "display" => Some(Self::Display),
            "search" => Some(Self::Search),
            t if t.is_empty() || t.starts_with('%') => Some(Self::Comment),
            _ => None,
        }
    }
}
