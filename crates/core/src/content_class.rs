//! Content classes and the default extension-based classifier.
//!
//! A content class is a coarse structural category. It is used only to pick
//! which balance heuristic decides whether merged output looks finished.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentClass {
    /// `{}` / `()` / `[]` delimited code (C family, Rust, Go, JSON, CSS)
    BraceDelimited,
    /// Significant-whitespace formats (Python, YAML)
    IndentationDelimited,
    /// Markup (HTML, XML)
    TagDelimited,
    /// Prose and everything unrecognised
    #[default]
    Freeform,
}

impl ContentClass {
    pub const ALL: [ContentClass; 4] = [
        Self::BraceDelimited,
        Self::IndentationDelimited,
        Self::TagDelimited,
        Self::Freeform,
    ];

    /// Kebab-case tag, as used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BraceDelimited => "brace-delimited",
            Self::IndentationDelimited => "indentation-delimited",
            Self::TagDelimited => "tag-delimited",
            Self::Freeform => "freeform",
        }
    }

    /// Classify by file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "go" | "js" | "jsx" | "mjs" | "ts" | "tsx" | "java" | "c" | "h" | "cpp" | "cc"
            | "cxx" | "hpp" | "rs" | "php" | "css" | "json" => Self::BraceDelimited,
            "py" | "yaml" | "yml" => Self::IndentationDelimited,
            "html" | "htm" | "xml" | "svg" | "vue" => Self::TagDelimited,
            _ => Self::Freeform,
        }
    }

    /// Classify a file identifier. Paths without an extension are freeform.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let class = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_default();
        tracing::trace!(path = %path.as_ref().display(), class = %class, "Classified content");
        class
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown content class '{s}' (expected one of: brace-delimited, indentation-delimited, tag-delimited, freeform)"
                )
            })
    }
}
