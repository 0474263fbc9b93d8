//! Generation request domain types.
//!
//! A [`GenerationRequest`] describes one round sent to the backend. The
//! driver never mutates a request in place: each continuation round derives
//! a fresh request from the original via [`GenerationRequest::continuation`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content_class::ContentClass;

/// Whether the backend rewrites existing content or produces new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Rewrite an existing artifact (the target content).
    #[default]
    Transform,
    /// Produce a new artifact. Never continued: there is no original to finish.
    Generate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => write!(f, "transform"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transform" => Ok(Self::Transform),
            "generate" => Ok(Self::Generate),
            other => Err(format!("unknown mode '{other}' (expected transform or generate)")),
        }
    }
}

/// One request to the Backend Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The instruction text for this round
    pub prompt: String,

    /// Backend model identifier; `None` lets the backend pick its default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Optional system prompt, passed through unchanged on every round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// The content being transformed (absent in generate mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Identifier of the artifact (usually a file path), used for logging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Structural category, selects the completeness heuristic
    #[serde(default)]
    pub content_class: ContentClass,

    /// Maximum tokens the backend may generate per round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Transform or generate
    #[serde(default)]
    pub mode: Mode,
}

fn default_temperature() -> f32 {
    0.1
}

impl GenerationRequest {
    /// A transform request over existing `target` content.
    pub fn transform(
        prompt: impl Into<String>,
        target: impl Into<String>,
        content_class: ContentClass,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            system_prompt: None,
            target: Some(target.into()),
            label: None,
            content_class,
            max_tokens: None,
            temperature: default_temperature(),
            mode: Mode::Transform,
        }
    }

    /// A generate request: single shot, no target content.
    pub fn generate(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            system_prompt: None,
            target: None,
            label: None,
            content_class: ContentClass::Freeform,
            max_tokens: None,
            temperature: default_temperature(),
            mode: Mode::Generate,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_content_class(mut self, content_class: ContentClass) -> Self {
        self.content_class = content_class;
        self
    }

    /// The original content being transformed, or `""` when there is none.
    pub fn original_content(&self) -> &str {
        self.target.as_deref().unwrap_or_default()
    }

    /// Label for log lines.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }

    /// Derive the request for a continuation round: same limits, class,
    /// target and mode, new prompt.
    pub fn continuation(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_request_defaults() {
        let req = GenerationRequest::transform("add docs", "fn main() {}", ContentClass::BraceDelimited);
        assert_eq!(req.mode, Mode::Transform);
        assert_eq!(req.original_content(), "fn main() {}");
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(req.display_label(), "<unnamed>");
    }

    #[test]
    fn generate_request_has_no_target() {
        let req = GenerationRequest::generate("write a README");
        assert_eq!(req.mode, Mode::Generate);
        assert_eq!(req.original_content(), "");
    }

    #[test]
    fn continuation_keeps_everything_but_prompt() {
        let req = GenerationRequest::transform("p", "body", ContentClass::TagDelimited)
            .with_max_tokens(512)
            .with_label("index.html")
            .with_system_prompt("be exact")
            .with_model("local/coder-7b");
        let next = req.continuation("keep going");
        assert_eq!(next.prompt, "keep going");
        assert_eq!(next.target, req.target);
        assert_eq!(next.max_tokens, Some(512));
        assert_eq!(next.system_prompt.as_deref(), Some("be exact"));
        assert_eq!(next.model.as_deref(), Some("local/coder-7b"));
        assert_eq!(next.content_class, ContentClass::TagDelimited);
        // The original is untouched.
        assert_eq!(req.prompt, "p");
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Generate".parse::<Mode>().unwrap(), Mode::Generate);
        assert_eq!(" transform ".parse::<Mode>().unwrap(), Mode::Transform);
        assert!("rewrite".parse::<Mode>().is_err());
        assert_eq!(Mode::Generate.to_string(), "generate");
    }

    #[test]
    fn request_serialization_roundtrip() {
        let req = GenerationRequest::transform("p", "x = 1", ContentClass::IndentationDelimited);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("indentation-delimited"));
        let parsed: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
        assert!(!json.contains("\"model\""));

        let req = req.with_model("anthropic/claude-3.5-sonnet");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"model\":\"anthropic/claude-3.5-sonnet\""));
    }
}
