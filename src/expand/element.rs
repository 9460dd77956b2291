// Generated apiDoc elements and their line formatting.

use crate::directive::ElementKind;
use serde::{Deserialize, Serialize};

/// An element in the host documentation tool's parse stream.
///
/// Generated elements carry both the bare directive body (`content`) and the
/// reconstructed annotation source (`source`) so downstream parsers can
/// process them like hand-written directives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub content: String,
    pub name: String,
    pub source: String,
    #[serde(rename = "sourceName")]
    pub source_name: String,
}

impl Element {
    /// Build a generated element for a directive line
    pub fn new(line: &str, kind: ElementKind) -> Self {
        Self {
            content: format!("{}\n", line),
            name: kind.element_name().to_string(),
            source: format!("@{} {}\n", kind.as_str(), line),
            source_name: kind.as_str().to_string(),
        }
    }
}

/// Format a parameter directive line: `{Label} path description`, with the
/// path bracketed when the property is optional
pub fn format_param_line(label: &str, path: &str, optional: bool, description: &str) -> String {
    if optional {
        format!("{{{}}} [{}] {}", label, path, description)
    } else {
        format!("{{{}}} {} {}", label, path, description)
    }
}

/// Format a property description: the backticked qualified path, optionally
/// followed by the documentation comment text
pub fn format_description(path: &str, comment: Option<&str>) -> String {
    match comment {
        Some(text) => format!("`{}` - {}", path, text),
        None => format!("`{}`", path),
    }
}
