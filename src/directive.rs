// Parsing of @apiInterface annotation bodies.
//
// Grammar: (<path>)? {(<kind>::)?<qualifiedName>} [<nestPrefix>]? <freeText>?
//
// The path overrides which file the qualified name resolves against, the kind
// selects the emitted apiDoc directive family, and the nest prefix is
// prepended to every emitted parameter path.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// apiDoc directive family a directive expands into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Success,
    Body,
    Param,
    Query,
    Error,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Success,
        ElementKind::Body,
        ElementKind::Param,
        ElementKind::Query,
        ElementKind::Error,
    ];

    /// Source-level directive name, e.g. `apiSuccess`
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Success => "apiSuccess",
            ElementKind::Body => "apiBody",
            ElementKind::Param => "apiParam",
            ElementKind::Query => "apiQuery",
            ElementKind::Error => "apiError",
        }
    }

    /// Lowercased element name as the host tool stores it
    pub fn element_name(&self) -> &'static str {
        match self {
            ElementKind::Success => "apisuccess",
            ElementKind::Body => "apibody",
            ElementKind::Param => "apiparam",
            ElementKind::Query => "apiquery",
            ElementKind::Error => "apierror",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ElementKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed annotation, immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Directive family; defaults to `apiSuccess` when no `kind::` prefix given
    pub kind: ElementKind,
    /// Qualified target name, possibly dotted, possibly carrying an array suffix
    pub target: String,
    /// File path overriding which file the target resolves against,
    /// relative to the annotation's own file
    pub path: Option<String>,
    /// Dotted prefix prepended to every emitted parameter path
    pub nest: Option<String>,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\((.+?)\))?\s*\{(.+?)\}\s*(?:\[(.+?)\])?\s*(?:(.+))?$")
            .expect("directive grammar regex is valid")
    })
}

impl Directive {
    /// Parse an annotation body.
    ///
    /// Returns `None` when the content is empty, the grammar does not match,
    /// or the kind prefix is not one of the five recognized kinds. A kind
    /// mismatch records a diagnostic enumerating the accepted kinds; the
    /// failure affects this directive only.
    pub fn parse(content: &str, sink: &mut dyn DiagnosticSink) -> Option<Directive> {
        let captures = match directive_regex().captures(content) {
            Some(captures) => captures,
            None => {
                sink.warn(Diagnostic::new(format!(
                    "could not parse annotation «{}»",
                    content.trim()
                )));
                return None;
            }
        };
        let braced = captures.get(2)?.as_str();

        let (kind_name, target) = match braced.split_once("::") {
            Some((kind, target)) => (kind, target),
            None => (ElementKind::Success.as_str(), braced),
        };

        let kind = match ElementKind::from_str(kind_name) {
            Some(kind) => kind,
            None => {
                let accepted: Vec<&str> = ElementKind::ALL.iter().map(|k| k.as_str()).collect();
                sink.warn(Diagnostic::new(format!(
                    "unrecognized element kind «{}» - expected one of {}",
                    kind_name,
                    accepted.join(", ")
                )));
                return None;
            }
        };

        Some(Directive {
            kind,
            target: target.trim().to_string(),
            path: captures.get(1).map(|m| m.as_str().trim().to_string()),
            nest: captures.get(3).map(|m| m.as_str().trim().to_string()),
        })
    }
}

/// Match an array-form target name: `Name[]` or `Array<Name>`
pub fn match_array_target(name: &str) -> Option<&str> {
    if let Some(inner) = name.strip_prefix("Array<").and_then(|s| s.strip_suffix('>')) {
        return Some(inner);
    }
    name.strip_suffix("[]")
}
