// Qualified-name and path-alias resolution.
//
// Two independent strategies, tried in order by the expansion engine:
// direct namespace walking inside a loaded file, then module-path alias
// lookup through the project's wildcard path mappings.

use crate::config::ProjectConfig;
use crate::diagnostics::DiagnosticSink;
use crate::parser::{Interface, ModuleBody, SourceFile};
use std::path::{Path, PathBuf};

/// Extensions probed, in order, when an alias maps to a bare path
const ALIAS_CANDIDATES: [&str; 2] = [".d.ts", ".ts"];

/// Result of resolving a dotted qualified name against a root scope
pub struct ResolvedName<'a> {
    /// Namespace scope the leaf should be looked up in; `None` when a
    /// namespace segment was missing
    pub scope: Option<&'a ModuleBody>,
    /// Final segment of the qualified name, array suffix stripped
    pub leaf: String,
}

/// Walk a dotted qualified name left-to-right from `root`.
///
/// A missing namespace segment records a diagnostic and yields an undefined
/// scope - non-fatal, the caller falls back or gives up on this directive.
pub fn resolve_qualified<'a>(
    root: &'a ModuleBody,
    name: &str,
    file: &Path,
    sink: &mut dyn DiagnosticSink,
) -> ResolvedName<'a> {
    let name = name.trim().trim_end_matches("[]");
    let segments: Vec<&str> = name.split('.').collect();
    let (leaf, namespaces) = segments.split_last().expect("split always yields one segment");

    let mut scope = Some(root);
    for segment in namespaces {
        scope = match scope {
            Some(current) => match current.namespace(segment) {
                Some(ns) => Some(&ns.body),
                None => {
                    sink.warn_in(
                        format!("could not find namespace «{}» in «{}»", segment, name),
                        file,
                    );
                    None
                }
            },
            None => None,
        };
    }

    ResolvedName {
        scope,
        leaf: leaf.to_string(),
    }
}

/// Quiet variant of [`resolve_qualified`] for property-level type references.
///
/// Walks a possibly-dotted name from `root` and returns the interface along
/// with the scope it was declared in, with no diagnostics on the way - a miss
/// here just means the caller falls through to the next resolution strategy.
pub fn lookup_interface<'a>(
    root: &'a ModuleBody,
    name: &str,
) -> Option<(&'a ModuleBody, &'a Interface)> {
    let name = name.trim().trim_end_matches("[]");
    let segments: Vec<&str> = name.split('.').collect();
    let (leaf, namespaces) = segments.split_last()?;

    let mut scope = root;
    for segment in namespaces {
        scope = &scope.namespace(segment)?.body;
    }
    scope.interface(leaf).map(|interface| (scope, interface))
}

/// Resolve a module-path alias for `target` through the anchor file's imports.
///
/// Scans the imports for one whose bindings include the target's leading
/// segment; the module specifier must start with the reserved alias marker
/// `@`. Wildcard mappings are expanded and candidate paths probed in order:
/// the bare mapped path, then a declaration-file extension, then a source
/// extension. The first existing path wins.
pub fn resolve_path_alias(
    file: &SourceFile,
    target: &str,
    config: &ProjectConfig,
) -> Option<PathBuf> {
    let target = target.trim().trim_end_matches("[]");
    let leading = target.split('.').next()?;

    for import in &file.imports {
        if !import.names.iter().any(|n| n == leading) {
            continue;
        }
        if !import.module.starts_with('@') {
            continue;
        }
        for base in config.expand_alias(&import.module) {
            if let Some(path) = probe_candidates(&base) {
                return Some(path);
            }
        }
    }
    None
}

/// Probe a mapped base path and its extension variants
fn probe_candidates(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    for ext in ALIAS_CANDIDATES {
        let candidate = PathBuf::from(format!("{}{}", base.display(), ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
