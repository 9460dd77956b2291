// Declaration file cache and user-defined file tracking.
//
// The graph is append-only for its whole lifetime: files are parsed once,
// never evicted, never re-parsed. Expansion is a read over the cached model,
// so reuse across directives is the caching strategy.

use crate::config::ProjectConfig;
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::parser::{DeclarationParser, EnumDecl, SourceFile};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Candidate suffixes probed when resolving a relative import specifier
const IMPORT_CANDIDATES: [&str; 4] = [".ts", ".d.ts", "/index.ts", "/index.d.ts"];

/// Cache of parsed declaration files plus the user-defined file set.
///
/// Files loaded through [`TypeGraph::load_file`] - directly or as a transitive
/// dependency - are user-defined: their members belong to project-authored
/// code and may be documented. Files registered through
/// [`TypeGraph::add_ambient`] provide library/standard context only; their
/// members are never documented.
pub struct TypeGraph {
    parser: DeclarationParser,
    config: ProjectConfig,
    files: Vec<Arc<SourceFile>>,
    index: HashMap<PathBuf, usize>,
    user_defined: HashSet<PathBuf>,
}

impl TypeGraph {
    /// Create a graph over an already-discovered project configuration
    pub fn new(config: ProjectConfig) -> Result<Self> {
        Ok(Self {
            parser: DeclarationParser::new()?,
            config,
            files: Vec::new(),
            index: HashMap::new(),
            user_defined: HashSet::new(),
        })
    }

    /// Create a graph, discovering project configuration by walking parent
    /// directories from `anchor`
    pub fn for_anchor(anchor: &Path) -> Result<Self> {
        Self::new(ProjectConfig::discover(anchor))
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether a file's members belong to project-authored code
    pub fn is_user_defined(&self, path: &Path) -> bool {
        self.user_defined.contains(&normalize(path))
    }

    /// Fetch an already-cached file
    pub fn get(&self, path: &Path) -> Option<Arc<SourceFile>> {
        self.index
            .get(&normalize(path))
            .map(|&i| Arc::clone(&self.files[i]))
    }

    /// Load a declaration file as user-defined.
    ///
    /// Parses and caches the file if not already present, then marks it and
    /// every file it structurally depends on (through relative imports) as
    /// user-defined. Marking runs even for cache hits so a file first seen as
    /// ambient context is promoted - user-defined status is never revoked.
    ///
    /// Returns `None` when the file cannot be read or parsed; a diagnostic is
    /// recorded and the caller treats the target as unresolved.
    pub fn load_file(
        &mut self,
        path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Arc<SourceFile>> {
        let path = normalize(path);
        let file = self.insert(&path, sink)?;

        if !self.user_defined.contains(&path) {
            self.user_defined.insert(path);
            let imports: Vec<_> = file
                .imports
                .iter()
                .filter(|i| i.is_relative())
                .map(|i| i.module.clone())
                .collect();
            let base = file.path.parent().unwrap_or(Path::new("")).to_path_buf();
            for specifier in imports {
                if let Some(dep) = resolve_import_specifier(&base, &specifier) {
                    self.load_file(&dep, sink);
                }
            }
        }

        Some(file)
    }

    /// Register a file as ambient/library context without user-defined status
    pub fn add_ambient(
        &mut self,
        path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Arc<SourceFile>> {
        let path = normalize(path);
        self.insert(&path, sink)
    }

    /// Find a top-level interface by name in any cached file, in load order
    pub fn find_interface(&self, name: &str) -> Option<Arc<SourceFile>> {
        self.files
            .iter()
            .find(|f| f.module.interface(name).is_some())
            .map(Arc::clone)
    }

    /// Find a top-level enum by name in any cached file, in load order
    pub fn find_enum(&self, name: &str) -> Option<EnumDecl> {
        self.files
            .iter()
            .find_map(|f| f.module.enum_decl(name))
            .cloned()
    }

    fn insert(&mut self, path: &Path, sink: &mut dyn DiagnosticSink) -> Option<Arc<SourceFile>> {
        if let Some(&i) = self.index.get(path) {
            return Some(Arc::clone(&self.files[i]));
        }

        match self.parser.parse_file(path) {
            Ok(file) => {
                let file = Arc::new(file);
                self.index.insert(path.to_path_buf(), self.files.len());
                self.files.push(Arc::clone(&file));
                Some(file)
            }
            Err(e) => {
                sink.warn_in(format!("could not load declaration file: {}", e), path);
                None
            }
        }
    }
}

/// Canonicalize when possible so the same file is never cached twice
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve a relative import specifier to an existing file, probing the
/// specifier as written, then source/declaration extensions, then index files
fn resolve_import_specifier(base: &Path, specifier: &str) -> Option<PathBuf> {
    let joined = base.join(specifier);
    if joined.is_file() {
        return Some(joined);
    }
    for suffix in IMPORT_CANDIDATES {
        let candidate = PathBuf::from(format!("{}{}", joined.display(), suffix));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn graph() -> TypeGraph {
        TypeGraph::new(ProjectConfig::default()).unwrap()
    }

    #[test]
    fn test_load_marks_user_defined() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", "export interface A { id: string }");

        let mut g = graph();
        let mut sink = Diagnostics::new();
        let file = g.load_file(&path, &mut sink).unwrap();

        assert!(file.module.interface("A").is_some());
        assert!(g.is_user_defined(&path));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_load_marks_dependencies_transitively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "c.ts", "export interface C { id: string }");
        write(
            dir.path(),
            "b.ts",
            "import { C } from './c'\nexport interface B { c: C }",
        );
        let a = write(
            dir.path(),
            "a.ts",
            "import { B } from './b'\nexport interface A { b: B }",
        );

        let mut g = graph();
        let mut sink = Diagnostics::new();
        g.load_file(&a, &mut sink).unwrap();

        assert_eq!(g.len(), 3);
        assert!(g.is_user_defined(&dir.path().join("b.ts")));
        assert!(g.is_user_defined(&dir.path().join("c.ts")));
    }

    #[test]
    fn test_circular_imports_terminate() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.ts",
            "import { B } from './b'\nexport interface A { b: B }",
        );
        let b = write(
            dir.path(),
            "b.ts",
            "import { A } from './a'\nexport interface B { a: A }",
        );

        let mut g = graph();
        let mut sink = Diagnostics::new();
        g.load_file(&b, &mut sink).unwrap();

        assert_eq!(g.len(), 2);
        assert!(g.is_user_defined(&dir.path().join("a.ts")));
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", "export interface A { id: string }");

        let mut g = graph();
        let mut sink = Diagnostics::new();
        let first = g.load_file(&path, &mut sink).unwrap();
        let second = g.load_file(&path, &mut sink).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_ambient_not_user_defined() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "lib.d.ts", "interface Ambient { id: string }");

        let mut g = graph();
        let mut sink = Diagnostics::new();
        g.add_ambient(&path, &mut sink).unwrap();

        assert!(!g.is_user_defined(&path));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_ambient_promoted_by_load() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", "export interface A { id: string }");

        let mut g = graph();
        let mut sink = Diagnostics::new();
        g.add_ambient(&path, &mut sink).unwrap();
        assert!(!g.is_user_defined(&path));

        g.load_file(&path, &mut sink).unwrap();
        assert!(g.is_user_defined(&path));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_missing_file_warns() {
        let mut g = graph();
        let mut sink = Diagnostics::new();
        let result = g.load_file(Path::new("/nonexistent/nope.ts"), &mut sink);

        assert!(result.is_none());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_find_interface_in_load_order() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.ts", "export interface Shared { a: string }");
        let b = write(dir.path(), "b.ts", "export interface Shared { b: string }");

        let mut g = graph();
        let mut sink = Diagnostics::new();
        g.load_file(&a, &mut sink).unwrap();
        g.load_file(&b, &mut sink).unwrap();

        let found = g.find_interface("Shared").unwrap();
        assert_eq!(found.path, normalize(&a));
        assert!(g.find_interface("Missing").is_none());
    }

    #[test]
    fn test_import_specifier_probing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "models/index.ts", "export interface M {}");
        write(dir.path(), "types.d.ts", "interface T {}");

        assert_eq!(
            resolve_import_specifier(dir.path(), "./models"),
            Some(dir.path().join("./models/index.ts"))
        );
        assert_eq!(
            resolve_import_specifier(dir.path(), "./types"),
            Some(dir.path().join("./types.d.ts"))
        );
        assert_eq!(resolve_import_specifier(dir.path(), "./absent"), None);
    }
}
