// Discovery of @apiInterface annotations in source files.
//
// The host documentation tool normally discovers annotations itself; the
// standalone CLI uses this scanner to find them for direct expansion.

use crate::error::Result;
use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Annotation tag searched for in comments
pub const ANNOTATION_TAG: &str = "@apiInterface";

/// Extensions of files that may carry annotations
const SOURCE_EXTENSIONS: [&str; 8] = ["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Directories never scanned
const DEFAULT_EXCLUDES: [&str; 5] = ["node_modules", ".git", "dist", "build", "coverage"];

/// A discovered annotation occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// File the annotation was found in
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Annotation body after the tag
    pub content: String,
}

fn annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"{}\s+(.+)$", ANNOTATION_TAG)).expect("annotation regex is valid")
    })
}

/// Finds annotation occurrences under a root path
pub struct Scanner {
    exclude: Vec<Pattern>,
}

impl Scanner {
    /// Create a scanner with additional glob exclude patterns
    pub fn new(exclude: &[String]) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    /// Discover scannable source files under `root`, sorted for determinism
    pub fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_dir() || !is_source_file(path) {
                continue;
            }
            if self.should_exclude(path, root) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Scan a single file for annotations
    pub fn scan_file(&self, path: &Path) -> Result<Vec<Annotation>> {
        let source = std::fs::read_to_string(path)?;
        let mut annotations = Vec::new();

        for (index, line) in source.lines().enumerate() {
            if let Some(captures) = annotation_regex().captures(line) {
                let content = captures[1].trim_end_matches("*/").trim().to_string();
                annotations.push(Annotation {
                    file: path.to_path_buf(),
                    line: index + 1,
                    content,
                });
            }
        }

        Ok(annotations)
    }

    /// Scan all source files under `root`
    pub fn scan(&self, root: &Path) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        for file in self.discover_files(root)? {
            annotations.extend(self.scan_file(&file)?);
        }
        Ok(annotations)
    }

    /// Check a path against exclude patterns and default exclusions
    fn should_exclude(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);

        for pattern in &self.exclude {
            if pattern.matches_path(relative) {
                return true;
            }
        }

        relative.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map_or(false, |name| DEFAULT_EXCLUDES.contains(&name))
        })
    }
}

/// Check if a file's extension marks it as scannable source
fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| {
            SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
}
