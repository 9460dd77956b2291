use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name searched for when discovering project configuration
pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Project configuration relevant to declaration resolution.
///
/// Discovered by walking parent directories from the file that carries the
/// annotation. Absence of a config file is tolerated and yields an empty
/// path-mapping table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    /// Directory containing the discovered config file
    pub root_dir: PathBuf,
    /// Wildcard path mappings from `compilerOptions.paths`
    pub paths: Vec<PathMapping>,
}

/// A single wildcard mapping, e.g. `"@app/*" -> ["src/app/*"]`
#[derive(Debug, Clone, PartialEq)]
pub struct PathMapping {
    pub alias: String,
    pub targets: Vec<String>,
}

/// On-disk shape of the parts of tsconfig.json we read
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawConfig {
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCompilerOptions {
    paths: serde_json::Map<String, serde_json::Value>,
}

impl ProjectConfig {
    /// Load configuration from a specific config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&contents)
            .map_err(|e| Error::config_parse(path, e.to_string()))?;

        let root_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let mut paths = Vec::new();
        for (alias, value) in &raw.compiler_options.paths {
            let targets: Vec<String> = match value {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect(),
                _ => Vec::new(),
            };
            if !targets.is_empty() {
                paths.push(PathMapping {
                    alias: alias.clone(),
                    targets,
                });
            }
        }

        Ok(Self { root_dir, paths })
    }

    /// Discover configuration by walking parent directories from `anchor`.
    ///
    /// Stops at the first directory containing `tsconfig.json` or at the
    /// filesystem root. A missing or unreadable config file yields the empty
    /// configuration.
    pub fn discover(anchor: &Path) -> Self {
        let start = if anchor.is_dir() {
            anchor
        } else {
            anchor.parent().unwrap_or(Path::new(""))
        };

        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate).unwrap_or_else(|_| Self {
                    root_dir: current.to_path_buf(),
                    paths: Vec::new(),
                });
            }
            dir = current.parent();
        }

        Self::default()
    }

    /// Expand a module specifier through the wildcard mapping table.
    ///
    /// `@app/models/person` against `"@app/*" -> ["src/app/*"]` yields
    /// `<root_dir>/src/app/models/person`. Candidates are returned in mapping
    /// order; extension probing is the caller's concern.
    pub fn expand_alias(&self, module_specifier: &str) -> Vec<PathBuf> {
        let mut parts = module_specifier.split('/');
        let alias_start = match parts.next() {
            Some(s) if !s.is_empty() => s,
            _ => return Vec::new(),
        };
        let alias_rest = parts.collect::<Vec<_>>().join("/");

        let mut candidates = Vec::new();
        for mapping in &self.paths {
            if !mapping.alias.starts_with(alias_start) || !mapping.alias.ends_with('*') {
                continue;
            }
            for target in &mapping.targets {
                let substituted = target.replace('*', &alias_rest);
                candidates.push(self.root_dir.join(substituted));
            }
        }
        candidates
    }

    /// Whether any path mappings were discovered
    pub fn has_paths(&self) -> bool {
        !self.paths.is_empty()
    }
}
