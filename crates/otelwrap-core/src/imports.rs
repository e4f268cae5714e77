//! Import allocation.
//!
//! [`ImportAllocator`] turns a sequence of desired `(path, name)` imports into
//! an ordered import list with at most one entry per path and collision-free
//! local names. [`ImportCollector`] accumulates the packages referenced while
//! resolving interfaces.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

/// One import of the generated file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportBinding {
    pub path: String,
    pub preferred_name: String,
    /// Explicit alias to emit, `None` when the default package name is used
    pub alias: Option<String>,
    pub used_name: String,
}

impl ImportBinding {
    /// A requested import before allocation.
    pub fn requested(path: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: path.into(),
            preferred_name: name.clone(),
            alias: None,
            used_name: name,
        }
    }

    /// Renders the import spec line, e.g. `dcodes "domain/codes"`.
    pub fn to_spec(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}

/// Options for [`ImportAllocator::add`]
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    prefer_prefix: Option<String>,
}

impl AddOptions {
    /// Use `prefix` instead of the parent directory's initial on collision.
    pub fn prefer_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefer_prefix: Some(prefix.into()),
        }
    }
}

/// Builds the import list of one generated file
#[derive(Debug, Default)]
pub struct ImportAllocator {
    bindings: IndexMap<String, ImportBinding>,
    used_names: HashMap<String, usize>,
}

impl ImportAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an import. Re-adding a known path is a no-op.
    pub fn add(&mut self, path: &str, preferred_name: &str, options: AddOptions) {
        if self.bindings.contains_key(path) {
            return;
        }

        let used_name = if self.used_names.contains_key(preferred_name) {
            self.disambiguate(path, preferred_name, &options)
        } else {
            preferred_name.to_string()
        };

        let alias = (used_name != default_package_name(path)).then(|| used_name.clone());
        let index = self.bindings.len();
        self.used_names.insert(used_name.clone(), index);
        self.bindings.insert(
            path.to_string(),
            ImportBinding {
                path: path.to_string(),
                preferred_name: preferred_name.to_string(),
                alias,
                used_name,
            },
        );
    }

    fn disambiguate(&self, path: &str, name: &str, options: &AddOptions) -> String {
        let candidate = match parent_dir(path) {
            None => format!("std{name}"),
            Some(dir) => match &options.prefer_prefix {
                Some(prefix) => format!("{prefix}{name}"),
                None => {
                    let base = dir.rsplit('/').next().unwrap_or(dir);
                    let initial: String = base.chars().take(1).collect();
                    format!("{initial}{name}")
                }
            },
        };

        let mut chosen = candidate.clone();
        let mut suffix = 1;
        while self.used_names.contains_key(&chosen) {
            chosen = format!("{candidate}{suffix}");
            suffix += 1;
        }
        chosen
    }

    /// Imports in insertion order.
    pub fn imports(&self) -> Vec<ImportBinding> {
        self.bindings.values().cloned().collect()
    }

    /// Local name chosen for `path`, `None` when the path is not imported.
    pub fn chosen_name(&self, path: &str) -> Option<&str> {
        self.bindings.get(path).map(|b| b.used_name.as_str())
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx]).filter(|dir| !dir.is_empty())
}

/// The package name Go assumes for an import path without an alias.
///
/// Skips a trailing major-version element (`/v2`), strips a `.vN` suffix
/// (`gopkg.in/yaml.v3`) and a leading `go-`, and maps any remaining
/// non-identifier character to `_`.
pub fn default_package_name(path: &str) -> String {
    let mut elements = path.rsplit('/');
    let mut last = elements.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(previous) = elements.next() {
            last = previous;
        }
    }

    if let Some(idx) = last.rfind(".v") {
        if last[idx + 2..].chars().all(|c| c.is_ascii_digit()) && idx + 2 < last.len() {
            last = &last[..idx];
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);

    last.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn is_major_version(element: &str) -> bool {
    element.len() > 1
        && element.starts_with('v')
        && element[1..].chars().all(|c| c.is_ascii_digit())
}

/// Standard-library paths have no dot anywhere in the path.
pub fn is_std_path(path: &str) -> bool {
    !path.contains('.')
}

/// Packages referenced while resolving, first occurrence wins.
#[derive(Debug, Default, Clone)]
pub struct ImportCollector {
    imports: IndexMap<String, String>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &str, name: &str) {
        if !self.imports.contains_key(path) {
            self.imports.insert(path.to_string(), name.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Collected imports, standard library first, each group by path.
    pub fn sorted(&self) -> Vec<ImportBinding> {
        let mut result: Vec<ImportBinding> = self
            .imports
            .iter()
            .map(|(path, name)| ImportBinding::requested(path.as_str(), name.as_str()))
            .collect();
        result.sort_by(|a, b| {
            is_std_path(&b.path)
                .cmp(&is_std_path(&a.path))
                .then_with(|| a.path.cmp(&b.path))
        });
        result
    }
}
