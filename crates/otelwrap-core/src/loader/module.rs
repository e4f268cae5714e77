/*!
# Directory Source

Maps Go import paths to directories of an on-disk module: the main module,
local `replace` targets, `vendor/`, the module cache and `$GOROOT/src`.
*/

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use super::{PackageSource, SourceFile};
use crate::errors::{GenerateError, Result};

/// The parts of a `go.mod` file used for import path resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module_path: String,
    /// `(module path, version)` from `require` directives
    pub requires: Vec<(String, String)>,
    /// `(module path, local directory)` from `replace` directives
    pub replaces: Vec<(String, String)>,
}

impl GoMod {
    pub fn parse(text: &str) -> Self {
        let mut go_mod = GoMod::default();
        let mut block: Option<String> = None;

        for raw_line in text.lines() {
            let line = match raw_line.find("//") {
                Some(idx) => &raw_line[..idx],
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            if let Some(directive) = &block {
                if line == ")" {
                    block = None;
                } else {
                    let directive = directive.clone();
                    go_mod.directive(&directive, line);
                }
                continue;
            }

            let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            if rest == "(" {
                block = Some(directive.to_string());
            } else {
                go_mod.directive(directive, rest);
            }
        }
        go_mod
    }

    fn directive(&mut self, directive: &str, args: &str) {
        let unquote = |s: &str| s.trim_matches('"').to_string();
        match directive {
            "module" => self.module_path = unquote(args),
            "require" => {
                let mut parts = args.split_whitespace();
                if let (Some(path), Some(version)) = (parts.next(), parts.next()) {
                    self.requires.push((unquote(path), version.to_string()));
                }
            }
            "replace" => {
                let Some((from, to)) = args.split_once("=>") else {
                    return;
                };
                let from = from.split_whitespace().next().map(unquote);
                let mut to_parts = to.split_whitespace();
                let target = to_parts.next().map(unquote);
                // Only directory replacements have no version.
                if let (Some(from), Some(target), None) = (from, target, to_parts.next()) {
                    if target.starts_with("./") || target.starts_with("../") || target.starts_with('/') {
                        self.replaces.push((from, target));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Reads packages from a Go module checked out on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    go_mod: GoMod,
    module_cache: Option<PathBuf>,
    goroot: Option<PathBuf>,
}

impl DirectorySource {
    /// Finds the nearest `go.mod` at or above `dir`.
    ///
    /// The module cache and `GOROOT` come from the environment.
    pub fn discover(dir: &Path) -> Result<Self> {
        let start = dir.canonicalize()?;
        let mut current = Some(start.as_path());
        while let Some(candidate) = current {
            let go_mod_path = candidate.join("go.mod");
            if go_mod_path.is_file() {
                let go_mod = GoMod::parse(&fs::read_to_string(&go_mod_path)?);
                debug!(root = %candidate.display(), module = %go_mod.module_path, "found go.mod");
                return Ok(Self::new(candidate, go_mod)
                    .with_module_cache(env_module_cache())
                    .with_goroot(std::env::var_os("GOROOT").map(PathBuf::from)));
            }
            current = candidate.parent();
        }

        Err(GenerateError::ModuleNotFound {
            dir: dir.to_path_buf(),
        })
    }

    pub fn new(root: impl Into<PathBuf>, go_mod: GoMod) -> Self {
        Self {
            root: root.into(),
            go_mod,
            module_cache: None,
            goroot: None,
        }
    }

    pub fn with_module_cache(mut self, module_cache: Option<PathBuf>) -> Self {
        self.module_cache = module_cache;
        self
    }

    pub fn with_goroot(mut self, goroot: Option<PathBuf>) -> Self {
        self.goroot = goroot;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self) -> &str {
        &self.go_mod.module_path
    }

    /// Import path of the package in `dir`, which must be inside the module.
    pub fn import_path_for_dir(&self, dir: &Path) -> Result<String> {
        let dir = dir.canonicalize()?;
        let root = self.root.canonicalize()?;
        let relative = dir.strip_prefix(&root).map_err(|_| GenerateError::ModuleNotFound {
            dir: dir.clone(),
        })?;

        let mut path = self.go_mod.module_path.clone();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                path.push('/');
                path.push_str(&part.to_string_lossy());
            }
        }
        Ok(path)
    }

    /// Directory holding the package `import_path`, if it can be located.
    pub fn package_dir(&self, import_path: &str) -> Option<PathBuf> {
        if let Some(rest) = strip_module(import_path, &self.go_mod.module_path) {
            return Some(join_rest(&self.root, rest));
        }

        if let Some((module, target)) = longest_match(&self.go_mod.replaces, import_path) {
            let rest = strip_module(import_path, module).unwrap_or_default();
            return Some(join_rest(&self.root.join(target), rest));
        }

        let vendored = join_rest(&self.root.join("vendor"), import_path);
        if vendored.is_dir() {
            return Some(vendored);
        }

        if let (Some(cache), Some((module, version))) =
            (&self.module_cache, longest_match(&self.go_mod.requires, import_path))
        {
            let rest = strip_module(import_path, module).unwrap_or_default();
            let module_dir = cache.join(format!("{}@{}", escape_module_path(module), escape_module_path(version)));
            return Some(join_rest(&module_dir, rest));
        }

        let first_element = import_path.split('/').next().unwrap_or(import_path);
        if !first_element.contains('.') {
            if let Some(goroot) = &self.goroot {
                return Some(join_rest(&goroot.join("src"), import_path));
            }
        }
        None
    }
}

impl PackageSource for DirectorySource {
    fn package_files(&self, path: &str) -> Result<Option<Vec<SourceFile>>> {
        let Some(dir) = self.package_dir(path) else {
            return Ok(None);
        };
        if !dir.is_dir() {
            trace!(package = path, dir = %dir.display(), "package directory missing");
            return Ok(None);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".go") && !name.ends_with("_test.go") && entry.file_type()?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let text = fs::read_to_string(dir.join(&name))?;
            files.push(SourceFile::new(dir.join(&name).to_string_lossy(), text));
        }
        Ok(Some(files))
    }
}

fn strip_module<'a>(import_path: &'a str, module: &str) -> Option<&'a str> {
    if module.is_empty() {
        return None;
    }
    if import_path == module {
        return Some("");
    }
    import_path
        .strip_prefix(module)
        .and_then(|rest| rest.strip_prefix('/'))
}

fn longest_match<'a>(entries: &'a [(String, String)], import_path: &str) -> Option<(&'a str, &'a str)> {
    entries
        .iter()
        .filter(|(module, _)| strip_module(import_path, module).is_some())
        .max_by_key(|(module, _)| module.len())
        .map(|(module, value)| (module.as_str(), value.as_str()))
}

fn join_rest(base: &Path, rest: &str) -> PathBuf {
    rest.split('/')
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |dir, part| dir.join(part))
}

/// Module cache escaping: every upper-case letter becomes `!` + lower case.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn env_module_cache() -> Option<PathBuf> {
    if let Some(cache) = std::env::var_os("GOMODCACHE").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(cache));
    }
    let gopath = std::env::var_os("GOPATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join("go")))?;
    // GOPATH may be a list; the first entry holds the cache.
    let first = std::env::split_paths(&gopath).next()?;
    Some(first.join("pkg").join("mod"))
}
