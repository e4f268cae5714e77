// Package loading - parses Go packages from a PackageSource and caches them
// by import path for the duration of one invocation.
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::errors::{GenerateError, Result};

pub mod memory;
pub mod module;
pub mod syntax;

pub use memory::MemorySource;
pub use module::{DirectorySource, GoMod};
pub use syntax::{GoParser, ParsedFile, TypeDecl, TypeIdent};

/// Raw source text of one file of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Capability to fetch the source files of a package by import path
pub trait PackageSource {
    /// Returns `None` when the path is unknown to this source.
    fn package_files(&self, path: &str) -> Result<Option<Vec<SourceFile>>>;
}

impl<S: PackageSource + ?Sized> PackageSource for &S {
    fn package_files(&self, path: &str) -> Result<Option<Vec<SourceFile>>> {
        (**self).package_files(path)
    }
}

/// Go builtin type identifiers that never need a package qualifier
const BUILTIN_TYPES: &[&str] = &[
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32", "float64",
    "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr",
];

/// What an identifier inside a type expression refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentUse<'a> {
    /// The qualifier of `pkg.Name`, resolved through the file's imports
    Package { path: &'a str },
    /// A type declared at package level of the package at `path`
    Type { path: &'a str },
    TypeParam,
    Builtin,
    Unresolved,
}

/// A parsed package with its declarations indexed by name
#[derive(Debug)]
pub struct LoadedPackage {
    pub name: String,
    pub path: String,
    files: Vec<ParsedFile>,
    declarations: HashMap<String, (usize, usize)>,
}

/// A type declaration together with the file it lives in
#[derive(Debug, Clone, Copy)]
pub struct DeclRef<'a> {
    pub file: &'a ParsedFile,
    pub decl: &'a TypeDecl,
}

impl LoadedPackage {
    pub fn from_files(path: impl Into<String>, files: Vec<ParsedFile>) -> Self {
        let path = path.into();
        let name = files.first().map(|f| f.package_name.clone()).unwrap_or_default();

        let mut kept = Vec::with_capacity(files.len());
        for file in files {
            if file.package_name != name {
                warn!(
                    file = %file.name,
                    package = %file.package_name,
                    expected = %name,
                    "skipping file of a different package"
                );
                continue;
            }
            kept.push(file);
        }

        let mut declarations = HashMap::new();
        for (file_index, file) in kept.iter().enumerate() {
            for (decl_index, decl) in file.types.iter().enumerate() {
                declarations
                    .entry(decl.name.clone())
                    .or_insert((file_index, decl_index));
            }
        }

        Self {
            name,
            path,
            files: kept,
            declarations,
        }
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn type_decl(&self, name: &str) -> Option<DeclRef<'_>> {
        let &(file_index, decl_index) = self.declarations.get(name)?;
        let file = &self.files[file_index];
        Some(DeclRef {
            file,
            decl: &file.types[decl_index],
        })
    }

    /// Import path bound to `qualifier` in `file`.
    pub fn resolve_qualifier<'a>(&self, file: &'a ParsedFile, qualifier: &str) -> Option<&'a str> {
        file.imports
            .iter()
            .find(|spec| spec.used_name().as_deref() == Some(qualifier))
            .map(|spec| spec.path.as_str())
    }

    /// Resolves an identifier used in a type expression of `file`, with
    /// `type_params` in scope.
    pub fn resolve_ident<'a>(
        &'a self,
        file: &'a ParsedFile,
        type_params: &[String],
        ident: &TypeIdent,
    ) -> IdentUse<'a> {
        match ident {
            TypeIdent::Qualified { qualifier, .. } => match self.resolve_qualifier(file, qualifier) {
                Some(path) => IdentUse::Package { path },
                None => IdentUse::Unresolved,
            },
            TypeIdent::Local { name, .. } => {
                if type_params.iter().any(|p| p == name) {
                    IdentUse::TypeParam
                } else if self.declares(name) {
                    IdentUse::Type { path: &self.path }
                } else if BUILTIN_TYPES.contains(&name.as_str()) {
                    IdentUse::Builtin
                } else {
                    IdentUse::Unresolved
                }
            }
        }
    }
}

/// Loads packages on demand and keeps each one for the rest of the run
pub struct PackageCache<S> {
    source: S,
    parser: GoParser,
    packages: HashMap<String, Rc<LoadedPackage>>,
    loads: usize,
}

impl<S: PackageSource> PackageCache<S> {
    pub fn new(source: S) -> Result<Self> {
        Ok(Self {
            source,
            parser: GoParser::new()?,
            packages: HashMap::new(),
            loads: 0,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of packages actually read from the source.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Loads `path` once and checks that every `required` declaration exists.
    pub fn load(&mut self, path: &str, required: &[&str]) -> Result<Rc<LoadedPackage>> {
        let package = match self.packages.get(path) {
            Some(package) => Rc::clone(package),
            None => {
                let package = Rc::new(self.read_package(path)?);
                self.packages.insert(path.to_string(), Rc::clone(&package));
                package
            }
        };

        if let Some(missing) = required.iter().find(|name| !package.declares(name)) {
            return Err(GenerateError::DeclarationNotFound {
                name: missing.to_string(),
                package: path.to_string(),
            });
        }
        Ok(package)
    }

    fn read_package(&mut self, path: &str) -> Result<LoadedPackage> {
        let files = match self.source.package_files(path)? {
            Some(files) if !files.is_empty() => files,
            _ => {
                return Err(GenerateError::NotFound {
                    path: path.to_string(),
                })
            }
        };

        self.loads += 1;
        debug!(package = path, files = files.len(), "loading package");

        let parsed = files
            .iter()
            .map(|file| self.parser.parse_file(&file.name, &file.text))
            .collect::<Result<Vec<_>>>()?;
        Ok(LoadedPackage::from_files(path, parsed))
    }
}
