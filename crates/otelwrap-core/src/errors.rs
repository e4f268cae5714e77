use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, resolving or generating a wrapper
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The package path could not be mapped to any source
    #[error("can not load package '{path}'")]
    NotFound { path: String },

    /// A requested declaration is missing from a loaded package
    #[error("can not find interface '{name}' in package '{package}'")]
    DeclarationNotFound { name: String, package: String },

    /// The declaration exists but neither is nor aliases an interface
    #[error("name '{name}' is not an interface")]
    NotAnInterface { name: String },

    /// An embedded interface or alias target could not be located
    #[error("can not find embedded interface '{name}' in package '{package}'")]
    InterfaceNotFound { name: String, package: String },

    #[error("can not have mixed interface names")]
    MixedInterfaceQualifier,

    #[error("missing interface names")]
    MissingInterfaceNames,

    /// The originating file has no import for the requested qualifier
    #[error("package '{qualifier}' is not imported by '{}'", file.display())]
    QualifierNotImported { qualifier: String, file: PathBuf },

    #[error("can not find go.mod above '{}'", dir.display())]
    ModuleNotFound { dir: PathBuf },

    /// Emitted text failed to parse or format
    #[error("syntax error in generated code: {message}")]
    Syntax { message: String },

    #[error("can not install the Go grammar: {0}")]
    Grammar(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerateError {
    /// Re-tag a loader miss as a missing embed or alias target.
    pub(crate) fn into_interface_not_found(self) -> Self {
        match self {
            Self::DeclarationNotFound { name, package } => Self::InterfaceNotFound { name, package },
            other => other,
        }
    }
}

/// Result type for otelwrap operations
pub type Result<T> = std::result::Result<T, GenerateError>;
