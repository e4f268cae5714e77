//! # Otelwrap Core
//!
//! Static analysis and code generation for OpenTelemetry tracing wrappers
//! around Go interfaces:
//! - Package loading from a Go module on disk or from memory
//! - Interface resolution across embedded interfaces and type aliases
//! - Type-expression models with byte-accurate package reference spans
//! - Import and identifier allocation with deterministic collision rules
//! - Source generation of the wrapper struct, constructor and methods
//!
//! The `otelwrap` binary is a thin command line shell over [`command`].

#![warn(clippy::all)]

pub mod command;
pub mod errors;
pub mod format;
pub mod generate;
pub mod imports;
pub mod loader;
pub mod model;
pub mod naming;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use command::{check_in_another, find_and_generate, run_command, CommandArgs};
pub use errors::{GenerateError, Result};
pub use format::{Gofmt, SourceFormatter, SyntaxCheck};
pub use generate::{generate_code, load_and_generate, load_package_type_data, GenerateConfig, OutputPackage};
pub use imports::{ImportAllocator, ImportBinding};
pub use loader::{DirectorySource, LoadedPackage, MemorySource, PackageCache, PackageSource};
pub use model::{InterfaceModel, Method, PackageReference, PackageTypeInfo, Role, Tuple};
pub use naming::IdentifierAllocator;
pub use resolver::InterfaceResolver;

/// Otelwrap version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for otelwrap components.
///
/// `RUST_LOG` takes precedence; otherwise `otelwrap` targets log at `info`,
/// or at `debug` when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "otelwrap=debug,otelwrap_core=debug" } else { "otelwrap=info,otelwrap_core=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
