//! Wrapper generation.
//!
//! [`load_package_type_data`] resolves the requested interfaces into a
//! [`PackageTypeInfo`]; [`generate_code`] allocates imports and identifiers
//! for it and renders the wrapper source.

use std::collections::HashSet;
use std::io::Write;

use tracing::debug;

use crate::errors::{GenerateError, Result};
use crate::imports::{AddOptions, ImportAllocator, ImportBinding, ImportCollector};
use crate::loader::{PackageCache, PackageSource};
use crate::model::{InterfaceModel, Method, PackageReference, PackageTypeInfo, Role, Tuple};
use crate::naming::IdentifierAllocator;
use crate::resolver::InterfaceResolver;
use crate::types::rewrite_type;

pub mod source_gen;

#[cfg(test)]
mod source_gen_tests;

pub use source_gen::render;

pub const OTEL_TRACE_PATH: &str = "go.opentelemetry.io/otel/trace";
pub const OTEL_CODES_PATH: &str = "go.opentelemetry.io/otel/codes";

/// Package the generated file belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputPackage {
    /// Next to the wrapped interfaces, which are referenced unqualified
    #[default]
    Same,
    /// Another package importing the wrapped one; `name` overrides the
    /// package clause
    Other { name: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateConfig {
    pub output: OutputPackage,
}

impl GenerateConfig {
    pub fn in_another_package(name: Option<String>) -> Self {
        Self {
            output: OutputPackage::Other { name },
        }
    }

    pub fn is_in_another_package(&self) -> bool {
        matches!(self.output, OutputPackage::Other { .. })
    }
}

/// Loads `path` and resolves every interface in `names`.
pub fn load_package_type_data<S: PackageSource>(
    cache: &mut PackageCache<S>,
    path: &str,
    names: &[String],
) -> Result<PackageTypeInfo> {
    if names.is_empty() {
        return Err(GenerateError::MissingInterfaceNames);
    }

    let required: Vec<&str> = names.iter().map(String::as_str).collect();
    let package = cache.load(path, &required)?;

    let mut collector = ImportCollector::new();
    let mut resolver = InterfaceResolver::new(cache, &mut collector);
    let interfaces = names
        .iter()
        .map(|name| resolver.resolve(path, name))
        .collect::<Result<Vec<_>>>()?;

    let imports = collector
        .sorted()
        .into_iter()
        .filter(|binding| binding.path != package.path)
        .collect();

    Ok(PackageTypeInfo {
        name: package.name.clone(),
        path: package.path.clone(),
        imports,
        interfaces,
    })
}

/// Renders the wrappers for `info`; nothing is written unless rendering
/// succeeds.
pub fn generate_code<W: Write>(writer: &mut W, info: &PackageTypeInfo, config: &GenerateConfig) -> Result<()> {
    let plan = plan_file(info, config);
    let source = render(&plan);
    writer.write_all(source.as_bytes())?;
    Ok(())
}

pub fn load_and_generate<W: Write, S: PackageSource>(
    writer: &mut W,
    source: S,
    path: &str,
    names: &[String],
    config: &GenerateConfig,
) -> Result<()> {
    let mut cache = PackageCache::new(source)?;
    let info = load_package_type_data(&mut cache, path, names)?;
    generate_code(writer, &info, config)
}

/// Everything the renderer needs, with names and types final
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    pub package_name: String,
    pub imports: Vec<ImportBinding>,
    pub tracer_type: String,
    pub codes_error: String,
    pub wrappers: Vec<WrapperPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperPlan {
    /// Field name of the embedded interface
    pub name: String,
    /// Embedded interface type, qualified and instantiated as needed
    pub embedded: String,
    pub struct_name: String,
    /// Type parameter declarations, e.g. `K comparable, V any`
    pub type_params: Option<String>,
    /// Type parameter names, e.g. `K, V`
    pub type_args: Option<String>,
    pub methods: Vec<MethodPlan>,
}

impl WrapperPlan {
    /// `HandlerWrapper` or `RepoWrapper[K, V]`
    pub fn struct_type(&self) -> String {
        match &self.type_args {
            Some(args) => format!("{}[{args}]", self.struct_name),
            None => self.struct_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPlan {
    pub name: String,
    pub params: Vec<FieldPlan>,
    pub results: Vec<FieldPlan>,
    pub ctx_name: String,
    pub span_name: String,
    /// Last error-carrier result
    pub err_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub name: String,
    pub type_text: String,
    pub is_variadic: bool,
}

/// Methods without a leading context are not wrapped.
fn emitted_methods(interface: &InterfaceModel) -> impl Iterator<Item = &Method> {
    interface.methods.iter().filter(|method| method.is_traceable())
}

/// Package paths referenced by the code that is actually emitted.
fn referenced_paths(info: &PackageTypeInfo) -> HashSet<&str> {
    let mut paths = HashSet::new();
    for interface in &info.interfaces {
        if let Some(params) = &interface.type_params {
            paths.extend(params.references.iter().map(|r| r.path.as_str()));
        }
        for method in emitted_methods(interface) {
            for tuple in method.params.iter().chain(&method.results) {
                paths.extend(tuple.references.iter().map(|r| r.path.as_str()));
            }
        }
    }
    paths
}

fn allocate_imports(info: &PackageTypeInfo, config: &GenerateConfig) -> ImportAllocator {
    let mut allocator = ImportAllocator::new();
    if config.is_in_another_package() {
        allocator.add(&info.path, &info.name, AddOptions::default());
    }

    let referenced = referenced_paths(info);
    for binding in &info.imports {
        if binding.path != info.path && referenced.contains(binding.path.as_str()) {
            allocator.add(&binding.path, &binding.preferred_name, AddOptions::default());
        }
    }

    allocator.add(OTEL_TRACE_PATH, "trace", AddOptions::prefer_prefix("otel"));
    let returns_error = info
        .interfaces
        .iter()
        .any(|interface| emitted_methods(interface).any(Method::returns_error));
    if returns_error {
        allocator.add(OTEL_CODES_PATH, "codes", AddOptions::prefer_prefix("otel"));
    }
    allocator
}

/// Allocates imports and identifiers for `info`.
pub fn plan_file(info: &PackageTypeInfo, config: &GenerateConfig) -> FilePlan {
    let imports = allocate_imports(info, config);
    let chosen = |path: &str| imports.chosen_name(path);

    let package_name = match &config.output {
        OutputPackage::Other { name: Some(name) } => name.clone(),
        _ => info.name.clone(),
    };

    let mut identifiers = IdentifierAllocator::new();
    identifiers.add_global(info.name.as_str());
    identifiers.add_global(package_name.as_str());
    for binding in imports.imports() {
        identifiers.add_global(binding.used_name);
    }
    for interface in &info.interfaces {
        identifiers.add_global(interface.name.as_str());
        identifiers.add_global(format!("{}Wrapper", interface.name));
        identifiers.add_global(format!("New{}Wrapper", interface.name));
        if let Some(params) = &interface.type_params {
            for name in &params.names {
                identifiers.add_global(name.as_str());
            }
        }
    }

    let self_reference = [PackageReference::insertion(info.path.as_str(), 0)];
    let wrappers = info
        .interfaces
        .iter()
        .map(|interface| {
            for skipped in interface.methods.iter().filter(|m| !m.is_traceable()) {
                debug!(interface = %interface.name, method = %skipped.name, "skipping method without leading context");
            }
            let type_args = interface.type_params.as_ref().map(|p| p.names.join(", "));
            let qualified = rewrite_type(&interface.name, &self_reference, chosen);
            let embedded = match &type_args {
                Some(args) => format!("{qualified}[{args}]"),
                None => qualified,
            };

            WrapperPlan {
                name: interface.name.clone(),
                embedded,
                struct_name: format!("{}Wrapper", interface.name),
                type_params: interface
                    .type_params
                    .as_ref()
                    .map(|p| rewrite_type(&p.text, &p.references, chosen)),
                type_args,
                methods: emitted_methods(interface)
                    .map(|method| plan_method(&identifiers, method, &chosen))
                    .collect(),
            }
        })
        .collect();

    FilePlan {
        package_name,
        tracer_type: rewrite_type("trace.Tracer", &[PackageReference::new(OTEL_TRACE_PATH, 0, 5)], chosen),
        codes_error: rewrite_type("codes.Error", &[PackageReference::new(OTEL_CODES_PATH, 0, 5)], chosen),
        imports: imports.imports(),
        wrappers,
    }
}

fn plan_method<'n, F>(identifiers: &IdentifierAllocator, method: &Method, chosen: &F) -> MethodPlan
where
    F: Fn(&str) -> Option<&'n str>,
{
    let mut method = method.clone();
    let span_name = identifiers.assign_method(&mut method);

    let fields = |tuples: &[Tuple]| -> Vec<FieldPlan> {
        tuples
            .iter()
            .map(|tuple| FieldPlan {
                name: tuple.name.clone(),
                type_text: rewrite_type(&tuple.type_text, &tuple.references, chosen),
                is_variadic: tuple.is_variadic,
            })
            .collect()
    };

    MethodPlan {
        ctx_name: method.params.first().map(|p| p.name.clone()).unwrap_or_default(),
        err_name: method
            .results
            .iter()
            .rev()
            .find(|r| r.role == Role::Error)
            .map(|r| r.name.clone()),
        params: fields(&method.params),
        results: fields(&method.results),
        name: method.name,
        span_name,
    }
}
