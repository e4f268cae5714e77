// Structural model of a resolved interface, shared by the resolver, the
// allocators and the source generator.

use serde::Serialize;

use crate::imports::ImportBinding;

/// Semantic role of a parameter or result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    None,
    /// `context.Context` from the standard `context` package
    Context,
    /// The builtin `error` type
    Error,
    /// Reserved for the span variable introduced by generated code
    Span,
}

/// A span of a type's literal text that names a package.
///
/// `begin == end` marks the position where a qualifier has to be inserted;
/// otherwise `begin..end` covers a qualifier that is replaced outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReference {
    pub path: String,
    pub begin: usize,
    pub end: usize,
}

impl PackageReference {
    pub fn new(path: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            path: path.into(),
            begin,
            end,
        }
    }

    /// Zero-width reference for an implicit same-package type.
    pub fn insertion(path: impl Into<String>, at: usize) -> Self {
        Self::new(path, at, at)
    }

    pub fn is_insertion(&self) -> bool {
        self.begin == self.end
    }
}

/// A parameter or result of a method
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tuple {
    pub name: String,
    /// Literal type text; variadic parameters are stored without `...`
    pub type_text: String,
    pub references: Vec<PackageReference>,
    pub is_variadic: bool,
    pub role: Role,
}

impl Tuple {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_reference(mut self, reference: PackageReference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    /// Unnamed or `_` fields get a generated name.
    pub fn has_placeholder_name(&self) -> bool {
        self.name.is_empty() || self.name == "_"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Tuple>,
    pub results: Vec<Tuple>,
}

impl Method {
    /// Only methods taking a leading `context.Context` are wrapped.
    pub fn is_traceable(&self) -> bool {
        self.params.first().is_some_and(|p| p.role == Role::Context)
    }

    pub fn returns_error(&self) -> bool {
        self.results.iter().any(|r| r.role == Role::Error)
    }
}

/// Type parameters of a generic interface declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TypeParams {
    /// Declaration text without brackets, e.g. `K comparable, V any`
    pub text: String,
    pub references: Vec<PackageReference>,
    pub names: Vec<String>,
}

/// A flattened interface: embedded interfaces contribute their methods
/// directly, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InterfaceModel {
    pub name: String,
    pub type_params: Option<TypeParams>,
    pub methods: Vec<Method>,
}

/// Everything the generator needs for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PackageTypeInfo {
    pub name: String,
    pub path: String,
    pub imports: Vec<ImportBinding>,
    pub interfaces: Vec<InterfaceModel>,
}
