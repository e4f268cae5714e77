// Type-expression models: literal type text plus package reference spans,
// and the single-pass rewriter that applies chosen import names to them.

use tracing::trace;

use crate::imports::ImportCollector;
use crate::loader::syntax::{FieldDecl, MethodDecl, NamedType, TypeBody, TypeExpr};
use crate::loader::{IdentUse, LoadedPackage, ParsedFile, TypeIdent};
use crate::model::{Method, PackageReference, Role, Tuple};

/// Alias chains longer than this are treated as plain types
const MAX_ALIAS_DEPTH: usize = 8;

/// Scope in which the type expressions of one declaration are resolved
pub struct TypeContext<'a> {
    package: &'a LoadedPackage,
    file: &'a ParsedFile,
    type_params: &'a [String],
}

impl<'a> TypeContext<'a> {
    pub fn new(package: &'a LoadedPackage, file: &'a ParsedFile, type_params: &'a [String]) -> Self {
        Self {
            package,
            file,
            type_params,
        }
    }

    pub fn method(&self, decl: &MethodDecl, imports: &mut ImportCollector) -> Method {
        Method {
            name: decl.name.clone(),
            params: self.tuples(&decl.params, imports),
            results: self.tuples(&decl.results, imports),
        }
    }

    /// One tuple per declared name; an unnamed field yields one unnamed tuple.
    pub fn tuples(&self, fields: &[FieldDecl], imports: &mut ImportCollector) -> Vec<Tuple> {
        let mut tuples = Vec::new();
        for field in fields {
            let template = Tuple {
                name: String::new(),
                type_text: field.ty.text.clone(),
                references: self.references(&field.ty, imports),
                is_variadic: field.is_variadic,
                role: self.role(&field.ty),
            };

            if field.names.is_empty() {
                tuples.push(template);
                continue;
            }
            for name in &field.names {
                tuples.push(Tuple {
                    name: name.clone(),
                    ..template.clone()
                });
            }
        }
        tuples
    }

    /// Package references of `expr`, recording each referenced package.
    pub fn references(&self, expr: &TypeExpr, imports: &mut ImportCollector) -> Vec<PackageReference> {
        let mut references = Vec::new();
        for ident in &expr.idents {
            match (ident, self.package.resolve_ident(self.file, self.type_params, ident)) {
                (TypeIdent::Qualified { qualifier, begin, end, .. }, IdentUse::Package { path }) => {
                    imports.record(path, qualifier);
                    references.push(PackageReference::new(path, *begin, *end));
                }
                (TypeIdent::Local { begin, .. }, IdentUse::Type { path }) => {
                    imports.record(path, &self.package.name);
                    references.push(PackageReference::insertion(path, *begin));
                }
                (_, IdentUse::Unresolved) => {
                    trace!(file = %self.file.name, ident = ?ident, "unresolved identifier in type");
                }
                _ => {}
            }
        }
        references
    }

    fn role(&self, expr: &TypeExpr) -> Role {
        match &expr.head {
            Some(head) if !(head.qualifier.is_none() && self.type_params.contains(&head.name)) => {
                self.named_role(self.file, head, 0)
            }
            _ => Role::None,
        }
    }

    /// Role of a named type, following aliases declared in this package.
    fn named_role(&self, file: &ParsedFile, head: &NamedType, depth: usize) -> Role {
        match (&head.qualifier, head.name.as_str()) {
            (Some(qualifier), "Context") if self.package.resolve_qualifier(file, qualifier) == Some("context") => {
                Role::Context
            }
            (Some(_), _) => Role::None,
            (None, name) => match self.package.type_decl(name) {
                None if name == "error" => Role::Error,
                Some(found) if found.decl.is_alias && depth < MAX_ALIAS_DEPTH => match &found.decl.body {
                    TypeBody::Named(target) => self.named_role(found.file, target, depth + 1),
                    _ => Role::None,
                },
                _ => Role::None,
            },
        }
    }
}

/// Applies chosen package names to `text` in a single left-to-right pass.
///
/// Zero-width references get `name.` inserted; other references have their
/// qualifier replaced. A path without a chosen name is written unqualified,
/// so a replaced qualifier loses its `.` as well.
pub fn rewrite_type<'n, F>(text: &str, references: &[PackageReference], chosen: F) -> String
where
    F: Fn(&str) -> Option<&'n str>,
{
    let mut out = String::with_capacity(text.len() + 8 * references.len());
    let mut offset = 0;

    for reference in references {
        if reference.begin < offset || reference.end > text.len() {
            continue;
        }
        out.push_str(&text[offset..reference.begin]);
        match (chosen(&reference.path), reference.is_insertion()) {
            (Some(name), true) => {
                out.push_str(name);
                out.push('.');
                offset = reference.end;
            }
            (Some(name), false) => {
                out.push_str(name);
                offset = reference.end;
            }
            (None, true) => offset = reference.end,
            (None, false) => {
                offset = reference.end;
                if text[offset..].starts_with('.') {
                    offset += 1;
                }
            }
        }
    }

    out.push_str(&text[offset..]);
    out
}
