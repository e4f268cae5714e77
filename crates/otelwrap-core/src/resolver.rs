//! Interface resolution.
//!
//! Walks a named interface through type aliases, defined types and embedded
//! interfaces, possibly across packages, and flattens the result into an
//! [`InterfaceModel`]. Every package referenced by a method signature is
//! recorded in the shared [`ImportCollector`].

use std::rc::Rc;

use tracing::debug;

use crate::errors::{GenerateError, Result};
use crate::imports::ImportCollector;
use crate::loader::syntax::{InterfaceMember, NamedType, TypeBody};
use crate::loader::{LoadedPackage, PackageCache, PackageSource, ParsedFile};
use crate::model::{InterfaceModel, Method, Tuple, TypeParams};
use crate::types::TypeContext;

pub struct InterfaceResolver<'c, S> {
    cache: &'c mut PackageCache<S>,
    imports: &'c mut ImportCollector,
}

impl<'c, S: PackageSource> InterfaceResolver<'c, S> {
    pub fn new(cache: &'c mut PackageCache<S>, imports: &'c mut ImportCollector) -> Self {
        Self { cache, imports }
    }

    /// Resolves the interface `name` declared in the package at `package_path`.
    pub fn resolve(&mut self, package_path: &str, name: &str) -> Result<InterfaceModel> {
        let package = self.cache.load(package_path, &[name])?;

        let mut methods = Vec::new();
        let type_params = self.expand(package, name, &mut methods)?;
        debug!(interface = name, methods = methods.len(), "resolved interface");

        Ok(InterfaceModel {
            name: name.to_string(),
            type_params,
            methods,
        })
    }

    fn expand(&mut self, package: Rc<LoadedPackage>, name: &str, methods: &mut Vec<Method>) -> Result<Option<TypeParams>> {
        let decl_ref = package.type_decl(name).ok_or_else(|| GenerateError::DeclarationNotFound {
            name: name.to_string(),
            package: package.path.clone(),
        })?;
        let (file, decl) = (decl_ref.file, decl_ref.decl);

        match &decl.body {
            TypeBody::Interface(members) => {
                let param_names = decl.type_params.as_ref().map(|p| p.names.clone()).unwrap_or_default();
                let context = TypeContext::new(&package, file, &param_names);

                let type_params = decl.type_params.as_ref().map(|params| TypeParams {
                    text: params.expr.text.clone(),
                    references: context.references(&params.expr, self.imports),
                    names: params.names.clone(),
                });

                for member in members {
                    match member {
                        InterfaceMember::Embedded(target) => self.expand_embedded(&package, file, target, methods)?,
                        InterfaceMember::Constraint(text) => {
                            debug!(interface = name, element = %text, "skipping non-interface element")
                        }
                        InterfaceMember::Method(_) => {}
                    }
                }
                for member in members {
                    if let InterfaceMember::Method(method) = member {
                        methods.push(context.method(method, self.imports));
                    }
                }
                Ok(type_params)
            }
            TypeBody::Named(target) => {
                debug!(name, target = ?target, "following type declaration");
                let Some(target_package) = self.target_package(&package, file, target)? else {
                    return Err(GenerateError::NotAnInterface {
                        name: name.to_string(),
                    });
                };
                // Report the name as written, not the end of the chain.
                self.expand(target_package, &target.name, methods).map_err(|e| match e {
                    GenerateError::NotAnInterface { .. } => GenerateError::NotAnInterface {
                        name: name.to_string(),
                    },
                    other => other,
                })
            }
            TypeBody::Other => Err(GenerateError::NotAnInterface {
                name: name.to_string(),
            }),
        }
    }

    fn expand_embedded(
        &mut self,
        package: &Rc<LoadedPackage>,
        file: &ParsedFile,
        target: &NamedType,
        methods: &mut Vec<Method>,
    ) -> Result<()> {
        if target.qualifier.is_none() && target.name == "error" && !package.declares("error") {
            methods.push(Method {
                name: "Error".to_string(),
                params: Vec::new(),
                results: vec![Tuple::new("", "string")],
            });
            return Ok(());
        }

        let Some(target_package) = self.target_package(package, file, target)? else {
            return Err(GenerateError::InterfaceNotFound {
                name: target.name.clone(),
                package: package.path.clone(),
            });
        };
        self.expand(target_package, &target.name, methods)
            .map(|_| ())
            .map_err(GenerateError::into_interface_not_found)
    }

    /// Package declaring `target`, loaded and checked for the name.
    ///
    /// `None` means an unqualified name that the package does not declare,
    /// such as a builtin type.
    fn target_package(
        &mut self,
        package: &Rc<LoadedPackage>,
        file: &ParsedFile,
        target: &NamedType,
    ) -> Result<Option<Rc<LoadedPackage>>> {
        let Some(qualifier) = &target.qualifier else {
            return Ok(package.declares(&target.name).then(|| Rc::clone(package)));
        };

        let path = package
            .resolve_qualifier(file, qualifier)
            .ok_or_else(|| GenerateError::InterfaceNotFound {
                name: format!("{qualifier}.{}", target.name),
                package: package.path.clone(),
            })?
            .to_string();

        self.cache
            .load(&path, &[target.name.as_str()])
            .map(Some)
            .map_err(GenerateError::into_interface_not_found)
    }
}
