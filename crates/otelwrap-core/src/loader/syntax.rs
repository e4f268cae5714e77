// Go source syntax extraction using tree-sitter-go.
// Only the parts needed for interface resolution are kept: the package
// clause, imports and top-level type declarations.

use tracing::warn;

use crate::errors::{GenerateError, Result};
use crate::imports::default_package_name;

/// The declarations of one Go source file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub name: String,
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name, including `.` and `_`
    pub name: Option<String>,
    pub path: String,
}

impl ImportSpec {
    /// Name the import is referenced by; dot and blank imports have none.
    pub fn used_name(&self) -> Option<String> {
        match self.name.as_deref() {
            Some(".") | Some("_") => None,
            Some(name) => Some(name.to_string()),
            None => Some(default_package_name(&self.path)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Option<TypeParamList>,
    pub body: TypeBody,
    /// Declared with `=`
    pub is_alias: bool,
}

#[derive(Debug, Clone)]
pub struct TypeParamList {
    /// Text between the brackets
    pub expr: TypeExpr,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum TypeBody {
    Interface(Vec<InterfaceMember>),
    /// `type A = B`, `type A pkg.B` and friends
    Named(NamedType),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum InterfaceMember {
    Method(MethodDecl),
    Embedded(NamedType),
    /// Type-set element or generic embed, not expanded
    Constraint(String),
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<FieldDecl>,
    pub results: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub is_variadic: bool,
}

/// A type expression with the identifiers used inside it
#[derive(Debug, Clone, Default)]
pub struct TypeExpr {
    pub text: String,
    pub idents: Vec<TypeIdent>,
    /// Set when the whole expression is a single named type
    pub head: Option<NamedType>,
}

/// Identifier use inside a type expression, offsets relative to its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeIdent {
    /// `qualifier.name`; `begin..end` covers the qualifier
    Qualified {
        qualifier: String,
        name: String,
        begin: usize,
        end: usize,
    },
    Local { name: String, begin: usize },
}

/// Thin wrapper over a tree-sitter parser configured for Go
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GenerateError::Grammar(e.to_string()))?;

        Ok(Self { parser })
    }

    fn parse_tree(&mut self, name: &str, source: &str) -> Result<tree_sitter::Tree> {
        self.parser.parse(source, None).ok_or_else(|| GenerateError::Syntax {
            message: format!("parser gave up on '{name}'"),
        })
    }

    pub fn parse_file(&mut self, name: &str, source: &str) -> Result<ParsedFile> {
        let tree = self.parse_tree(name, source)?;
        let root = tree.root_node();
        if root.has_error() {
            warn!(file = name, "Go source has syntax errors, continuing with partial tree");
        }

        let mut file = ParsedFile {
            name: name.to_string(),
            ..Default::default()
        };

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(ident) = named_children(child).into_iter().next() {
                        file.package_name = node_text(ident, source).to_string();
                    }
                }
                "import_declaration" => collect_imports(child, source, &mut file.imports),
                "type_declaration" => {
                    for spec in named_children(child) {
                        if matches!(spec.kind(), "type_spec" | "type_alias") {
                            if let Some(decl) = convert_type_spec(spec, source) {
                                file.types.push(decl);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(file)
    }

    /// Describes the first syntax error in `source`, if any.
    pub fn syntax_error(&mut self, source: &str) -> Result<Option<String>> {
        let tree = self.parse_tree("<generated>", source)?;
        let root = tree.root_node();
        if !root.has_error() {
            return Ok(None);
        }

        let node = first_error(root).unwrap_or(root);
        let position = node.start_position();
        let what = if node.is_missing() {
            format!("missing '{}'", node.kind())
        } else {
            format!("unexpected '{}'", truncate(node_text(node, source), 40))
        };
        Ok(Some(format!("{}:{}: {what}", position.row + 1, position.column + 1)))
    }
}

fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn node_text<'a>(node: tree_sitter::Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn named_children(node: tree_sitter::Node) -> Vec<tree_sitter::Node> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

fn field_children<'t>(node: tree_sitter::Node<'t>, field: &str) -> Vec<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

fn collect_imports(node: tree_sitter::Node, source: &str, imports: &mut Vec<ImportSpec>) {
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => {
                let Some(path) = child.child_by_field_name("path") else {
                    continue;
                };
                let path = node_text(path, source).trim_matches(|c| c == '"' || c == '`');
                imports.push(ImportSpec {
                    name: child
                        .child_by_field_name("name")
                        .map(|name| node_text(name, source).to_string()),
                    path: path.to_string(),
                });
            }
            "import_spec_list" => collect_imports(child, source, imports),
            _ => {}
        }
    }
}

fn convert_type_spec(node: tree_sitter::Node, source: &str) -> Option<TypeDecl> {
    let name = node_text(node.child_by_field_name("name")?, source).to_string();
    let ty = node.child_by_field_name("type")?;

    let type_params = node
        .child_by_field_name("type_parameters")
        .map(|list| convert_type_params(list, source));

    let body = match ty.kind() {
        "interface_type" => TypeBody::Interface(convert_interface(ty, source)),
        _ => match named_type(ty, source) {
            Some(target) => TypeBody::Named(target),
            None => TypeBody::Other,
        },
    };

    Some(TypeDecl {
        name,
        type_params,
        body,
        is_alias: node.kind() == "type_alias",
    })
}

fn convert_type_params(list: tree_sitter::Node, source: &str) -> TypeParamList {
    let names = named_children(list)
        .into_iter()
        .flat_map(|decl| field_children(decl, "name"))
        .map(|name| node_text(name, source).to_string())
        .collect();

    // Strip the brackets; offsets stay relative to the byte after `[`.
    let begin = list.start_byte() + 1;
    let end = list.end_byte().saturating_sub(1).max(begin);
    let text = source[begin..end].trim_end().trim_end_matches(',').trim_end();

    let mut idents = Vec::new();
    collect_idents(list, source, begin, &mut idents);

    TypeParamList {
        expr: TypeExpr {
            text: text.to_string(),
            idents,
            head: None,
        },
        names,
    }
}

fn named_type(node: tree_sitter::Node, source: &str) -> Option<NamedType> {
    match node.kind() {
        "type_identifier" => Some(NamedType {
            qualifier: None,
            name: node_text(node, source).to_string(),
        }),
        "qualified_type" => Some(NamedType {
            qualifier: Some(node_text(node.child_by_field_name("package")?, source).to_string()),
            name: node_text(node.child_by_field_name("name")?, source).to_string(),
        }),
        _ => None,
    }
}

fn convert_interface(node: tree_sitter::Node, source: &str) -> Vec<InterfaceMember> {
    let mut members = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "method_elem" | "method_spec" => {
                if let Some(method) = convert_method(child, source) {
                    members.push(InterfaceMember::Method(method));
                }
            }
            "type_elem" | "constraint_elem" | "interface_type_name" => {
                let parts = named_children(child);
                let embedded = match parts.as_slice() {
                    [single] => named_type(*single, source),
                    [] => named_type(child, source),
                    _ => None,
                };
                members.push(match embedded {
                    Some(target) => InterfaceMember::Embedded(target),
                    None => InterfaceMember::Constraint(node_text(child, source).to_string()),
                });
            }
            "type_identifier" | "qualified_type" => {
                if let Some(target) = named_type(child, source) {
                    members.push(InterfaceMember::Embedded(target));
                }
            }
            _ => members.push(InterfaceMember::Constraint(node_text(child, source).to_string())),
        }
    }
    members
}

fn convert_method(node: tree_sitter::Node, source: &str) -> Option<MethodDecl> {
    let name = node_text(node.child_by_field_name("name")?, source).to_string();
    let params = node
        .child_by_field_name("parameters")
        .map(|list| convert_parameter_list(list, source))
        .unwrap_or_default();

    let results = match node.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => convert_parameter_list(result, source),
        Some(result) => vec![FieldDecl {
            names: Vec::new(),
            ty: type_expr(result, source),
            is_variadic: false,
        }],
        None => Vec::new(),
    };

    Some(MethodDecl {
        name,
        params,
        results,
    })
}

fn convert_parameter_list(node: tree_sitter::Node, source: &str) -> Vec<FieldDecl> {
    let mut fields = Vec::new();
    for child in named_children(node) {
        let is_variadic = match child.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };
        let Some(ty) = child.child_by_field_name("type") else {
            continue;
        };
        fields.push(FieldDecl {
            names: field_children(child, "name")
                .into_iter()
                .map(|name| node_text(name, source).to_string())
                .collect(),
            ty: type_expr(ty, source),
            is_variadic,
        });
    }
    fields
}

fn type_expr(node: tree_sitter::Node, source: &str) -> TypeExpr {
    let mut idents = Vec::new();
    collect_idents(node, source, node.start_byte(), &mut idents);

    TypeExpr {
        text: node_text(node, source).to_string(),
        idents,
        head: named_type(node, source),
    }
}

fn collect_idents(node: tree_sitter::Node, source: &str, base: usize, out: &mut Vec<TypeIdent>) {
    match node.kind() {
        "qualified_type" => {
            if let (Some(package), Some(name)) =
                (node.child_by_field_name("package"), node.child_by_field_name("name"))
            {
                out.push(TypeIdent::Qualified {
                    qualifier: node_text(package, source).to_string(),
                    name: node_text(name, source).to_string(),
                    begin: package.start_byte() - base,
                    end: package.end_byte() - base,
                });
            }
        }
        "type_identifier" => out.push(TypeIdent::Local {
            name: node_text(node, source).to_string(),
            begin: node.start_byte() - base,
        }),
        _ => {
            for child in named_children(node) {
                collect_idents(child, source, base, out);
            }
        }
    }
}
