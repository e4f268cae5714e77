/*!
# Command Layer

Turns a `go generate` style invocation into generated code: picks the
package to load from the request, resolves `pkg.Name` qualifiers through
the imports of the originating file and writes the formatted result.
*/

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{GenerateError, Result};
use crate::format::SourceFormatter;
use crate::generate::{generate_code, load_package_type_data, GenerateConfig};
use crate::loader::{DirectorySource, GoParser, PackageCache};
use crate::model::PackageTypeInfo;

/// First line of every generated file
pub const HEADER: &str = "// Code generated by otelwrap; DO NOT EDIT.\n";

/// One invocation of the generator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Directory of the package holding the originating file
    pub dir: PathBuf,
    /// Originating file, used to resolve `pkg.Name` requests
    pub src_file_name: String,
    pub interface_names: Vec<String>,
    /// Output goes to a different package than `dir`
    pub in_another: bool,
    /// Package clause of the output when `in_another` is set
    pub pkg_name: Option<String>,
}

/// Package found through an import of the originating file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindResult {
    pub src_pkg_name: String,
    pub dest_pkg_path: String,
}

/// Splits a shared `pkg.` qualifier off the requested names.
///
/// Either every name is unqualified, or every name carries the same qualifier.
pub fn split_package_name(names: &[String]) -> Result<(Option<String>, Vec<String>)> {
    let Some(first) = names.first() else {
        return Err(GenerateError::MissingInterfaceNames);
    };

    let Some((qualifier, _)) = first.split_once('.') else {
        if names.iter().any(|name| name.contains('.')) {
            return Err(GenerateError::MixedInterfaceQualifier);
        }
        return Ok((None, names.to_vec()));
    };

    let mut result = Vec::with_capacity(names.len());
    for name in names {
        match name.split_once('.') {
            Some((q, rest)) if q == qualifier && !rest.is_empty() && !rest.contains('.') => {
                result.push(rest.to_string());
            }
            _ => return Err(GenerateError::MixedInterfaceQualifier),
        }
    }
    Ok((Some(qualifier.to_string()), result))
}

/// Finds the import of `file` whose used name is `qualifier`.
pub fn find_package(file: &Path, qualifier: &str) -> Result<FindResult> {
    let text = fs::read_to_string(file)?;
    let parsed = GoParser::new()?.parse_file(&file.to_string_lossy(), &text)?;

    parsed
        .imports
        .iter()
        .find(|spec| spec.used_name().as_deref() == Some(qualifier))
        .map(|spec| FindResult {
            src_pkg_name: parsed.package_name.clone(),
            dest_pkg_path: spec.path.clone(),
        })
        .ok_or_else(|| GenerateError::QualifierNotImported {
            qualifier: qualifier.to_string(),
            file: file.to_path_buf(),
        })
}

/// Resolves the request into the model and the output configuration.
pub fn resolve_request(args: &CommandArgs) -> Result<(PackageTypeInfo, GenerateConfig)> {
    let (qualifier, names) = split_package_name(&args.interface_names)?;
    let source = DirectorySource::discover(&args.dir)?;

    let (path, config) = match qualifier {
        None => {
            let path = source.import_path_for_dir(&args.dir)?;
            let config = if args.in_another {
                GenerateConfig::in_another_package(args.pkg_name.clone())
            } else {
                GenerateConfig::default()
            };
            (path, config)
        }
        Some(qualifier) => {
            let found = find_package(&args.dir.join(&args.src_file_name), &qualifier)?;
            debug!(qualifier = %qualifier, path = %found.dest_pkg_path, "interfaces come from an imported package");
            (found.dest_pkg_path, GenerateConfig::in_another_package(Some(found.src_pkg_name)))
        }
    };

    let mut cache = PackageCache::new(source)?;
    let info = load_package_type_data(&mut cache, &path, &names)?;
    debug!(package = %info.path, packages_loaded = cache.load_count(), "request resolved");
    Ok((info, config))
}

pub fn find_and_generate<W: Write>(writer: &mut W, args: &CommandArgs) -> Result<()> {
    let (info, config) = resolve_request(args)?;
    generate_code(writer, &info, &config)
}

/// Writes the resolved model as pretty JSON instead of generating code.
pub fn dump_model<W: Write>(writer: &mut W, args: &CommandArgs) -> Result<()> {
    let (info, _) = resolve_request(args)?;
    serde_json::to_writer_pretty(&mut *writer, &info)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Generates, formats and writes `out_file`; the file is left untouched on
/// any failure.
pub fn run_command(args: &CommandArgs, out_file: &Path, formatter: &dyn SourceFormatter) -> Result<()> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(HEADER.as_bytes());
    buffer.push(b'\n');
    find_and_generate(&mut buffer, args)?;

    let source = String::from_utf8_lossy(&buffer);
    let formatted = formatter.format(&source)?;

    fs::write(out_file, formatted)?;
    info!(out = %out_file.display(), "generated wrapper");
    Ok(())
}

/// True when `out_file` lives outside the current directory.
pub fn check_in_another(out_file: &Path) -> bool {
    match out_file.parent() {
        None => false,
        Some(dir) => !(dir.as_os_str().is_empty() || dir == Path::new(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SyntaxCheck;
    use tempfile::TempDir;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn module() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("app.go"),
            "package app\n\nimport (\n\t\"context\"\n\tsvc \"example.com/app/service\"\n)\n\nvar _ svc.Repo\n\ntype Repo interface {\n\tUpdate(ctx context.Context, id int) error\n}\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("service")).unwrap();
        fs::write(
            dir.path().join("service").join("repo.go"),
            "package service\n\nimport \"context\"\n\ntype Repo interface {\n\tFind(ctx context.Context, id int) (string, error)\n}\n",
        )
        .unwrap();
        dir
    }

    fn args(dir: &Path, interface_names: &[&str]) -> CommandArgs {
        CommandArgs {
            dir: dir.to_path_buf(),
            src_file_name: "app.go".to_string(),
            interface_names: names(interface_names),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_unqualified_names() {
        let (qualifier, result) = split_package_name(&names(&["Repo", "Handler"])).unwrap();
        assert_eq!(qualifier, None);
        assert_eq!(result, names(&["Repo", "Handler"]));
    }

    #[test]
    fn test_split_qualified_names() {
        let (qualifier, result) = split_package_name(&names(&["hello.Repo", "hello.Handler"])).unwrap();
        assert_eq!(qualifier.as_deref(), Some("hello"));
        assert_eq!(result, names(&["Repo", "Handler"]));
    }

    #[test]
    fn test_split_mixed_names() {
        let requests: [&[&str]; 4] = [
            &["Repo", "hello.Handler"],
            &["hello.Repo", "Handler"],
            &["hello.Repo", "other.Handler"],
            &["hello.Repo", "hello.inner.Handler"],
        ];
        for request in requests {
            assert!(matches!(
                split_package_name(&names(request)),
                Err(GenerateError::MixedInterfaceQualifier)
            ));
        }
        assert!(matches!(split_package_name(&[]), Err(GenerateError::MissingInterfaceNames)));
    }

    #[test]
    fn test_find_package_by_alias() {
        let dir = module();
        let found = find_package(&dir.path().join("app.go"), "svc").unwrap();
        assert_eq!(
            found,
            FindResult {
                src_pkg_name: "app".to_string(),
                dest_pkg_path: "example.com/app/service".to_string(),
            }
        );

        let err = find_package(&dir.path().join("app.go"), "service").unwrap_err();
        assert!(matches!(err, GenerateError::QualifierNotImported { ref qualifier, .. } if qualifier == "service"));
    }

    #[test]
    fn test_generate_same_package() {
        let dir = module();
        let mut out = Vec::new();
        find_and_generate(&mut out, &args(dir.path(), &["Repo"])).unwrap();

        let generated = String::from_utf8(out).unwrap();
        assert!(generated.starts_with("package app\n"));
        assert!(generated.contains("func (w *RepoWrapper) Update(ctx context.Context, id int) (err error) {"));
    }

    #[test]
    fn test_generate_from_imported_package() {
        let dir = module();
        let mut out = Vec::new();
        find_and_generate(&mut out, &args(dir.path(), &["svc.Repo"])).unwrap();

        let generated = String::from_utf8(out).unwrap();
        assert!(generated.starts_with("package app\n\nimport (\n\t\"example.com/app/service\"\n"));
        assert!(generated.contains("\tservice.Repo\n"));
        assert!(generated.contains("func (w *RepoWrapper) Find(ctx context.Context, id int) (a string, err error) {"));
    }

    #[test]
    fn test_generate_in_another_package_with_name() {
        let dir = module();
        let mut request = args(dir.path(), &["Repo"]);
        request.in_another = true;
        request.pkg_name = Some("appwrap".to_string());

        let mut out = Vec::new();
        find_and_generate(&mut out, &request).unwrap();
        let generated = String::from_utf8(out).unwrap();
        assert!(generated.starts_with("package appwrap\n\nimport (\n\t\"example.com/app\"\n"));
        assert!(generated.contains("\tapp.Repo\n"));
    }

    #[test]
    fn test_run_command_writes_header() {
        let dir = module();
        let out_file = dir.path().join("repo_wrapper.go");
        run_command(&args(dir.path(), &["Repo"]), &out_file, &SyntaxCheck).unwrap();

        let written = fs::read_to_string(&out_file).unwrap();
        assert!(written.starts_with("// Code generated by otelwrap; DO NOT EDIT.\n\npackage app\n"));
    }

    #[test]
    fn test_run_command_failure_writes_nothing() {
        let dir = module();
        let out_file = dir.path().join("missing_wrapper.go");
        let err = run_command(&args(dir.path(), &["Missing"]), &out_file, &SyntaxCheck).unwrap_err();

        assert!(matches!(err, GenerateError::DeclarationNotFound { .. }));
        assert!(!out_file.exists());
    }

    #[test]
    fn test_dump_model() {
        let dir = module();
        let mut out = Vec::new();
        dump_model(&mut out, &args(dir.path(), &["Repo"])).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["name"], "app");
        assert_eq!(value["interfaces"][0]["methods"][0]["name"], "Update");
        assert_eq!(value["interfaces"][0]["methods"][0]["params"][0]["role"], "context");
    }

    #[test]
    fn test_check_in_another() {
        assert!(!check_in_another(Path::new("wrapper.go")));
        assert!(!check_in_another(Path::new("./wrapper.go")));
        assert!(check_in_another(Path::new("wrapped/wrapper.go")));
        assert!(check_in_another(Path::new("../wrapper.go")));
    }
}
