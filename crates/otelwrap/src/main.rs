use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use otelwrap_core::{
    check_in_another, command::dump_model, init_tracing, run_command, CommandArgs, Gofmt, SourceFormatter,
    SyntaxCheck,
};
use tracing::warn;

fn cli() -> Command {
    Command::new("otelwrap")
        .version(otelwrap_core::VERSION)
        .about("Generates OpenTelemetry tracing wrappers for Go interfaces")
        .arg(
            Arg::new("dir")
                .value_name("DIR")
                .help("Package directory, must be '.'")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("interfaces")
                .value_name("INTERFACE")
                .help("Interfaces to wrap, optionally all qualified as pkg.Name")
                .required(true)
                .num_args(1..)
                .index(2),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .value_name("FILE")
                .help("Output file name")
                .required_unless_present("dump-model"),
        )
        .arg(
            Arg::new("pkg")
                .long("pkg")
                .value_name("NAME")
                .help("Package name of the output when it lives in another directory"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-model")
                .long("dump-model")
                .help("Print the resolved interface model as JSON instead of generating code")
                .action(ArgAction::SetTrue),
        )
}

fn command_args(matches: &ArgMatches, out: Option<&Path>) -> Result<CommandArgs> {
    let dir = matches.get_one::<String>("dir").map(String::as_str).unwrap_or_default();
    if dir != "." {
        bail!("only support '.' as directory");
    }

    Ok(CommandArgs {
        dir: PathBuf::from(dir),
        src_file_name: std::env::var("GOFILE").unwrap_or_default(),
        interface_names: matches
            .get_many::<String>("interfaces")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        in_another: out.is_some_and(check_in_another),
        pkg_name: matches.get_one::<String>("pkg").filter(|name| !name.is_empty()).cloned(),
    })
}

fn formatter() -> Box<dyn SourceFormatter> {
    let gofmt = Gofmt::new();
    if gofmt.is_available() {
        Box::new(gofmt)
    } else {
        warn!("gofmt not found, writing generated code unformatted");
        Box::new(SyntaxCheck)
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let out = matches.get_one::<String>("out").map(PathBuf::from);
    let args = command_args(matches, out.as_deref())?;

    if matches.get_flag("dump-model") {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        dump_model(&mut handle, &args)?;
        handle.flush()?;
        return Ok(());
    }

    let Some(out) = out else {
        bail!("missing 'out' flag");
    };
    run_command(&args, &out, formatter().as_ref())?;
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_interfaces() {
        let matches = cli()
            .try_get_matches_from(["otelwrap", ".", "Repo", "Handler", "--out", "wrapped/repo.go", "--pkg", "wrapped"])
            .unwrap();
        let out = PathBuf::from("wrapped/repo.go");
        let args = command_args(&matches, Some(&out)).unwrap();

        assert_eq!(args.interface_names, vec!["Repo".to_string(), "Handler".to_string()]);
        assert!(args.in_another);
        assert_eq!(args.pkg_name.as_deref(), Some("wrapped"));
    }

    #[test]
    fn test_cli_rejects_other_directories() {
        let matches = cli()
            .try_get_matches_from(["otelwrap", "./sub", "Repo", "--out", "repo.go"])
            .unwrap();
        let err = command_args(&matches, Some(Path::new("repo.go"))).unwrap_err();
        assert_eq!(err.to_string(), "only support '.' as directory");
    }

    #[test]
    fn test_cli_requires_out_and_interfaces() {
        assert!(cli().try_get_matches_from(["otelwrap", ".", "Repo"]).is_err());
        assert!(cli().try_get_matches_from(["otelwrap", ".", "--out", "repo.go"]).is_err());
        assert!(cli()
            .try_get_matches_from(["otelwrap", ".", "Repo", "--dump-model"])
            .is_ok());
    }
}
