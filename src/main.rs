use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use conv_alter::alter::{AlterFlags, StrategyRegistry, tuning_log_path};
use conv_alter::diagnostics::render_diagnostic;
use conv_alter::ir::{LayoutTag, print_graph};
use conv_alter::request::{AlterRequest, RequestError};
use conv_alter::tuning::TuningLog;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:\n  conv-alter alter <request.json>\n  conv-alter check-layout <tag>\n  conv-alter version\n  conv-alter help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Alter,
    CheckLayout,
    Version,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandSpec {
    kind: CommandKind,
    argument: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match command.kind {
        CommandKind::Help => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        CommandKind::Version => {
            println!("conv-alter {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        CommandKind::CheckLayout => {
            let Some(tag) = command.argument.as_deref() else {
                eprintln!("Internal CLI error: missing layout tag");
                return ExitCode::from(2);
            };
            check_layout(tag)
        }
        CommandKind::Alter => {
            let Some(path) = command.argument.as_deref() else {
                eprintln!("Internal CLI error: missing request path");
                return ExitCode::from(2);
            };
            let source = match read_source(path) {
                Ok(source) => source,
                Err(message) => {
                    eprintln!("{message}");
                    return ExitCode::from(2);
                }
            };
            run_alter(&source)
        }
    }
}

fn check_layout(tag: &str) -> ExitCode {
    match tag.parse::<LayoutTag>() {
        Ok(layout) => {
            println!("Layout OK: {layout} (rank {})", layout.rank());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!(
                "{}",
                render_diagnostic("Layout error", &err.message, Some(tag), err.hint.as_deref())
            );
            ExitCode::from(1)
        }
    }
}

fn run_alter(source: &str) -> ExitCode {
    let request = match AlterRequest::from_json(source) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("{}", render_diagnostic("Request error", &err.to_string(), None, None));
            return ExitCode::from(1);
        }
    };

    let flags = AlterFlags::from_env();
    let log_path = tuning_log_path();
    let log = match TuningLog::load(&log_path) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("{}", render_diagnostic("Tuning log error", &err.to_string(), None, None));
            return ExitCode::from(1);
        }
    };

    let outcome = match request.run(&StrategyRegistry::with_defaults(), &log, flags) {
        Ok(outcome) => outcome,
        Err(err) => {
            let kind = match err {
                RequestError::Json(_) => "Request error",
                RequestError::Alter(_) => "Alter error",
            };
            eprintln!("{}", render_diagnostic(kind, &err.to_string(), None, None));
            return ExitCode::from(1);
        }
    };

    match &outcome.altered {
        Some(altered) => {
            println!("{}", print_graph(&outcome.graph));
            if let Some(workload) = &altered.workload {
                println!("registered: {}", workload.template);
            }
        }
        None => println!("no rewrite"),
    }

    if flags.persist_tuning {
        if let Err(err) = log.save(&log_path) {
            eprintln!("{}", render_diagnostic("Tuning log error", &err.to_string(), None, None));
            return ExitCode::from(1);
        }
        info!(path = %log_path.display(), records = log.len(), "tuning log saved");
    }
    ExitCode::SUCCESS
}

fn parse_command(args: &[String]) -> Result<CommandSpec, String> {
    if args.is_empty() {
        return Ok(CommandSpec {
            kind: CommandKind::Help,
            argument: None,
        });
    }

    let cmd = args[0].to_ascii_lowercase();
    match cmd.as_str() {
        "alter" => parse_single_argument(CommandKind::Alter, "request path", args),
        "check-layout" => parse_single_argument(CommandKind::CheckLayout, "layout tag", args),
        "version" | "-v" | "--version" => {
            if args.len() != 1 {
                return Err("'version' does not accept positional arguments".to_string());
            }
            Ok(CommandSpec {
                kind: CommandKind::Version,
                argument: None,
            })
        }
        "help" | "-h" | "--help" => {
            if args.len() != 1 {
                return Err("'help' does not accept positional arguments".to_string());
            }
            Ok(CommandSpec {
                kind: CommandKind::Help,
                argument: None,
            })
        }
        _ => Err(format!("Unknown command '{}'", args[0])),
    }
}

fn parse_single_argument(
    kind: CommandKind,
    what: &str,
    args: &[String],
) -> Result<CommandSpec, String> {
    if args.len() != 2 {
        return Err(format!("'{}' expects exactly one {what}", args[0]));
    }
    let argument = args[1].trim();
    if argument.is_empty() {
        return Err(format!("'{}' expects a non-empty {what}", args[0]));
    }
    Ok(CommandSpec {
        kind,
        argument: Some(argument.to_string()),
    })
}

fn read_source(path: &str) -> Result<String, String> {
    let p = Path::new(path);
    fs::read_to_string(p).map_err(|err| format!("Failed to read '{}': {}", p.display(), err))
}

#[cfg(test)]
mod tests {
    use super::{CommandKind, parse_command};

    #[test]
    fn parse_command_accepts_alter_with_file() {
        let args = vec!["alter".to_string(), "request.json".to_string()];
        let command = parse_command(&args).expect("command should parse");
        assert_eq!(command.kind, CommandKind::Alter);
        assert_eq!(command.argument.as_deref(), Some("request.json"));
    }

    #[test]
    fn parse_command_rejects_missing_argument() {
        let args = vec!["check-layout".to_string()];
        let err = parse_command(&args).expect_err("command should fail");
        assert!(err.contains("expects exactly one layout tag"));
    }

    #[test]
    fn parse_command_rejects_empty_argument() {
        let args = vec!["alter".to_string(), String::new()];
        let err = parse_command(&args).expect_err("empty path must fail");
        assert!(err.contains("non-empty request path"));
    }

    #[test]
    fn parse_command_defaults_to_help_when_empty() {
        let args = vec![];
        let command = parse_command(&args).expect("command should parse");
        assert_eq!(command.kind, CommandKind::Help);
        assert!(command.argument.is_none());
    }

    #[test]
    fn parse_command_rejects_unknown_command() {
        let args = vec!["run".to_string()];
        let err = parse_command(&args).expect_err("unknown command");
        assert!(err.contains("Unknown command 'run'"));
    }
}
