mod debug_report;

use opguard::{ClassificationCache, Options, TypeClassifier, Verb, default_classifier};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "OPGUARD_LOG";

fn main() {
    init_logging();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let classifier = match load_classifier(config.rules.as_ref()) {
        Ok(classifier) => classifier,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let cache = ClassificationCache::new(Arc::clone(&classifier), &Options::default());
    let metrics = cache.rebuild(&config.identities);

    let report = debug_report::Report { classifier: &classifier, cache: &cache, metrics, verbs: &config.verbs };
    report.print(&config.identities, config.color);
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer().with_writer(io::stderr)).init();
}

fn load_classifier(rules: Option<&PathBuf>) -> Result<Arc<TypeClassifier>, String> {
    match rules {
        Some(path) => TypeClassifier::from_path(path)
            .map(Arc::new)
            .map_err(|err| format!("failed to load rules from {}: {err}", path.display())),
        None => default_classifier().map_err(|err| format!("built-in rules are invalid: {err}")),
    }
}

struct CliConfig {
    identities: Vec<String>,
    rules: Option<PathBuf>,
    verbs: Vec<Verb>,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut identities = Vec::new();
    let mut rules: Option<PathBuf> = None;
    let mut verbs = Vec::new();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("opguard {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--rules" | "-r" => {
                let value = args.next().ok_or_else(|| "error: --rules expects a path".to_string())?;
                set_rules(&mut rules, value)?;
            }
            "--verb" => {
                let value = args.next().ok_or_else(|| "error: --verb expects a value".to_string())?;
                verbs.push(parse_verb(&value)?);
            }
            "--" => {
                identities.extend(args.by_ref());
                break;
            }
            _ if arg.starts_with("--rules=") => {
                set_rules(&mut rules, arg.trim_start_matches("--rules=").to_string())?;
            }
            _ if arg.starts_with("--verb=") => {
                verbs.push(parse_verb(arg.trim_start_matches("--verb="))?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => identities.push(arg),
        }
    }

    if identities.is_empty() {
        identities = read_stdin_identities()?;
    }
    if identities.is_empty() {
        return Err(format!("error: no identities provided\n\n{}", help_text()));
    }
    if verbs.is_empty() {
        verbs = Verb::ALL.to_vec();
    }

    Ok(CliConfig { identities, rules, verbs, color })
}

fn set_rules(rules: &mut Option<PathBuf>, value: String) -> Result<(), String> {
    if rules.is_some() {
        return Err("error: --rules provided multiple times".to_string());
    }
    *rules = Some(PathBuf::from(value));
    Ok(())
}

fn parse_verb(value: &str) -> Result<Verb, String> {
    value.parse().map_err(|err| format!("error: {err}"))
}

fn read_stdin_identities() -> Result<Vec<String>, String> {
    if io::stdin().is_terminal() {
        return Ok(Vec::new());
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer.split_whitespace().map(str::to_string).collect())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    let verbs = Verb::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ");
    format!(
        "opguard {version}

Classify engine identities and show the operation each interaction maps to.

Usage:
  opguard [OPTIONS] [--] <identity...>
  <identities on stdin> | opguard [OPTIONS]

Options:
  -r, --rules <file>         YAML classification rules. Default: built-in rules.
  --verb <verb>              Only show this verb (repeatable). One of:
                             {verbs}
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}                Log filter (tracing directives). Default: warn

Exit codes:
  0  Success.
  1  Rules could not be loaded.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
