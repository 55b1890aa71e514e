//! Gridbase - Computed field engine command line

mod batch;
mod config;
mod error;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use gridbase_core::ComputeOptions;
use gridbase_engine::engine::format_value;
use gridbase_engine::{FormulaError, Value};

use crate::batch::BatchArgs;
use crate::config::Config;
use crate::error::CliError;

fn print_usage() {
    eprintln!("Usage: gridbase -c <EXPR> [--field <NAME=JSON>]...");
    eprintln!("       gridbase --fields <FILE> --records <FILE> [--linked <FILE>] [-o <FILE>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <EXPR>      Evaluate one formula and print the result");
    eprintln!("  --field <NAME=JSON>       Field value for -c (can be repeated)");
    eprintln!("  --fields <FILE>           Field catalog (JSON array)");
    eprintln!("  --records <FILE>          Records to compute (JSON array)");
    eprintln!("  --linked <FILE>           Records that lookups and rollups link to");
    eprintln!("  -o, --output <FILE>       Write computed records to a file");
    eprintln!("  --config <FILE>           Load config from this file");
    eprintln!("  --no-config               Skip the default config.toml");
    eprintln!("  -h, --help                Print help");
}

#[derive(Default)]
struct Args {
    command: Option<String>,
    field_values: Vec<(String, Value)>,
    fields: Option<PathBuf>,
    records: Option<PathBuf>,
    linked: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    no_config: bool,
}

/// `NAME=JSON`. Values that are not valid JSON are taken as text.
fn parse_field_value(arg: &str) -> Result<(String, Value), CliError> {
    let Some((name, raw)) = arg.split_once('=') else {
        return Err(CliError::Usage(format!(
            "--field expects NAME=VALUE, got {arg:?}"
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::Usage(format!("--field has an empty name: {arg:?}")));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

fn parse_args(args: &[String]) -> Result<Option<Args>, CliError> {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| CliError::Usage(format!("{flag} requires a value")))
        };
        match flag {
            "-h" | "--help" => return Ok(None),
            "-c" | "--command" => parsed.command = Some(value()?),
            "--field" => {
                let field = parse_field_value(&value()?)?;
                parsed.field_values.push(field);
            }
            "--fields" => parsed.fields = Some(PathBuf::from(value()?)),
            "--records" => parsed.records = Some(PathBuf::from(value()?)),
            "--linked" => parsed.linked = Some(PathBuf::from(value()?)),
            "-o" | "--output" => parsed.output = Some(PathBuf::from(value()?)),
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--no-config" => parsed.no_config = true,
            arg if arg.starts_with('-') => {
                return Err(CliError::Usage(format!("Unknown option: {arg}")));
            }
            arg => return Err(CliError::Usage(format!("Unexpected argument: {arg}"))),
        }
        i += 1;
    }

    Ok(Some(parsed))
}

fn load_config(args: &Args) -> Result<Config, CliError> {
    if let Some(path) = &args.config {
        return config::load(path);
    }
    if args.no_config {
        return Ok(Config::default());
    }
    config::load_default()
}

/// `RUST_LOG` wins over the config's `log_level`; the fallback is `warn`.
fn init_logging(config: &Config) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Warn);
    if let Some(level) = &config.log_level {
        builder.parse_filters(level);
    }
    builder.parse_default_env();
    builder.init();
}

fn run_command(expression: &str, field_values: Vec<(String, Value)>) -> Result<Value, FormulaError> {
    let values: HashMap<String, Value> = field_values.into_iter().collect();
    let resolver = |reference: &str| {
        values
            .get(reference)
            .cloned()
            .ok_or_else(|| FormulaError::FieldNotFound(reference.to_string()))
    };
    gridbase_engine::evaluate(expression, &resolver)
}

fn run(args: Args, config: &Config) -> anyhow::Result<()> {
    let options = ComputeOptions {
        parallel: config.compute.parallel,
    };

    if let Some(expression) = &args.command {
        let value = run_command(expression, args.field_values)?;
        println!("{}", format_value(&value));
        return Ok(());
    }

    match (args.fields, args.records) {
        (Some(fields), Some(records)) => batch::run(
            &BatchArgs {
                fields,
                records,
                linked: args.linked,
                output: args.output,
            },
            options,
        ),
        _ => Err(CliError::Usage(
            "either -c <EXPR> or both --fields and --records are required".to_string(),
        )
        .into()),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config);

    if let Err(e) = run(args, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("gridbase")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn field_values_parse_as_json_or_text() {
        assert_eq!(
            parse_field_value("Price=12.5").unwrap(),
            ("Price".to_string(), Value::Number(12.5))
        );
        assert_eq!(
            parse_field_value("Tags=[1,\"a\"]").unwrap().1,
            Value::Array(vec![Value::Number(1.0), Value::from("a")])
        );
        assert_eq!(
            parse_field_value("Name=Ada Lovelace").unwrap().1,
            Value::from("Ada Lovelace")
        );
        assert_eq!(parse_field_value("Eq=a=b").unwrap().1, Value::from("a=b"));
        assert!(parse_field_value("novalue").is_err());
        assert!(parse_field_value("=1").is_err());
    }

    #[test]
    fn parse_args_collects_flags() {
        let args = parse_args(&argv(&[
            "-c",
            "{A} + 1",
            "--field",
            "A=2",
            "--no-config",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(args.command.as_deref(), Some("{A} + 1"));
        assert_eq!(args.field_values.len(), 1);
        assert!(args.no_config);

        assert!(parse_args(&argv(&["--help"])).unwrap().is_none());
        assert!(parse_args(&argv(&["-c"])).is_err());
        assert!(parse_args(&argv(&["--bogus"])).is_err());
        assert!(parse_args(&argv(&["stray"])).is_err());
    }

    #[test]
    fn command_resolves_given_fields() {
        let fields = vec![("A".to_string(), Value::Number(2.0))];
        assert_eq!(run_command("{A} * 3", fields), Ok(Value::Number(6.0)));
        assert_eq!(
            run_command("{B}", Vec::new()),
            Err(FormulaError::FieldNotFound("B".to_string()))
        );
    }
}
