mod schema;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use declopt::{Matches, OptionValue, ParseOutcome, shell_quote};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use crate::schema::load_schema;

#[derive(Parser)]
#[command(name = "declopt")]
#[command(version, about = "Parse command lines against a declarative option schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse arguments with the options declared in a schema file
    Parse(ParseArgs),

    /// Print the usage generated from a schema file
    Usage(UsageArgs),

    /// Check a value against a built-in type
    CheckType(CheckTypeArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the JSON option schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Arguments to parse (put them after `--`)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the JSON option schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Only the one-line synopsis
    #[arg(long, conflicts_with = "long")]
    short: bool,

    /// Only the option table
    #[arg(long)]
    long: bool,
}

#[derive(Parser)]
struct CheckTypeArgs {
    /// Type name, e.g. uint, ipv4, portnumber
    #[arg(value_name = "TYPE")]
    type_name: String,

    /// Value to check
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    value: String,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Usage(args) => usage_command(args),
        Commands::CheckType(args) => check_type_command(args),
    }
}

fn parse_command(args: ParseArgs) -> Result<ExitCode> {
    tracing::debug!("executing parse command");
    let schema = load_schema(&args.schema)?;
    let mut parser = schema.build()?;

    match parser.parse(&args.args) {
        Ok(ParseOutcome::Help(text)) => {
            print!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Ok(ParseOutcome::Matches(m)) => {
            if args.json {
                let out = serde_json::to_string_pretty(&matches_to_json(&m))
                    .context("failed to serialize parse result")?;
                println!("{out}");
            } else {
                print!("{}", parser.report());
                let quoted: Vec<String> = m.positionals().iter().map(|p| shell_quote(p)).collect();
                println!("parameters: {}", quoted.join(" "));
            }
            Ok(ExitCode::SUCCESS)
        }
        // The parser already printed the error and usage.
        Err(err) if err.is_usage_error() => Ok(ExitCode::FAILURE),
        Err(err) => Err(err).context("option schema is inconsistent"),
    }
}

fn usage_command(args: UsageArgs) -> Result<ExitCode> {
    let parser = load_schema(&args.schema)?.build()?;
    let text = if args.short {
        parser.usage_short()
    } else if args.long {
        parser.usage_long()
    } else {
        parser.usage()
    };
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn check_type_command(args: CheckTypeArgs) -> Result<ExitCode> {
    let parser = declopt::Parser::new();
    let valid = parser
        .check_type(&args.type_name, &args.value)
        .with_context(|| format!("cannot check type '{}'", args.type_name))?;

    if valid {
        println!("valid {}: {}", args.type_name, shell_quote(&args.value));
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("invalid {}: {}", args.type_name, shell_quote(&args.value));
        Ok(ExitCode::FAILURE)
    }
}

fn matches_to_json(m: &Matches) -> Value {
    let options: Map<String, Value> = m
        .options()
        .map(|(name, value)| {
            let value = match value {
                OptionValue::Count(n) => json!(n),
                OptionValue::Scalar(s) => json!(s),
                OptionValue::Cumulative { count, values } => {
                    json!({ "count": count, "values": values })
                }
            };
            (name.to_string(), value)
        })
        .collect();

    json!({
        "options": options,
        "positionals": m.positionals(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
