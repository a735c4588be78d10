//! strata CLI - query, override and dump config files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use strata_config::{apply_settings, load_config, ConfigInfo};
use strata_json::{as_json_formatted, InfNanStyle, JsonFormat};
use strata_value::{member_path, Value};
use strata_yaml::as_yaml;

// Exit codes follow the BSD sysexits conventions: 0 ok, 1 general error,
// 64 usage, 74 I/O, 78 config.
const RESULT_OK: u8 = 0;
const RESULT_ARG_ERROR: u8 = 64; // EX_USAGE
const RESULT_IO_ERROR: u8 = 74; // EX_IOERR
const RESULT_CONFIG_ERROR: u8 = 78; // EX_CONFIG

#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Tool for working with config files", long_about = None)]
struct Cli {
    /// Read given config file(s) and dump corresponding data
    paths: Vec<PathBuf>,

    /// Show the value at the given path, e.g. people.bob.name
    #[arg(long)]
    query: Option<String>,

    /// Additional settings to apply to the config after reading
    #[arg(long = "set", value_name = "KEY[=VALUE]")]
    settings: Vec<String>,

    /// For an object, show only member names
    #[arg(long)]
    names: bool,

    /// Look for variant import files with the given suffix
    #[arg(long)]
    variant: Option<String>,

    /// Set indent
    #[arg(long, default_value_t = 2)]
    indent: i32,

    /// Set right margin for array wrapping purposes, or 0 to disable
    /// wrapping (each element on its own line)
    #[arg(long, default_value_t = 74)]
    margin: i32,

    /// Set max precision for number output
    #[arg(long, default_value_t = 6)]
    precision: i32,

    /// Set whether to quote keys
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    quote_keys: bool,

    /// Set whether to trim trailing zeroes from real numbers
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    trim_zeroes: bool,

    /// Select output options for a strict json parser
    #[arg(long)]
    strict: bool,

    /// List input file dependencies
    #[arg(long)]
    deps: bool,

    /// Output result as yaml rather than json
    #[arg(long)]
    yaml: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet: only show warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.paths.is_empty() {
        eprintln!("No config files given; see --help");
        return ExitCode::from(RESULT_ARG_ERROR);
    }

    let format = if cli.strict {
        JsonFormat::strict()
    } else {
        JsonFormat {
            indent: cli.indent,
            quote_keys: cli.quote_keys,
            array_margin: cli.margin,
            max_precision: cli.precision,
            trim_zeroes: cli.trim_zeroes,
            inf_nan: InfNanStyle::Js,
        }
    };

    let mut result = RESULT_OK;

    for input_path in &cli.paths {
        if cli.paths.len() > 1 {
            println!("{}:", input_path.display());
        }

        let mut info = ConfigInfo::new();
        if let Some(variant) = &cli.variant {
            info.variant = variant.clone();
        }

        let mut config = match load_config(input_path, &mut info) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("{}", error);
                result = RESULT_ARG_ERROR;
                continue;
            }
        };

        if cli.deps {
            println!("{}:", info.main.display());
            for import in &info.imports {
                println!("     {}", import.display());
            }
            continue;
        }

        if let Err(error) = apply_settings(&cli.settings, &mut config) {
            eprintln!("{}", error);
            result = RESULT_CONFIG_ERROR;
        }

        if !dump_config(&config, &cli, &format) {
            result = RESULT_IO_ERROR;
        }
    }

    ExitCode::from(result)
}

fn dump_config(config: &Value, cli: &Cli, format: &JsonFormat) -> bool {
    let value = match &cli.query {
        Some(query) => {
            let found = member_path(config, query);
            if found.is_null() {
                eprintln!("{} not found", query);
                return false;
            }
            found
        }
        None => config,
    };

    if cli.names && value.as_object().is_some() {
        for index in 0..value.num_members() {
            if let Some(name) = value.member_name(index) {
                println!("{}", name);
            }
        }
        return true;
    }

    if cli.yaml {
        print!("{}", as_yaml(value, format.indent));
    } else {
        println!("{}", as_json_formatted(value, format));
    }

    true
}
