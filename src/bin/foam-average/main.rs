//! foam-average CLI - Time-average fields of a simulation case.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use foam_average::prelude::*;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Verbosity levels
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;
const LOG_TRACE: u8 = 3;

/// Parsed command line.
struct Cli {
    config: RunConfig,
    dry_run: bool,
    json: bool,
    verbosity: u8,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!();
            print_help();
            return ExitCode::from(2);
        }
    };

    init_tracing(cli.verbosity);

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Option<Cli>> {
    let mut config_path: Option<PathBuf> = None;
    let mut case_dir: Option<PathBuf> = None;
    let mut fields_file: Option<PathBuf> = None;
    let mut t_start: Option<f64> = None;
    let mut t_end: Option<f64> = None;
    let mut no_mmap = false;
    let mut dry_run = false;
    let mut json = false;
    let mut verbosity = LOG_INFO;
    let mut fields: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("{}", version_string());
                return Ok(None);
            }
            "-v" | "--verbose" => verbosity = LOG_DEBUG,
            "-vv" | "--trace" => verbosity = LOG_TRACE,
            "-q" | "--quiet" => verbosity = LOG_QUIET,
            "-C" | "--case" => case_dir = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "-c" | "--config" => config_path = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "-f" | "--fields-file" => fields_file = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "-s" | "--start" => t_start = Some(parse_time(take_value(&mut iter, arg)?, arg)?),
            "-e" | "--end" => t_end = Some(parse_time(take_value(&mut iter, arg)?, arg)?),
            "--no-mmap" => no_mmap = true,
            "-n" | "--dry-run" => dry_run = true,
            "-j" | "--json" => json = true,
            flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option: {}", flag),
            field => fields.push(field.to_string()),
        }
    }

    let mut config = match &config_path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(dir) = case_dir {
        config.case_dir = dir;
    }
    if fields_file.is_some() {
        config.field_table = fields_file;
    }
    if t_start.is_some() {
        config.t_start = t_start;
    }
    if t_end.is_some() {
        config.t_end = t_end;
    }
    if no_mmap {
        config.use_mmap = false;
    }
    if !fields.is_empty() {
        config.fields = fields;
    }
    if config.fields.is_empty() {
        bail!("missing field name");
    }

    // JSON output owns stdout; keep logs down to errors
    if json {
        verbosity = LOG_QUIET;
    }

    Ok(Some(Cli { config, dry_run, json, verbosity }))
}

fn take_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<&'a str> {
    match iter.next() {
        Some(v) => Ok(v.as_str()),
        None => bail!("missing value for {}", flag),
    }
}

fn parse_time(value: &str, flag: &str) -> anyhow::Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("invalid time for {}: {}", flag, value))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        LOG_QUIET => "error",
        LOG_INFO => "info",
        LOG_DEBUG => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn version_string() -> String {
    let date = option_env!("FOAM_AVERAGE_BUILD_DATE").unwrap_or("unknown");
    format!("foam-average {} (built {})", env!("CARGO_PKG_VERSION"), date)
}

/// Run the configured averaging. Returns false if any field failed.
fn execute(cli: &Cli) -> anyhow::Result<bool> {
    debug!(config = ?cli.config, "starting");

    if cli.dry_run {
        return cmd_dry_run(cli);
    }

    let outcomes = foam_average::average::run(&cli.config)?;
    let all_ok = outcomes.iter().all(|(_, r)| r.is_ok());

    if cli.json {
        let results: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|(field, result)| match result {
                Ok(report) => serde_json::json!({ "field": field, "report": report }),
                Err(e) => serde_json::json!({ "field": field, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": results }))?);
    } else {
        for (field, result) in &outcomes {
            match result {
                Ok(report) => print_report(report),
                Err(e) => eprintln!("{}: failed: {}", field, e),
            }
        }
    }

    Ok(all_ok)
}

fn cmd_dry_run(cli: &Cli) -> anyhow::Result<bool> {
    let config = &cli.config;
    config.validate()?;
    let case = Case::open(&config.case_dir)?;
    let table = config.field_table()?;
    for name in &config.fields {
        table.lookup(name)?;
    }
    let averager = FieldAverager::new(case, table);
    let steps = averager.select_time_steps(config.t_start, config.t_end)?;
    let times: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();

    if cli.json {
        let plan: Vec<serde_json::Value> = config
            .fields
            .iter()
            .map(|field| {
                serde_json::json!({
                    "field": field,
                    "output": averager.case().mean_path(field),
                    "times": times,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "plan": plan }))?);
    } else {
        for field in &config.fields {
            println!("{} -> {}", field, averager.case().mean_path(field).display());
            println!("  {} time steps: {}", times.len(), times.join(" "));
        }
    }
    Ok(true)
}

fn print_report(report: &AverageReport) {
    println!("Field:    {} ({}, {})", report.field, report.kind, report.encoding);
    println!("Samples:  {}", report.samples);
    if let (Some(first), Some(last)) = (report.times.first(), report.times.last()) {
        println!("Times:    {} .. {}", first, last);
    }
    println!("Points:   {}", report.points);
    println!("Output:   {}", report.output.display());
    println!();
}

fn print_help() {
    println!("foam-average - Time-average fields of a simulation case");
    println!();
    println!("USAGE:");
    println!("    foam-average [OPTIONS] <FIELD>...");
    println!();
    println!("OPTIONS:");
    println!("    -C, --case <dir>          Case directory (default: .)");
    println!("    -s, --start <time>        First time step to include");
    println!("    -e, --end <time>          Last time step to include");
    println!("    -f, --fields-file <json>  Extra field kinds: {{\"fields\": {{\"k\": \"scalar\"}}}}");
    println!("    -c, --config <json>       Load run settings from a JSON file");
    println!("        --no-mmap             Read input files without memory mapping");
    println!("    -n, --dry-run             List selected time steps, read nothing");
    println!("    -j, --json                Print results as JSON");
    println!("    -v, --verbose             Show debug output");
    println!("    -vv, --trace              Show trace output (very verbose)");
    println!("    -q, --quiet               Only show errors");
    println!("    -V, --version             Show version");
    println!("    -h, --help                Show this help");
    println!();
    println!("EXAMPLES:");
    println!("    foam-average U                        # Average U over all time steps");
    println!("    foam-average -s 300 -e 350 U p        # Average U and p over [300, 350]");
    println!("    foam-average -C run01 --dry-run U     # Show which time steps would be used");
    println!();
    println!("NOTES:");
    println!("    - Output is written to <case>/<FIELD>Mean");
    println!("    - RUST_LOG overrides the -v/-q log level");
}
