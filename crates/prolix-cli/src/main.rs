//! Prolix — terminal dictionary over a SQLite word index.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;
mod repl;

use prolix_core::{CasePolicy, DictConfig, Error};
use prolix_ingest::BulkLoader;
use prolix_resolve::Resolver;
use prolix_store::schema::meta_keys;
use prolix_store::SqliteStore;

/// Command line after option extraction.
#[derive(Debug, Default, PartialEq)]
struct Args {
    db: Option<PathBuf>,
    case: Option<CasePolicy>,
    title: Option<String>,
    delimiter: Option<u8>,
    json: bool,
    positional: Vec<String>,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut raw = raw.into_iter();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--db" => {
                let path = raw.next().context("--db needs a path")?;
                args.db = Some(PathBuf::from(path));
            }
            "--case" => {
                let policy = raw.next().context("--case needs 'exact' or 'folded'")?;
                args.case = Some(policy.parse()?);
            }
            "--title" => {
                args.title = Some(raw.next().context("--title needs a value")?);
            }
            "--delimiter" => {
                let value = raw.next().context("--delimiter needs a character")?;
                args.delimiter = Some(parse_delimiter(&value)?);
            }
            "--json" => args.json = true,
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn parse_delimiter(value: &str) -> anyhow::Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
        v => anyhow::bail!("--delimiter must be one ASCII character or 'tab', got '{}'", v),
    }
}

/// Command-line arguments as UTF-8, rejecting any that are not.
fn utf8_args(raw: impl IntoIterator<Item = OsString>) -> prolix_core::Result<Vec<String>> {
    raw.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|bad| {
                Error::InvalidQuery(format!("argument {:?} is not valid UTF-8", bad))
            })
        })
        .collect()
}

fn print_help() {
    println!("Prolix — terminal dictionary");
    println!();
    println!("Usage: prolix [options] [command]");
    println!();
    println!("Commands:");
    println!("  (none)                       Interactive lookup");
    println!("  lookup <word>                Print every definition of a word");
    println!("  suggest <prefix>             List words starting with prefix");
    println!("  load <definitions> <index>   Bulk load CSV/TSV files into the data file");
    println!("  validate                     Check the data file");
    println!("  stats                        Show data file statistics");
    println!("  help                         Show this help message");
    println!();
    println!("Options:");
    println!("  --db <path>                  Data file (default $PROLIX_DB or dict/web1913.db)");
    println!("  --case <exact|folded>        Word matching policy (default $PROLIX_CASE or exact)");
    println!("  --title <title>              Dataset title recorded by load");
    println!("  --delimiter <char|tab>       Field delimiter for load (default by extension)");
    println!("  --json                       Machine-readable output");
}

fn open_resolver(config: &DictConfig) -> anyhow::Result<Resolver> {
    let store = SqliteStore::open_read_only(&config.db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open dictionary: {}", e))?;
    Ok(Resolver::new(store, config.case_policy))
}

fn word_argument(args: &Args, usage: &str) -> String {
    let word = args.positional[1..].join(" ");
    if word.trim().is_empty() {
        eprintln!("Usage: {}", usage);
        std::process::exit(2);
    }
    word
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let raw = match utf8_args(std::env::args_os().skip(1)) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let args = parse_args(raw)?;

    let mut config = DictConfig::from_env()?;
    if let Some(db) = &args.db {
        config = config.with_db_path(db);
    }
    if let Some(policy) = args.case {
        config.case_policy = policy;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.positional.first().map(String::as_str) {
        None => {
            let resolver = open_resolver(&config)?;
            let title = resolver.store().get_meta(meta_keys::TITLE)?;
            info!(
                "Interactive session on {} (case policy {})",
                config.db_path.display(),
                resolver.policy()
            );
            writeln!(
                out,
                "Prolix — {}. Type a word, or :help for commands.",
                title.unwrap_or_else(|| config.db_path.display().to_string())
            )?;
            repl::run(&resolver, config.suggest_limit, io::stdin().lock(), &mut out)?;
        }
        Some("lookup") => {
            let word = word_argument(&args, "prolix lookup <word>");
            let resolver = open_resolver(&config)?;
            let result = match resolver.lookup_result(&word) {
                Ok(r) => r,
                Err(e) if e.is_recoverable() => {
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                render::definitions(&mut out, &result.query, &result.definitions)?;
            }
        }
        Some("suggest") => {
            let prefix = word_argument(&args, "prolix suggest <prefix>");
            let resolver = open_resolver(&config)?;
            let items = match resolver.suggest(&prefix, config.suggest_limit) {
                Ok(items) => items,
                Err(e) if e.is_recoverable() => {
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
            } else {
                render::suggestions(&mut out, prefix.trim(), &items)?;
            }
        }
        Some("load") => {
            if args.positional.len() != 3 {
                eprintln!(
                    "Usage: prolix load <definitions.csv> <index.csv> \
                     [--db path] [--title title] [--delimiter char]"
                );
                std::process::exit(2);
            }
            let definitions = PathBuf::from(&args.positional[1]);
            let index = PathBuf::from(&args.positional[2]);

            let store = SqliteStore::open(&config.db_path)
                .map_err(|e| anyhow::anyhow!("Failed to open dictionary: {}", e))?;
            let mut loader = BulkLoader::new(&store);
            if let Some(title) = &args.title {
                loader = loader.with_title(title.clone());
            }
            if let Some(delimiter) = args.delimiter {
                loader = loader.with_delimiter(delimiter);
            }
            let report = loader.load_csv(&definitions, &index)?;

            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                writeln!(
                    out,
                    "Loaded {} definitions and {} index entries into {} ({}ms)",
                    report.definitions,
                    report.index_entries,
                    config.db_path.display(),
                    report.elapsed_ms
                )?;
            }
        }
        Some("validate") => {
            let report = prolix_store::validate(&config.db_path);
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                render::validation_report(&mut out, &report)?;
            }
            out.flush()?;
            std::process::exit(if report.db_valid { 0 } else { 1 });
        }
        Some("stats") => {
            let resolver = open_resolver(&config)?;
            let stats = resolver.store().stats()?;
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
            } else {
                render::stats(&mut out, &stats)?;
            }
        }
        Some("help" | "--help" | "-h") => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'prolix help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
