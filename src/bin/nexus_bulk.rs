use clap::{Parser, Subcommand};
use nexus_bulk::cli::{self as prog_cli, Command, OutputMode};
use nexus_bulk::condition::{Condition, Operator};
use nexus_bulk::config::BulkConfig;
use nexus_bulk::engine::{BulkDeleteOptions, BulkEngine};
use nexus_bulk::errors::BulkError;
use nexus_bulk::logger;
use nexus_bulk::store::MemoryStore;
use nexus_bulk::undo::UndoSnapshot;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "nexus-bulk", version, about = "Conditional bulk delete with preview, retry and undo", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, the default search paths are used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "NDJSON data file holding the collection. Takes precedence over config/env.")]
    data: Option<PathBuf>,
    #[arg(long, help = "log4rs config file (YAML or TOML). Replaces the built-in app/audit log setup.")]
    log_config: Option<PathBuf>,
    #[arg(long, global = true, conflicts_with = "plain", help = "Print machine-readable JSON")]
    json: bool,
    #[arg(long, global = true, help = "Print terse key=value output")]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Show the records a delete would remove, without changing anything")]
    Preview {
        #[arg(short, long, help = "Collection name (defaults to default_collection from config)")]
        collection: Option<String>,
        #[arg(short = 'w', long = "where", value_name = "FIELD OP VALUE", required = true)]
        conditions: Vec<String>,
        #[arg(long, help = "Show at most this many records")]
        limit: Option<usize>,
    },
    #[command(about = "Count matching records")]
    Count {
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short = 'w', long = "where", value_name = "FIELD OP VALUE", required = true)]
        conditions: Vec<String>,
    },
    #[command(about = "Delete every matching record in sequential batches")]
    Delete {
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short = 'w', long = "where", value_name = "FIELD OP VALUE", required = true)]
        conditions: Vec<String>,
        #[arg(long, help = "Match and report, but delete nothing")]
        dry_run: bool,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long, help = "Total attempts per batch")]
        max_retries: Option<u32>,
        #[arg(long, help = "Backoff base in milliseconds")]
        retry_delay_ms: Option<u64>,
        #[arg(long, help = "Capture an undo snapshot and write it to this JSON file")]
        undo_file: Option<PathBuf>,
        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    #[command(
        name = "quick-delete",
        about = "Delete records where a single field matches a value",
        long_about = "Delete records where a single field matches a value. Batch size, retries and \
                      dry run come from the config file and NEXUS_BULK_* environment."
    )]
    QuickDelete {
        field: String,
        value: String,
        #[arg(long, default_value = "==")]
        op: String,
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    #[command(about = "Restore the records removed by the last delete run with --undo-file")]
    Undo {
        #[arg(long)]
        undo_file: PathBuf,
    },
    #[command(about = "Estimate how long deleting N records takes")]
    Estimate {
        items: usize,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    #[command(about = "Check conditions without touching any data")]
    Validate {
        #[arg(short = 'w', long = "where", value_name = "FIELD OP VALUE", required = true)]
        conditions: Vec<String>,
    },
}

fn resolve_collection(arg: Option<String>, cfg: &BulkConfig) -> Result<String, BulkError> {
    arg.or_else(|| cfg.default_collection.clone())
        .ok_or_else(|| BulkError::Config("no collection given; pass --collection or set default_collection".into()))
}

fn snapshot_collection(path: &Path) -> Result<String, BulkError> {
    let snap: UndoSnapshot = serde_json::from_slice(&std::fs::read(path)?)?;
    Ok(snap.collection)
}

fn confirm(prompt: &str) -> bool {
    if !std::io::stdin().is_terminal() {
        eprintln!("{prompt} refusing without a terminal; pass --yes");
        return false;
    }
    eprint!("{prompt} Continue? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    prog_cli::is_affirmative(&answer)
}

async fn confirmed(
    engine: &BulkEngine<MemoryStore>,
    collection: &str,
    conditions: &[Condition],
) -> Result<bool, BulkError> {
    let n = engine.count_matches(collection, conditions).await?;
    if n == 0 {
        return Ok(true);
    }
    Ok(confirm(&format!("About to delete {n} records from '{collection}'.")))
}

async fn real_main() -> Result<(), BulkError> {
    let cli = Cli::parse();
    let mut cfg = BulkConfig::load_from(&BulkConfig::search_paths(cli.config.as_deref()))?;
    if cli.data.is_some() {
        cfg.data_file = cli.data.clone();
    }
    if let Some(path) = cli.log_config.as_deref() {
        if let Err(e) = logger::init_path(path) {
            eprintln!("warning: logging disabled: {e}");
        }
    } else if let Some(dir) = cfg.log_dir.as_deref() {
        let retention =
            std::env::var("NEXUS_BULK_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
        if let Err(e) = logger::configure_logging(Some(dir), cfg.log_level.as_deref(), retention) {
            eprintln!("warning: logging disabled: {e}");
        }
    }
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.plain {
        OutputMode::Plain
    } else {
        OutputMode::Human
    };

    // Collection the command reads or writes, if any.
    let (collection, cmd, skip_confirm) = match cli.command {
        Commands::Preview { collection, conditions, limit } => {
            let collection = resolve_collection(collection, &cfg)?;
            let conditions = prog_cli::parse_conditions(&conditions)?;
            (Some(collection.clone()), Command::Preview { collection, conditions, limit }, true)
        }
        Commands::Count { collection, conditions } => {
            let collection = resolve_collection(collection, &cfg)?;
            let conditions = prog_cli::parse_conditions(&conditions)?;
            (Some(collection.clone()), Command::Count { collection, conditions }, true)
        }
        Commands::Delete {
            collection,
            conditions,
            dry_run,
            batch_size,
            max_retries,
            retry_delay_ms,
            undo_file,
            yes,
        } => {
            let collection = resolve_collection(collection, &cfg)?;
            let conditions = prog_cli::parse_conditions(&conditions)?;
            let mut options = BulkDeleteOptions::from_config(&cfg);
            options.dry_run |= dry_run;
            options.enable_undo |= undo_file.is_some();
            if let Some(b) = batch_size {
                options.batch_size = b;
            }
            if let Some(m) = max_retries {
                options.max_retries = m;
            }
            if let Some(ms) = retry_delay_ms {
                options.retry_delay = Duration::from_millis(ms);
            }
            let skip = yes || options.dry_run;
            (
                Some(collection.clone()),
                Command::Delete { collection, conditions, options, undo_file },
                skip,
            )
        }
        Commands::QuickDelete { field, value, op, collection, yes } => {
            let collection = resolve_collection(collection, &cfg)?;
            let operator: Operator = op.parse()?;
            let options = BulkDeleteOptions::from_config(&cfg);
            let skip = yes || options.dry_run;
            (
                Some(collection.clone()),
                Command::QuickDelete { collection, field, value, operator, options },
                skip,
            )
        }
        Commands::Undo { undo_file } => {
            let collection = if undo_file.exists() { Some(snapshot_collection(&undo_file)?) } else { None };
            (collection, Command::Undo { undo_file: Some(undo_file) }, true)
        }
        Commands::Estimate { items, batch_size } => {
            let batch_size = batch_size.unwrap_or(cfg.batch_size);
            (None, Command::Estimate { items, batch_size }, true)
        }
        Commands::Validate { conditions } => {
            let conditions = prog_cli::parse_conditions(&conditions)?;
            (None, Command::Validate { conditions }, true)
        }
    };

    let store = MemoryStore::with_max_batch_ops(nexus_bulk::store::MAX_BATCH_OPS);
    if let (Some(col), Some(data)) = (collection.as_deref(), cfg.data_file.as_deref()) {
        if data.exists() {
            store.load_ndjson(data, col)?;
        } else {
            store.create_collection(col);
        }
    }
    let engine = BulkEngine::with_config(store, &cfg);

    if !skip_confirm {
        let go = match &cmd {
            Command::Delete { collection, conditions, .. } => {
                confirmed(&engine, collection, conditions).await?
            }
            Command::QuickDelete { collection, field, value, operator, .. } => {
                let conds = [Condition::from_raw(field.as_str(), *operator, value)];
                confirmed(&engine, collection, &conds).await?
            }
            _ => true,
        };
        if !go {
            eprintln!("aborted");
            return Ok(());
        }
    }

    let mutates = cmd.mutates();
    let outcome = {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        prog_cli::run_with_format(&engine, cmd, mode, &mut lock).await?
    };
    if mutates && outcome.mutated {
        if let (Some(col), Some(data)) = (collection.as_deref(), cfg.data_file.as_deref()) {
            let n = engine.store().save_ndjson(data, col)?;
            log::info!("wrote {n} records to {}", data.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = real_main().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
