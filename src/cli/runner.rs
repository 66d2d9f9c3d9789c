use std::io::Write;
use std::time::Duration;

use crate::engine::{BulkEngine, DeleteStats};
use crate::errors::BulkError;
use crate::store::DocumentStore;
use crate::types::Record;

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

/// What a command did, so the caller knows whether to persist the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub mutated: bool,
}

fn record_json(r: &Record) -> serde_json::Value {
    serde_json::json!({ "id": r.id.as_str(), "fields": r.fields })
}

fn write_stats(out: &mut dyn Write, stats: &DeleteStats, mode: OutputMode) -> Result<(), BulkError> {
    match mode {
        OutputMode::Json => writeln!(out, "{}", serde_json::to_string(stats)?)?,
        OutputMode::Plain => writeln!(
            out,
            "found={} deleted={} failed={} batches={} duration_ms={}",
            stats.found,
            stats.deleted,
            stats.failed,
            stats.batches_processed,
            stats.duration.as_millis()
        )?,
        OutputMode::Human => {
            writeln!(
                out,
                "found {} | deleted {} | failed {} | {} batches in {:.1}s",
                stats.found,
                stats.deleted,
                stats.failed,
                stats.batches_processed,
                stats.duration.as_secs_f64()
            )?;
            for e in &stats.errors {
                writeln!(out, "  error: {e}")?;
            }
        }
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 { format!("{}m {}s", secs / 60, secs % 60) } else { format!("{:.1}s", d.as_secs_f64()) }
}

/// Runs one command against `engine`, writing results to `out`.
///
/// # Errors
/// Validation, busy, store, and I/O failures from the underlying operation.
pub async fn run_with_format<S: DocumentStore>(
    engine: &BulkEngine<S>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<RunOutcome, BulkError> {
    match cmd {
        Command::Preview { collection, conditions, limit } => {
            let records = engine.preview_delete(&collection, &conditions).await?;
            let shown = limit.unwrap_or(records.len()).min(records.len());
            match mode {
                OutputMode::Json => {
                    let docs: Vec<_> = records[..shown].iter().map(record_json).collect();
                    let json = serde_json::json!({ "matched": records.len(), "records": docs });
                    writeln!(out, "{json}")?;
                }
                OutputMode::Plain => {
                    for r in &records[..shown] {
                        writeln!(out, "{}", record_json(r))?;
                    }
                }
                OutputMode::Human => {
                    writeln!(out, "{} records match", records.len())?;
                    for r in &records[..shown] {
                        writeln!(out, "  {} {}", r.id, r.fields)?;
                    }
                    if shown < records.len() {
                        writeln!(out, "  ... {} more", records.len() - shown)?;
                    }
                }
            }
            Ok(RunOutcome::default())
        }
        Command::Count { collection, conditions } => {
            let n = engine.count_matches(&collection, &conditions).await?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "count": n }))?,
                _ => writeln!(out, "{n}")?,
            }
            Ok(RunOutcome::default())
        }
        Command::Delete { collection, conditions, options, undo_file } => {
            let replaces_snapshot = options.enable_undo && !options.dry_run;
            let stats = engine.execute_delete(&collection, &conditions, options).await?;
            if let Some(path) = undo_file.as_deref().filter(|_| replaces_snapshot) {
                if engine.export_undo_snapshot(path)? {
                    log::info!("undo snapshot written to {}", path.display());
                    if mode == OutputMode::Human {
                        writeln!(out, "undo snapshot: {}", path.display())?;
                    }
                } else if stats.found > 0 && path.exists() {
                    // the engine dropped the prior snapshot; the file must not outlive it
                    std::fs::remove_file(path)?;
                    log::info!("removed stale undo snapshot {}", path.display());
                }
            }
            write_stats(out, &stats, mode)?;
            Ok(RunOutcome { mutated: stats.deleted > 0 })
        }
        Command::QuickDelete { collection, field, value, operator, options } => {
            let stats = engine.quick_delete_with(&collection, &field, &value, operator, options).await?;
            write_stats(out, &stats, mode)?;
            Ok(RunOutcome { mutated: stats.deleted > 0 })
        }
        Command::Undo { undo_file } => {
            if let Some(path) = undo_file.as_deref() {
                if path.exists() {
                    engine.import_undo_snapshot(path)?;
                }
            }
            let restored = engine.undo_last_delete().await?;
            if restored {
                if let Some(path) = undo_file.as_deref().filter(|p| p.exists()) {
                    std::fs::remove_file(path)?;
                }
            }
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "restored": restored }))?,
                OutputMode::Plain => writeln!(out, "{restored}")?,
                OutputMode::Human if restored => writeln!(out, "last delete restored")?,
                OutputMode::Human if engine.can_undo() => {
                    writeln!(out, "restore incomplete; snapshot kept for another attempt")?;
                }
                OutputMode::Human => writeln!(out, "nothing to undo")?,
            }
            Ok(RunOutcome { mutated: restored })
        }
        Command::Estimate { items, batch_size } => {
            let d = engine.estimate_delete_time(items, batch_size);
            match mode {
                OutputMode::Json => {
                    let json = serde_json::json!({
                        "items": items, "batch_size": batch_size, "estimated_ms": d.as_millis()
                    });
                    writeln!(out, "{json}")?;
                }
                OutputMode::Plain => writeln!(out, "{}", d.as_millis())?,
                OutputMode::Human => writeln!(out, "estimated time: {}", format_duration(d))?,
            }
            Ok(RunOutcome::default())
        }
        Command::Validate { conditions } => {
            engine.validate_conditions(&conditions)?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "valid": true }))?,
                _ => writeln!(out, "ok: {} conditions", conditions.len())?,
            }
            Ok(RunOutcome::default())
        }
    }
}
