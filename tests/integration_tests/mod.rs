// Aggregates per-area integration suites
mod common;
mod mod_audit;
mod mod_cli;
mod mod_engine;
mod mod_undo;
