pub mod audit;
pub mod cli;
pub mod condition;
pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod logger;
pub mod planner;
pub mod progress;
pub mod query;
pub mod retry;
pub mod store;
pub mod types;
pub mod undo;

pub use condition::{Condition, ConditionValue, Operator};
pub use config::BulkConfig;
pub use engine::{BulkDeleteOptions, BulkEngine, DeleteStats, EngineState};
pub use errors::{BulkError, StoreError};
pub use progress::{BatchReport, BulkEvent, ProgressInfo};
pub use store::{DocumentStore, MemoryStore};
pub use types::{MatchedRecord, Record, RecordId};
