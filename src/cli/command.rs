use std::path::PathBuf;

use crate::condition::{Condition, Operator};
use crate::engine::BulkDeleteOptions;

pub enum Command {
    Preview {
        collection: String,
        conditions: Vec<Condition>,
        limit: Option<usize>,
    },
    Count {
        collection: String,
        conditions: Vec<Condition>,
    },
    Delete {
        collection: String,
        conditions: Vec<Condition>,
        options: BulkDeleteOptions,
        // exported after the run so a later `Undo` can restore
        undo_file: Option<PathBuf>,
    },
    QuickDelete {
        collection: String,
        field: String,
        value: String,
        operator: Operator,
        options: BulkDeleteOptions,
    },
    Undo {
        undo_file: Option<PathBuf>,
    },
    Estimate {
        items: usize,
        batch_size: usize,
    },
    Validate {
        conditions: Vec<Condition>,
    },
}

impl Command {
    /// Whether running this command can change stored records.
    pub fn mutates(&self) -> bool {
        match self {
            Self::Delete { options, .. } | Self::QuickDelete { options, .. } => !options.dry_run,
            Self::Undo { .. } => true,
            Self::Preview { .. } | Self::Count { .. } | Self::Estimate { .. } | Self::Validate { .. } => {
                false
            }
        }
    }
}
