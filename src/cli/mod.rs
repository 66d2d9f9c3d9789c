mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{OutputMode, RunOutcome, run_with_format};
pub use util::{is_affirmative, parse_conditions};
