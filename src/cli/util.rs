use crate::condition::Condition;
use crate::errors::BulkError;

/// Parses repeated `--where "field op value"` arguments.
pub fn parse_conditions(raw: &[String]) -> Result<Vec<Condition>, BulkError> {
    raw.iter().map(|s| s.parse::<Condition>()).collect()
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
