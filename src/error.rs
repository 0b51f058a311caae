use thiserror::Error;

use crate::action::ActionError;
use crate::config::ConfigError;
use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot split {records} records into {teams} teams")]
    TeamCount { teams: usize, records: usize },
    #[error("engine invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("record {row} does not share the columns of the first record")]
    Mismatch { row: usize },
}

/// Postconditions a finished trial must satisfy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("{remaining} records left unassigned")]
    Unassigned { remaining: usize },
    #[error("team {team} holds {size} records, capacity is {capacity}")]
    OverCapacity { team: usize, size: usize, capacity: usize },
    #[error("{assigned} records assigned, expected {expected}")]
    CountMismatch { assigned: usize, expected: usize },
}
