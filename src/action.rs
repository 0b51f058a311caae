use thiserror::Error;

use crate::model::entity::RowId;

pub type Index = usize;

/// A placement applied to the working table of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Assign { row: RowId, team: Index },
    Move { row: RowId, to: Index },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("no team at index {0}")]
    UnknownTeam(Index),
    #[error("no record with id {0}")]
    UnknownRow(RowId),
    #[error("record {0} is already assigned")]
    AlreadyAssigned(RowId),
    #[error("record {0} is not assigned to any team")]
    NotAssigned(RowId),
}
