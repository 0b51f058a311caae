//! Assignment strategies.
//!
//! Each strategy walks the unassigned rows of a trial in shuffled order,
//! places the rows it is responsible for and leaves everything else for the
//! strategies that follow. No strategy fills a team past capacity.

mod fill_remaining;
mod min_distribute;
mod min_label;
mod no_more_than;
mod remaining;

pub(crate) use fill_remaining::FillRemainingAssign;
pub(crate) use min_distribute::MinDistributeAssign;
pub(crate) use min_label::DistributeMinLabelAssign;
pub(crate) use no_more_than::AssignNoMoreThan;
pub(crate) use remaining::AssignRemaining;

use crate::action::{ActionError, Index};
use crate::cache::TableCache;
use crate::catalog::{Attribute, Labels, Strategy};

pub(crate) trait Assign {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError>;
}

/// Runs the catalog strategy of `attribute` against the working table.
pub(crate) fn apply(attribute: Attribute, strategy: &Strategy, table: &mut TableCache<'_>) -> Result<(), ActionError> {
    match strategy {
        Strategy::MinDistribute { targets, min_count } => MinDistributeAssign {
            attribute,
            targets,
            min_count: *min_count,
        }
        .assign(table),
        Strategy::DistributeMinLabel {
            allowed,
            treat_missing_as_category,
            pending,
        } => {
            let columns = table.columns();
            let allowed = match allowed {
                Labels::Fixed(labels) => labels.as_slice(),
                Labels::Observed => columns.observed(attribute),
            };
            DistributeMinLabelAssign {
                attribute,
                allowed,
                treat_missing_as_category: *treat_missing_as_category,
                pending,
            }
            .assign(table)
        }
        Strategy::FillRemaining => FillRemainingAssign { attribute }.assign(table),
        Strategy::NoMoreThan { max_distinct } => AssignNoMoreThan {
            attribute,
            max_distinct: *max_distinct,
        }
        .assign(table),
    }
}

/// First team from `start`, wrapping around, that satisfies `eligible`.
fn round_robin(team_count: usize, start: Index, mut eligible: impl FnMut(Index) -> bool) -> Option<Index> {
    (0..team_count)
        .map(|step| (start + step) % team_count)
        .find(|team| eligible(*team))
}
