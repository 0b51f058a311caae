use tracing::{debug, warn};

use super::{round_robin, Assign};
use crate::action::{Action, ActionError, Index};
use crate::cache::TableCache;
use crate::catalog::Attribute;
use crate::model::entity::{RowId, Tag};

/// Spreads rows carrying any of `targets` so every team reaches `min_count` of them.
pub(crate) struct MinDistributeAssign<'s> {
    pub attribute: Attribute,
    pub targets: &'s [Tag],
    pub min_count: usize,
}

impl Assign for MinDistributeAssign<'_> {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError> {
        let team_count = table.team_count();
        let mut matches: Vec<usize> = (0..team_count)
            .map(|team| table.labels_count(team, self.attribute, self.targets))
            .collect();
        let mut min_count = self.min_count;
        let mut cursor = 0;
        let mut last: Option<(RowId, Index)> = None;

        for row in table.pending() {
            if !table
                .tag(self.attribute, row)
                .is_some_and(|tag| self.targets.contains(tag))
            {
                continue;
            }

            let eligible = round_robin(team_count, cursor, |team| {
                matches[team] < min_count && !table.is_full(team)
            });
            let team = match eligible {
                Some(team) => team,
                None => {
                    // every team already holds min_count matches or is full
                    let least = (0..team_count)
                        .filter(|team| !table.is_full(*team))
                        .min_by_key(|team| matches[*team]);
                    let Some(least) = least else {
                        warn!(attribute = %self.attribute, row, "no team has room left");
                        break;
                    };
                    min_count += 1;
                    least
                }
            };

            table.act(Action::Assign { row, team })?;
            matches[team] += 1;
            cursor = (team + 1) % team_count;
            last = Some((row, team));
        }

        if let Some((row, team)) = last {
            if matches[team] == 1 {
                self.regroup(table, &mut matches, row, team, min_count)?;
            }
        }

        if matches.iter().any(|count| *count < self.min_count) {
            debug!(
                attribute = %self.attribute,
                min_count = self.min_count,
                ?matches,
                "not enough matching records for every team"
            );
        }
        Ok(())
    }
}

impl MinDistributeAssign<'_> {
    /// Moves a lone match into another team that already holds some but fewer than `min_count`.
    fn regroup(
        &self,
        table: &mut TableCache<'_>,
        matches: &mut [usize],
        row: RowId,
        team: Index,
        min_count: usize,
    ) -> Result<(), ActionError> {
        let target = (0..matches.len())
            .filter(|other| {
                *other != team
                    && !table.is_full(*other)
                    && matches[*other] > 0
                    && matches[*other] < min_count
            })
            .min_by_key(|other| matches[*other]);
        if let Some(to) = target {
            table.act(Action::Move { row, to })?;
            matches[team] -= 1;
            matches[to] += 1;
        }
        Ok(())
    }
}
