use tracing::warn;

use super::Assign;
use crate::action::{Action, ActionError};
use crate::cache::TableCache;
use crate::catalog::Attribute;

/// Sends every labelled row to the team holding the fewest of its label.
pub(crate) struct FillRemainingAssign {
    pub attribute: Attribute,
}

impl Assign for FillRemainingAssign {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError> {
        for row in table.pending() {
            let Some(label) = table.tag(self.attribute, row) else {
                continue;
            };
            let team = (0..table.team_count())
                .filter(|team| !table.is_full(*team))
                .min_by_key(|team| (table.label_count(*team, self.attribute, label), table.size(*team)));
            match team {
                Some(team) => table.act(Action::Assign { row, team })?,
                None => {
                    warn!(attribute = %self.attribute, row, "every team is full");
                    break;
                }
            }
        }
        Ok(())
    }
}
