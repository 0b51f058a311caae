use tracing::debug;

use super::Assign;
use crate::action::{Action, ActionError};
use crate::cache::TableCache;

/// Fallback: each leftover row joins the currently smallest team.
pub(crate) struct AssignRemaining;

impl Assign for AssignRemaining {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError> {
        let pending = table.pending();
        debug!(rows = pending.len(), capacity = table.capacity(), "assigning leftover records by team size");
        for row in pending {
            let team = (0..table.team_count())
                .min_by_key(|team| table.size(*team))
                .ok_or(ActionError::UnknownTeam(0))?;
            table.act(Action::Assign { row, team })?;
        }
        Ok(())
    }
}
