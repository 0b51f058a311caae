use super::Assign;
use crate::action::{Action, ActionError};
use crate::cache::TableCache;
use crate::catalog::Attribute;

/// Keeps each team within `max_distinct` labels; rows that fit nowhere stay unassigned.
pub(crate) struct AssignNoMoreThan {
    pub attribute: Attribute,
    pub max_distinct: usize,
}

impl Assign for AssignNoMoreThan {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError> {
        for row in table.pending() {
            let Some(label) = table.tag(self.attribute, row) else {
                continue;
            };
            let team = (0..table.team_count()).find(|team| {
                !table.is_full(*team)
                    && (table.has_label(*team, self.attribute, label)
                        || table.distinct_labels(*team, self.attribute) < self.max_distinct)
            });
            if let Some(team) = team {
                table.act(Action::Assign { row, team })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::single_column;
    use crate::cache::ColumnCache;

    #[test]
    fn teams_hold_at_most_two_timezones() {
        let values = ["PST", "EST", "CET", "PST", "JST", "CET", "EST", "JST"];
        let dataset = single_column("Timezone", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::Timezone]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 2, 4);
        AssignNoMoreThan { attribute: Attribute::Timezone, max_distinct: 2 }
            .assign(&mut table)
            .unwrap();

        for team in 0..2 {
            assert!(table.distinct_labels(team, Attribute::Timezone) <= 2);
        }
        // PST, EST fill team 1 and CET, JST team 2
        assert_eq!(table.remaining(), 0);
        assert_eq!(table.label_count(0, Attribute::Timezone, "PST"), 2);
        assert_eq!(table.label_count(1, Attribute::Timezone, "JST"), 2);
    }

    #[test]
    fn leaves_rows_with_no_fitting_team() {
        let values = ["PST", "EST", "CET"];
        let dataset = single_column("Timezone", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::Timezone]);
        let mut table = TableCache::new(&columns, vec![0, 1, 2], 1, 3);
        AssignNoMoreThan { attribute: Attribute::Timezone, max_distinct: 2 }
            .assign(&mut table)
            .unwrap();
        assert_eq!(table.pending(), vec![2]);
    }
}
