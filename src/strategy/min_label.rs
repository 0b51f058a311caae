use tracing::warn;

use super::{round_robin, Assign};
use crate::action::{Action, ActionError};
use crate::cache::TableCache;
use crate::catalog::Attribute;
use crate::model::entity::Tag;

/// Distributes labels rarest first, one label per pass.
///
/// With `treat_missing_as_category` a team never receives a second row of
/// the same label, and the per-team counts cover every allowed label.
/// An empty `pending` list processes only the rarest allowed label.
pub(crate) struct DistributeMinLabelAssign<'s> {
    pub attribute: Attribute,
    pub allowed: &'s [Tag],
    pub treat_missing_as_category: bool,
    pub pending: &'s [Tag],
}

impl Assign for DistributeMinLabelAssign<'_> {
    fn assign(&self, table: &mut TableCache<'_>) -> Result<(), ActionError> {
        let mut queue: Vec<&Tag> = if self.pending.is_empty() {
            self.rarest(table, self.allowed.iter()).into_iter().collect()
        } else {
            self.pending.iter().collect()
        };

        while let Some(label) = self.rarest(table, queue.iter().copied()) {
            queue.retain(|queued| *queued != label);
            self.distribute(table, label)?;
        }
        Ok(())
    }
}

impl<'s> DistributeMinLabelAssign<'s> {
    /// Least frequent label in the whole dataset; the earliest wins ties.
    fn rarest(&self, table: &TableCache<'_>, labels: impl Iterator<Item = &'s Tag>) -> Option<&'s Tag> {
        let columns = table.columns();
        labels.min_by_key(|label| columns.frequency(self.attribute, label))
    }

    fn team_count_of(&self, table: &TableCache<'_>, team: usize, label: &str) -> usize {
        if self.treat_missing_as_category {
            table.labels_count(team, self.attribute, self.allowed)
        } else {
            table.label_count(team, self.attribute, label)
        }
    }

    fn distribute(&self, table: &mut TableCache<'_>, label: &Tag) -> Result<(), ActionError> {
        let team_count = table.team_count();
        let mut counts: Vec<usize> = (0..team_count)
            .map(|team| self.team_count_of(table, team, label))
            .collect();
        let mut threshold = counts.iter().min().copied().unwrap_or(0) + 1;
        let mut cursor = 0;

        for row in table.pending() {
            if table.tag(self.attribute, row) != Some(label) {
                continue;
            }
            let exclusive_ok = |team: usize| !self.treat_missing_as_category || !table.has_label(team, self.attribute, label);

            let eligible = round_robin(team_count, cursor, |team| {
                counts[team] < threshold && !table.is_full(team) && exclusive_ok(team)
            });
            let team = match eligible {
                Some(team) => team,
                None => {
                    let least = (0..team_count)
                        .filter(|team| !table.is_full(*team) && exclusive_ok(*team))
                        .min_by_key(|team| (counts[*team], table.size(*team)));
                    let Some(least) = least else {
                        warn!(attribute = %self.attribute, %label, row, "no team can take the record");
                        continue;
                    };
                    threshold += 1;
                    least
                }
            };

            table.act(Action::Assign { row, team })?;
            counts[team] += 1;
            cursor = (team + 1) % team_count;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::single_column;
    use crate::cache::ColumnCache;
    use crate::model::condition::capacity;

    fn labels(values: &[&str]) -> Vec<Tag> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn exclusive_labels_never_share_a_team() {
        let values = ["Navy", "Army", "Navy", "", "Army", "Navy", "Air Force", "", ""];
        let dataset = single_column("Military Status", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::MilitaryStatus]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 3, capacity(values.len(), 3));
        let branches = labels(&["Air Force", "Army", "Marine Corps", "Navy"]);
        DistributeMinLabelAssign {
            attribute: Attribute::MilitaryStatus,
            allowed: &branches,
            treat_missing_as_category: true,
            pending: &branches,
        }
        .assign(&mut table)
        .unwrap();

        assert_eq!(table.remaining(), 3);
        for team in 0..3 {
            for branch in &branches {
                assert!(table.label_count(team, Attribute::MilitaryStatus, branch) <= 1);
            }
            assert_eq!(table.label_count(team, Attribute::MilitaryStatus, "Navy"), 1);
        }
    }

    #[test]
    fn pending_labels_are_each_balanced() {
        let values = ["P", "P", "Q", "T", "P", "Q", "T", "Q", "T"];
        let dataset = single_column("PQT", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::Pqt]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 3, 3);
        let pqt = labels(&["P", "Q", "T"]);
        DistributeMinLabelAssign {
            attribute: Attribute::Pqt,
            allowed: &pqt,
            treat_missing_as_category: false,
            pending: &pqt,
        }
        .assign(&mut table)
        .unwrap();

        assert_eq!(table.remaining(), 0);
        for team in 0..3 {
            for label in &pqt {
                assert_eq!(table.label_count(team, Attribute::Pqt, label), 1);
            }
        }
    }

    #[test]
    fn empty_pending_only_places_rarest_label() {
        let values = ["US", "FN", "US", "US", "FN", "US"];
        let dataset = single_column("Citizenship Status", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::CitizenshipStatus]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 2, 3);
        let allowed = labels(&["FN", "US"]);
        DistributeMinLabelAssign {
            attribute: Attribute::CitizenshipStatus,
            allowed: &allowed,
            treat_missing_as_category: false,
            pending: &[],
        }
        .assign(&mut table)
        .unwrap();

        assert_eq!(table.remaining(), 4);
        assert_eq!(table.label_count(0, Attribute::CitizenshipStatus, "FN"), 1);
        assert_eq!(table.label_count(1, Attribute::CitizenshipStatus, "FN"), 1);
    }

    #[test]
    fn threshold_rises_when_every_team_has_its_share() {
        let values = ["Q", "Q", "Q", "Q", "Q"];
        let dataset = single_column("PQT", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::Pqt]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 2, 3);
        let pqt = labels(&["P", "Q", "T"]);
        DistributeMinLabelAssign {
            attribute: Attribute::Pqt,
            allowed: &pqt,
            treat_missing_as_category: false,
            pending: &pqt,
        }
        .assign(&mut table)
        .unwrap();

        assert_eq!(table.remaining(), 0);
        assert_eq!(table.size(0), 3);
        assert_eq!(table.size(1), 2);
    }

    #[test]
    fn observed_labels_place_rarest_first() {
        let values = ["USA", "India", "USA", "Chile", "India", "USA"];
        let dataset = single_column("Primary Citizenship", &values);
        let columns = ColumnCache::build(&dataset, [Attribute::PrimaryCitizenship]);
        let mut table = TableCache::new(&columns, (0..values.len()).collect(), 3, 2);
        let strategy = Attribute::PrimaryCitizenship.entry().strategy.unwrap();
        crate::strategy::apply(Attribute::PrimaryCitizenship, &strategy, &mut table).unwrap();

        assert_eq!(table.pending(), vec![0, 1, 2, 4, 5]);
        assert_eq!(table.label_count(0, Attribute::PrimaryCitizenship, "Chile"), 1);
    }
}
