use std::collections::HashMap;

use itertools::Itertools;

use crate::action::{Action, ActionError, Index};
use crate::catalog::Attribute;
use crate::error::InvariantViolation;
use crate::model::entity::{Dataset, RowId, Tag};
use crate::model::group::Team;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TagCounter(HashMap<Tag, usize>);

impl<'a> FromIterator<&'a str> for TagCounter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(tags: I) -> Self {
        let mut counter = TagCounter::default();
        for tag in tags {
            counter.add(tag);
        }
        counter
    }
}

impl TagCounter {
    pub fn add(&mut self, tag: &str) {
        match self.0.get_mut(tag) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(tag.to_owned(), 1);
            }
        }
    }

    pub fn remove(&mut self, tag: &str) {
        if let Some(count) = self.0.get_mut(tag) {
            *count -= 1;
            if *count == 0 {
                self.0.remove(tag);
            }
        }
    }

    pub fn count(&self, tag: &str) -> usize {
        self.0.get(tag).copied().unwrap_or(0)
    }

    pub fn count_any(&self, tags: &[Tag]) -> usize {
        tags.iter().map(|tag| self.count(tag)).sum()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    pub fn distinct(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn has_duplicates(&self) -> bool {
        self.0.values().any(|count| *count > 1)
    }
}

/// Per-run view of the ranked columns, resolved once from the dataset.
#[derive(Debug, Clone, Default)]
pub(crate) struct ColumnCache {
    tags: HashMap<Attribute, Vec<Option<Tag>>>,
    numbers: HashMap<Attribute, Vec<Option<f64>>>,
    frequencies: HashMap<Attribute, TagCounter>,
    observed: HashMap<Attribute, Vec<Tag>>,
}

impl ColumnCache {
    pub fn build(dataset: &Dataset, attributes: impl IntoIterator<Item = Attribute>) -> ColumnCache {
        let mut cache = ColumnCache::default();
        for attribute in attributes {
            let column = attribute.column();
            if cache.tags.contains_key(&attribute) || !dataset.has_column(column) {
                continue;
            }
            let tags: Vec<Option<Tag>> = dataset.column(column).map(|value| value.tag()).collect();
            let numbers = dataset.column(column).map(|value| value.as_number()).collect();
            let frequencies: TagCounter = tags.iter().flatten().map(String::as_str).collect();
            let observed: Vec<Tag> = tags.iter().flatten().unique().cloned().collect();
            cache.tags.insert(attribute, tags);
            cache.numbers.insert(attribute, numbers);
            cache.frequencies.insert(attribute, frequencies);
            cache.observed.insert(attribute, observed);
        }
        cache
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.tags.keys().copied()
    }

    pub fn tag(&self, attribute: Attribute, row: RowId) -> Option<&Tag> {
        self.tags.get(&attribute)?.get(row)?.as_ref()
    }

    pub fn number(&self, attribute: Attribute, row: RowId) -> Option<f64> {
        *self.numbers.get(&attribute)?.get(row)?
    }

    /// Occurrences of `tag` across the whole dataset.
    pub fn frequency(&self, attribute: Attribute, tag: &str) -> usize {
        self.frequencies.get(&attribute).map_or(0, |counter| counter.count(tag))
    }

    pub fn observed(&self, attribute: Attribute) -> &[Tag] {
        self.observed.get(&attribute).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
struct TeamCache {
    members: Vec<RowId>,
    tagcounts: HashMap<Attribute, TagCounter>,
}

impl TeamCache {
    fn add(&mut self, row: RowId, columns: &ColumnCache) {
        for attribute in columns.attributes() {
            if let Some(tag) = columns.tag(attribute, row) {
                self.tagcounts.entry(attribute).or_default().add(tag);
            }
        }
        self.members.push(row);
    }

    fn remove(&mut self, row: RowId, columns: &ColumnCache) {
        for attribute in columns.attributes() {
            if let (Some(tag), Some(counter)) = (columns.tag(attribute, row), self.tagcounts.get_mut(&attribute)) {
                counter.remove(tag);
            }
        }
        self.members.retain(|member| *member != row);
    }
}

/// Working state of one trial: the shuffled remainder and the teams built so far.
pub(crate) struct TableCache<'a> {
    columns: &'a ColumnCache,
    order: Vec<RowId>,
    placement: Vec<Option<Index>>,
    remaining: usize,
    teams: Vec<TeamCache>,
    capacity: usize,
}

impl<'a> TableCache<'a> {
    pub fn new(columns: &'a ColumnCache, order: Vec<RowId>, team_count: usize, capacity: usize) -> TableCache<'a> {
        let rows = order.len();
        TableCache {
            columns,
            order,
            placement: vec![None; rows],
            remaining: rows,
            teams: vec![TeamCache::default(); team_count],
            capacity,
        }
    }

    pub fn columns(&self) -> &'a ColumnCache {
        self.columns
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn size(&self, team: Index) -> usize {
        self.teams[team].members.len()
    }

    pub fn is_full(&self, team: Index) -> bool {
        self.size(team) >= self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Unassigned rows in shuffled order.
    pub fn pending(&self) -> Vec<RowId> {
        self.order
            .iter()
            .copied()
            .filter(|row| self.placement[*row].is_none())
            .collect()
    }

    pub fn tag(&self, attribute: Attribute, row: RowId) -> Option<&'a Tag> {
        self.columns.tag(attribute, row)
    }

    pub fn members(&self, team: Index) -> &[RowId] {
        &self.teams[team].members
    }

    /// Labels of `attribute` held by `team`, kept in step with every action.
    pub fn counter(&self, team: Index, attribute: Attribute) -> Option<&TagCounter> {
        self.teams[team].tagcounts.get(&attribute)
    }

    pub fn label_count(&self, team: Index, attribute: Attribute, tag: &str) -> usize {
        self.counter(team, attribute).map_or(0, |counter| counter.count(tag))
    }

    pub fn labels_count(&self, team: Index, attribute: Attribute, tags: &[Tag]) -> usize {
        self.counter(team, attribute).map_or(0, |counter| counter.count_any(tags))
    }

    pub fn has_label(&self, team: Index, attribute: Attribute, tag: &str) -> bool {
        self.counter(team, attribute).is_some_and(|counter| counter.contains(tag))
    }

    pub fn distinct_labels(&self, team: Index, attribute: Attribute) -> usize {
        self.counter(team, attribute).map_or(0, TagCounter::distinct)
    }

    pub fn act(&mut self, action: Action) -> Result<(), ActionError> {
        let columns = self.columns;
        match action {
            Action::Assign { row, team } => {
                if team >= self.teams.len() {
                    return Err(ActionError::UnknownTeam(team));
                }
                let slot = self.placement.get_mut(row).ok_or(ActionError::UnknownRow(row))?;
                if slot.is_some() {
                    return Err(ActionError::AlreadyAssigned(row));
                }
                *slot = Some(team);
                self.remaining -= 1;
                self.teams[team].add(row, columns);
                Ok(())
            }
            Action::Move { row, to } => {
                if to >= self.teams.len() {
                    return Err(ActionError::UnknownTeam(to));
                }
                let slot = self.placement.get_mut(row).ok_or(ActionError::UnknownRow(row))?;
                let from = slot.ok_or(ActionError::NotAssigned(row))?;
                if from == to {
                    return Ok(());
                }
                *slot = Some(to);
                self.teams[from].remove(row, columns);
                self.teams[to].add(row, columns);
                Ok(())
            }
        }
    }

    pub fn check(&self, expected: usize) -> Result<(), InvariantViolation> {
        if self.remaining != 0 {
            return Err(InvariantViolation::Unassigned { remaining: self.remaining });
        }
        for (index, team) in self.teams.iter().enumerate() {
            if team.members.len() > self.capacity {
                return Err(InvariantViolation::OverCapacity {
                    team: index + 1,
                    size: team.members.len(),
                    capacity: self.capacity,
                });
            }
        }
        let assigned: usize = self.teams.iter().map(|team| team.members.len()).sum();
        if assigned != expected {
            return Err(InvariantViolation::CountMismatch { assigned, expected });
        }
        Ok(())
    }

    pub fn into_teams(self) -> Vec<Team> {
        self.teams
            .into_iter()
            .enumerate()
            .map(|(index, team)| Team {
                number: index + 1,
                members: team.members,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::model::entity::{Dataset, Record};

    /// A dataset with a single column holding `values`.
    pub fn single_column(column: &str, values: &[&str]) -> Dataset {
        let records = values
            .iter()
            .map(|value| Record::new().with(column, *value))
            .collect();
        Dataset::new(records).unwrap()
    }
}
