use itertools::Itertools;

use crate::cache::{ColumnCache, TableCache, TagCounter};
use crate::catalog::{Attribute, RankingCriterion, ScoreRule};
use crate::model::condition::Score;
use crate::model::entity::RowId;

/// Largest absolute difference between any two scores; zero for fewer than two.
pub fn spread(scores: &[Score]) -> Score {
    scores
        .iter()
        .tuple_combinations()
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, Score::max)
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub(crate) struct Scorer<'a> {
    columns: &'a ColumnCache,
    rules: Vec<(Attribute, ScoreRule, Score)>,
}

impl<'a> Scorer<'a> {
    pub fn new(columns: &'a ColumnCache, criteria: &[RankingCriterion], weights: &[Score]) -> Scorer<'a> {
        let rules = criteria
            .iter()
            .zip(weights)
            .map(|(criterion, weight)| (criterion.attribute, criterion.attribute.entry().scoring, *weight))
            .collect();
        Scorer { columns, rules }
    }

    pub fn score_team(&self, members: &[RowId]) -> Score {
        if members.is_empty() {
            return 0.0;
        }
        self.rules
            .iter()
            .map(|(attribute, rule, weight)| {
                let tags: TagCounter = members
                    .iter()
                    .filter_map(|row| self.columns.tag(*attribute, *row))
                    .map(String::as_str)
                    .collect();
                weight * self.term(*attribute, *rule, &tags, members)
            })
            .sum()
    }

    /// Scores every team of a working table from the label counts it already keeps.
    pub fn score_table(&self, table: &TableCache<'_>) -> Vec<Score> {
        let none = TagCounter::default();
        (0..table.team_count())
            .map(|team| -> Score {
                let members = table.members(team);
                if members.is_empty() {
                    return 0.0;
                }
                self.rules
                    .iter()
                    .map(|(attribute, rule, weight)| {
                        let tags = table.counter(team, *attribute).unwrap_or(&none);
                        weight * self.term(*attribute, *rule, tags, members)
                    })
                    .sum()
            })
            .collect()
    }

    fn term(&self, attribute: Attribute, rule: ScoreRule, tags: &TagCounter, members: &[RowId]) -> Score {
        match rule {
            ScoreRule::Presence(labels) => labels.iter().map(|label| tags.count(label)).sum::<usize>() as Score,
            ScoreRule::Uniqueness => {
                let present = tags.total() as Score;
                if tags.has_duplicates() {
                    -2.0 * present
                } else {
                    present
                }
            }
            ScoreRule::BoundedDiversity { max } => {
                let distinct = tags.distinct();
                if distinct > max {
                    -2.0 * distinct as Score
                } else {
                    distinct as Score
                }
            }
            ScoreRule::ThreeWayBalance([p, q, t]) => {
                let (p, q, t) = (tags.count(p) as Score, tags.count(q) as Score, tags.count(t) as Score);
                (p - q).abs() + (q - t).abs() + (p - t).abs()
            }
            ScoreRule::ThresholdPenalty(label) => match tags.count(label) {
                1 => -1.0,
                count => count as Score,
            },
            ScoreRule::Diversity => tags.distinct() as Score,
            ScoreRule::Median => {
                let mut ages: Vec<f64> = members
                    .iter()
                    .filter_map(|row| self.columns.number(attribute, *row))
                    .collect();
                median(&mut ages).unwrap_or(0.0)
            }
        }
    }
}
