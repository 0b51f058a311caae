//! Multi-restart search over shuffled trials.
//!
//! Each trial shuffles the dataset, runs the ranked strategies in order and
//! sends leftovers to the smallest teams. The search keeps the trial whose
//! team scores lie closest together.

use rand::prelude::SliceRandom;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cache::{ColumnCache, TableCache};
use crate::catalog::RankingCriterion;
use crate::config::SearchConfig;
use crate::control::{CancellationToken, Progress, ProgressSink};
use crate::error::{Error, InvariantViolation};
use crate::model::condition::{capacity, weights, Score};
use crate::model::entity::{Dataset, Record, RowId};
use crate::model::group::Team;
use crate::score::{spread, Scorer};
use crate::strategy::{self, Assign, AssignRemaining};
use crate::validate::validate;

/// One complete partition of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub teams: Vec<Team>,
    pub seed: u64,
    pub score: Score,
}

impl Trial {
    /// Every record tagged with its team number, team by team.
    pub fn annotated(&self, dataset: &Dataset) -> Vec<Record> {
        self.teams.iter().flat_map(|team| team.annotated(dataset)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Lowest-spread trial, `None` when cancelled before the first one finished.
    pub best: Option<Trial>,
    pub completed: usize,
    pub cancelled: bool,
}

struct SeedSequence {
    base: u64,
}

impl SeedSequence {
    fn new(seed: Option<u64>) -> SeedSequence {
        SeedSequence {
            base: seed.unwrap_or_else(rand::random),
        }
    }

    fn seed(&self, index: usize) -> u64 {
        self.base.wrapping_add(index as u64)
    }
}

struct State {
    best: Option<Trial>,
    completed: usize,
}

impl State {
    fn consider(&mut self, index: usize, trial: Trial) {
        debug!(trial = index, seed = trial.seed, score = trial.score, "trial finished");
        if self.best.as_ref().map_or(true, |best| trial.score < best.score) {
            self.best = Some(trial);
        }
        self.completed += 1;
    }
}

pub struct Engine {
    dataset: Dataset,
    criteria: Vec<RankingCriterion>,
    team_count: usize,
    capacity: usize,
    weights: Vec<Score>,
    columns: ColumnCache,
    config: SearchConfig,
}

impl Engine {
    /// Checks the inputs and prepares the per-run caches. Fails before any trial
    /// when the dataset does not match the ranked attributes.
    pub fn new(
        dataset: Dataset,
        mut criteria: Vec<RankingCriterion>,
        team_count: usize,
        config: SearchConfig,
    ) -> Result<Engine, Error> {
        config.validate()?;
        if team_count == 0 || team_count > dataset.len() {
            return Err(Error::TeamCount {
                teams: team_count,
                records: dataset.len(),
            });
        }
        criteria.sort_by_key(|criterion| criterion.priority);
        validate(&dataset, &criteria)?;

        let columns = ColumnCache::build(&dataset, criteria.iter().map(|criterion| criterion.attribute));
        Ok(Engine {
            capacity: capacity(dataset.len(), team_count),
            weights: weights(criteria.len()),
            dataset,
            criteria,
            team_count,
            columns,
            config,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn criteria(&self) -> &[RankingCriterion] {
        &self.criteria
    }

    pub fn team_count(&self) -> usize {
        self.team_count
    }

    /// Maximum team size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn weights(&self) -> &[Score] {
        &self.weights
    }

    fn scorer(&self) -> Scorer<'_> {
        Scorer::new(&self.columns, &self.criteria, &self.weights)
    }

    pub fn score_teams(&self, teams: &[Team]) -> Vec<Score> {
        let scorer = self.scorer();
        teams.iter().map(|team| scorer.score_team(&team.members)).collect()
    }

    /// Runs a single trial; the same seed always yields the same teams.
    pub fn trial(&self, seed: u64) -> Result<Trial, InvariantViolation> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut order: Vec<RowId> = (0..self.dataset.len()).collect();
        order.shuffle(&mut rng);

        let mut table = TableCache::new(&self.columns, order, self.team_count, self.capacity);
        for criterion in &self.criteria {
            if let Some(strategy) = &criterion.strategy {
                strategy::apply(criterion.attribute, strategy, &mut table)?;
            }
        }
        if table.remaining() > 0 {
            AssignRemaining.assign(&mut table)?;
        }
        table.check(self.dataset.len())?;

        let score = spread(&self.scorer().score_table(&table));
        let teams = table.into_teams();
        Ok(Trial { teams, seed, score })
    }

    pub fn run<P: ProgressSink>(&self, progress: &mut P, cancel: &CancellationToken) -> Result<Outcome, Error> {
        let seeds = SeedSequence::new(self.config.seed);
        let total = self.config.iterations;
        debug!(base_seed = seeds.base, total, capacity = self.capacity, "starting search");

        let mut state = State { best: None, completed: 0 };
        let mut cancelled = false;
        let mut start = 0;
        while start < total {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if self.config.parallel {
                let end = (start + self.config.batch_size).min(total);
                let trials: Vec<Result<Trial, InvariantViolation>> = (start..end)
                    .into_par_iter()
                    .map(|index| self.trial(seeds.seed(index)))
                    .collect();
                for (index, trial) in (start..end).zip(trials) {
                    state.consider(index, trial?);
                }
                start = end;
            } else {
                state.consider(start, self.trial(seeds.seed(start))?);
                start += 1;
            }
            progress.report(Progress { completed: state.completed, total });
        }

        let rankings: Vec<&str> = self.criteria.iter().map(|criterion| criterion.attribute.column()).collect();
        match &state.best {
            Some(best) => info!(
                score = best.score,
                seed = best.seed,
                ?rankings,
                trials = state.completed,
                cancelled,
                "search finished"
            ),
            None => info!(cancelled, "search finished without a trial"),
        }
        Ok(Outcome {
            best: state.best,
            completed: state.completed,
            cancelled,
        })
    }
}

/// Validates the inputs and runs the full search.
pub fn balance<P: ProgressSink>(
    dataset: Dataset,
    criteria: Vec<RankingCriterion>,
    team_count: usize,
    config: SearchConfig,
    progress: &mut P,
    cancel: &CancellationToken,
) -> Result<Outcome, Error> {
    Engine::new(dataset, criteria, team_count, config)?.run(progress, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Attribute;
    use crate::control::NoProgress;

    fn gender_dataset() -> Dataset {
        let genders = ["Woman", "Man", "Man", "Woman", "Man", "Man", "Woman", "Man", "Man", "Woman", "Man", "Man"];
        Dataset::new(genders.iter().map(|gender| Record::new().with("Gender", *gender)).collect()).unwrap()
    }

    fn engine(iterations: usize) -> Engine {
        Engine::new(
            gender_dataset(),
            RankingCriterion::ranked([Attribute::Gender]),
            3,
            SearchConfig::default().with_iterations(iterations).with_seed(11),
        )
        .unwrap()
    }

    #[test]
    fn team_count_must_fit_dataset() {
        let err = Engine::new(gender_dataset(), Vec::new(), 13, SearchConfig::default()).err();
        assert!(matches!(err, Some(Error::TeamCount { teams: 13, records: 12 })));
        let err = Engine::new(gender_dataset(), Vec::new(), 0, SearchConfig::default()).err();
        assert!(matches!(err, Some(Error::TeamCount { teams: 0, .. })));
    }

    #[test]
    fn criteria_run_in_priority_order() {
        let dataset = Dataset::new(vec![Record::new().with("Gender", "Man").with("Age", 30)]).unwrap();
        let criteria = vec![
            RankingCriterion::new(Attribute::Age, 1),
            RankingCriterion::new(Attribute::Gender, 0),
        ];
        let engine = Engine::new(dataset, criteria, 1, SearchConfig::default()).unwrap();
        assert_eq!(engine.criteria()[0].attribute, Attribute::Gender);
        assert_eq!(engine.weights().len(), 2);
    }

    #[test]
    fn best_trial_has_lowest_score() {
        let engine = engine(20);
        let outcome = engine.run(&mut NoProgress, &CancellationToken::new()).unwrap();
        let best = outcome.best.unwrap();
        for index in 0..20 {
            assert!(engine.trial(11 + index).unwrap().score >= best.score);
        }
        assert_eq!(outcome.completed, 20);
    }

    #[test]
    fn trial_score_is_spread_of_team_scores() {
        let engine = engine(1);
        for seed in 0..10 {
            let trial = engine.trial(seed).unwrap();
            assert_eq!(trial.score, crate::score::spread(&engine.score_teams(&trial.teams)));
        }
    }

    #[test]
    fn invalid_dataset_runs_no_trial() {
        let mut reports = 0;
        let result = balance(
            gender_dataset(),
            RankingCriterion::ranked([Attribute::Age]),
            2,
            SearchConfig::default().with_iterations(5),
            &mut |_: Progress| reports += 1,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(Error::Validation(ref e)) if e.attribute == "Age"));
        assert_eq!(reports, 0);
    }
}
