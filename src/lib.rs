//! Splits a population of records into a fixed number of teams balanced
//! across ranked attributes.
//!
//! The search is a randomized multi-restart heuristic: every trial shuffles
//! the records, runs the strategy of each ranked attribute in priority
//! order and scores the resulting teams. The trial with the smallest
//! spread between team scores wins.

mod action;
mod cache;
pub mod catalog;
pub mod config;
pub mod control;
pub mod error;
pub mod model;
pub mod score;
pub mod search;
mod strategy;
pub mod validate;

pub use action::ActionError;
pub use catalog::{Attribute, CatalogEntry, Labels, RankingCriterion, ScoreRule, Strategy, ValueRule};
pub use config::SearchConfig;
pub use control::{CancellationToken, NoProgress, Progress, ProgressSink};
pub use error::{Error, InvariantViolation, SchemaError};
pub use model::condition::{capacity, weights, Score};
pub use model::entity::{Dataset, Record, RowId, Tag, Value};
pub use model::group::{Team, TEAM_COLUMN};
pub use search::{balance, Engine, Outcome, Trial};
pub use validate::{validate, ValidationError, ValidationReason};
