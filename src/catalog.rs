//! The fixed catalog of attributes the engine knows how to balance.
//!
//! Every attribute maps to one [`CatalogEntry`] carrying how its column is
//! validated, how its rows are distributed and how a team is scored on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::entity::Tag;

const GENDERS: &[&str] = &[
    "Man",
    "Woman",
    "Nonbinary",
    "Decline to State",
    "Transgender Woman/Trans Woman",
    "Transgender Male/Trans Man",
    "Genderqueer/Gender Non-Conforming",
    "Different Identity",
];
const WOMEN: &[&str] = &["Woman", "Transgender Woman/Trans Woman"];
const UNDERREPRESENTED: &str = "Underrepresented";
const BRANCHES: &[&str] = &["Air Force", "Army", "Marine Corps", "Navy"];
const CITIZENSHIP: &[&str] = &["FN", "US", "PR"];
const PQT: [&str; 3] = ["P", "Q", "T"];
const CONTINENTS: &[&str] = &[
    "North America",
    "South America",
    "Europe",
    "Africa",
    "Asia",
    "Australia",
    "Antarctica",
    "Antartica",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    Gender,
    #[serde(rename = "UR", alias = "Underrepresented")]
    Underrepresented,
    #[serde(rename = "Military Status")]
    MilitaryStatus,
    #[serde(rename = "Citizenship Status")]
    CitizenshipStatus,
    #[serde(rename = "Primary Citizenship")]
    PrimaryCitizenship,
    #[serde(rename = "PQT")]
    Pqt,
    Continent,
    Ethnicity,
    Industry,
    Employer,
    Function,
    #[serde(rename = "UG School Name")]
    SchoolName,
    #[serde(rename = "UG School Major", alias = "Degree Major")]
    SchoolMajor,
    #[serde(rename = "UG School Country")]
    SchoolCountry,
    #[serde(alias = "Time Zone")]
    Timezone,
    Age,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown attribute `{0}`")]
pub struct UnknownAttribute(pub String);

/// What a column must contain before any trial runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRule {
    Present,
    /// Every cell must carry one of these labels; `""` admits empty cells.
    OneOf(&'static [&'static str]),
    Numeric,
}

/// How a team is scored on one attribute, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreRule {
    /// Number of members carrying any of the labels.
    Presence(&'static [&'static str]),
    /// Non-empty count, or `-2 ×` that count when a label repeats.
    Uniqueness,
    /// Distinct labels, or `-2 ×` that number above `max`.
    BoundedDiversity { max: usize },
    /// Sum of pairwise count differences between the three labels.
    ThreeWayBalance([&'static str; 3]),
    /// `-1` for a single member carrying the label, the count otherwise.
    ThresholdPenalty(&'static str),
    /// Distinct labels.
    Diversity,
    /// Median of the numeric values.
    Median,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Labels {
    Fixed(Vec<Tag>),
    /// Every label present in the dataset, in first-seen order.
    Observed,
}

/// Distribution policy run for an attribute during a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    MinDistribute { targets: Vec<Tag>, min_count: usize },
    DistributeMinLabel {
        allowed: Labels,
        treat_missing_as_category: bool,
        pending: Vec<Tag>,
    },
    FillRemaining,
    NoMoreThan { max_distinct: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub attribute: Attribute,
    pub rule: ValueRule,
    pub strategy: Option<Strategy>,
    pub scoring: ScoreRule,
    /// Column validated alongside this one when it is present in the data.
    pub companion: Option<Attribute>,
}

fn tags(labels: &[&str]) -> Vec<Tag> {
    labels.iter().map(|label| label.to_string()).collect()
}

impl Attribute {
    pub const ALL: [Attribute; 16] = [
        Attribute::Gender,
        Attribute::Underrepresented,
        Attribute::MilitaryStatus,
        Attribute::CitizenshipStatus,
        Attribute::PrimaryCitizenship,
        Attribute::Pqt,
        Attribute::Continent,
        Attribute::Ethnicity,
        Attribute::Industry,
        Attribute::Employer,
        Attribute::Function,
        Attribute::SchoolName,
        Attribute::SchoolMajor,
        Attribute::SchoolCountry,
        Attribute::Timezone,
        Attribute::Age,
    ];

    /// Column name the attribute is read from.
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Gender => "Gender",
            Attribute::Underrepresented => "UR",
            Attribute::MilitaryStatus => "Military Status",
            Attribute::CitizenshipStatus => "Citizenship Status",
            Attribute::PrimaryCitizenship => "Primary Citizenship",
            Attribute::Pqt => "PQT",
            Attribute::Continent => "Continent",
            Attribute::Ethnicity => "Ethnicity",
            Attribute::Industry => "Industry",
            Attribute::Employer => "Employer",
            Attribute::Function => "Function",
            Attribute::SchoolName => "UG School Name",
            Attribute::SchoolMajor => "UG School Major",
            Attribute::SchoolCountry => "UG School Country",
            Attribute::Timezone => "Timezone",
            Attribute::Age => "Age",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Attribute::Underrepresented => &["Underrepresented"],
            Attribute::SchoolMajor => &["Degree Major"],
            Attribute::Timezone => &["Time Zone"],
            _ => &[],
        }
    }

    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| {
                attribute.column() == name || attribute.aliases().iter().any(|alias| *alias == name)
            })
    }

    pub fn entry(self) -> CatalogEntry {
        let diversity = |strategy| CatalogEntry {
            attribute: self,
            rule: ValueRule::Present,
            strategy,
            scoring: ScoreRule::Diversity,
            companion: None,
        };
        match self {
            Attribute::Gender => CatalogEntry {
                attribute: self,
                rule: ValueRule::OneOf(GENDERS),
                strategy: Some(Strategy::MinDistribute { targets: tags(WOMEN), min_count: 2 }),
                scoring: ScoreRule::Presence(WOMEN),
                companion: None,
            },
            Attribute::Underrepresented => CatalogEntry {
                attribute: self,
                rule: ValueRule::OneOf(&[UNDERREPRESENTED, ""]),
                strategy: Some(Strategy::MinDistribute {
                    targets: tags(&[UNDERREPRESENTED]),
                    min_count: 2,
                }),
                scoring: ScoreRule::ThresholdPenalty(UNDERREPRESENTED),
                companion: None,
            },
            Attribute::MilitaryStatus => CatalogEntry {
                attribute: self,
                rule: ValueRule::OneOf(&["Army", "Air Force", "Navy", "Marine Corps", ""]),
                strategy: Some(Strategy::DistributeMinLabel {
                    allowed: Labels::Fixed(tags(BRANCHES)),
                    treat_missing_as_category: true,
                    pending: tags(BRANCHES),
                }),
                scoring: ScoreRule::Uniqueness,
                companion: None,
            },
            Attribute::CitizenshipStatus => CatalogEntry {
                attribute: self,
                rule: ValueRule::OneOf(CITIZENSHIP),
                strategy: Some(Strategy::DistributeMinLabel {
                    allowed: Labels::Fixed(tags(&["FN", "US"])),
                    treat_missing_as_category: false,
                    pending: Vec::new(),
                }),
                scoring: ScoreRule::Presence(&["FN"]),
                companion: Some(Attribute::Continent),
            },
            Attribute::PrimaryCitizenship => diversity(Some(Strategy::DistributeMinLabel {
                allowed: Labels::Observed,
                treat_missing_as_category: false,
                pending: Vec::new(),
            })),
            Attribute::Pqt => CatalogEntry {
                attribute: self,
                rule: ValueRule::OneOf(&PQT),
                strategy: Some(Strategy::DistributeMinLabel {
                    allowed: Labels::Fixed(tags(&PQT)),
                    treat_missing_as_category: false,
                    pending: tags(&PQT),
                }),
                scoring: ScoreRule::ThreeWayBalance(PQT),
                companion: None,
            },
            Attribute::Continent => CatalogEntry {
                rule: ValueRule::OneOf(CONTINENTS),
                ..diversity(None)
            },
            Attribute::Ethnicity
            | Attribute::Industry
            | Attribute::Employer
            | Attribute::Function
            | Attribute::SchoolName
            | Attribute::SchoolMajor
            | Attribute::SchoolCountry => diversity(Some(Strategy::FillRemaining)),
            Attribute::Timezone => CatalogEntry {
                attribute: self,
                rule: ValueRule::Present,
                strategy: Some(Strategy::NoMoreThan { max_distinct: 2 }),
                scoring: ScoreRule::BoundedDiversity { max: 2 },
                companion: None,
            },
            Attribute::Age => CatalogEntry {
                attribute: self,
                rule: ValueRule::Numeric,
                strategy: None,
                scoring: ScoreRule::Median,
                companion: None,
            },
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Attribute::from_name(name).ok_or_else(|| UnknownAttribute(name.to_owned()))
    }
}

/// A ranked attribute with its resolved distribution strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingCriterion {
    pub attribute: Attribute,
    pub priority: usize,
    pub strategy: Option<Strategy>,
}

impl RankingCriterion {
    pub fn new(attribute: Attribute, priority: usize) -> RankingCriterion {
        RankingCriterion {
            attribute,
            priority,
            strategy: attribute.entry().strategy,
        }
    }

    /// Criteria ranked in iteration order, highest priority first.
    pub fn ranked(attributes: impl IntoIterator<Item = Attribute>) -> Vec<RankingCriterion> {
        attributes
            .into_iter()
            .enumerate()
            .map(|(priority, attribute)| RankingCriterion::new(attribute, priority))
            .collect()
    }

    pub fn with_strategy(mut self, strategy: Option<Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides the per-team minimum of a `MinDistribute` strategy.
    pub fn with_min_count(mut self, count: usize) -> Self {
        if let Some(Strategy::MinDistribute { min_count, .. }) = &mut self.strategy {
            *min_count = count;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_resolve() {
        for attribute in Attribute::ALL {
            assert_eq!(attribute.column().parse::<Attribute>(), Ok(attribute));
        }
        assert_eq!(Attribute::from_name("Time Zone"), Some(Attribute::Timezone));
        assert_eq!(Attribute::from_name("Degree Major"), Some(Attribute::SchoolMajor));
        assert_eq!(
            "Shoe Size".parse::<Attribute>(),
            Err(UnknownAttribute("Shoe Size".to_owned()))
        );
    }

    #[test]
    fn serde_uses_column_names() {
        let attribute: Attribute = serde_json::from_str(r#""Military Status""#).unwrap();
        assert_eq!(attribute, Attribute::MilitaryStatus);
        let alias: Attribute = serde_json::from_str(r#""Time Zone""#).unwrap();
        assert_eq!(alias, Attribute::Timezone);
        assert_eq!(serde_json::to_string(&Attribute::Pqt).unwrap(), r#""PQT""#);
    }

    #[test]
    fn min_count_override_only_touches_min_distribute() {
        let gender = RankingCriterion::new(Attribute::Gender, 0).with_min_count(3);
        assert_eq!(
            gender.strategy,
            Some(Strategy::MinDistribute { targets: tags(WOMEN), min_count: 3 })
        );
        let age = RankingCriterion::new(Attribute::Age, 1).with_min_count(3);
        assert_eq!(age.strategy, None);
    }

    #[test]
    fn ranked_assigns_priorities_in_order() {
        let criteria = RankingCriterion::ranked([Attribute::Pqt, Attribute::Gender]);
        assert_eq!(criteria[0].priority, 0);
        assert_eq!(criteria[1].attribute, Attribute::Gender);
        assert_eq!(criteria[1].priority, 1);
    }
}
