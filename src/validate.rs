//! Dataset checks run once before any trial.
//!
//! Each active criterion's column is checked against its catalog
//! [`ValueRule`]. A column named [`TEAM_COLUMN`] is always rejected since the
//! engine writes one of its own.

use thiserror::Error;

use crate::catalog::{Attribute, RankingCriterion, ValueRule};
use crate::model::entity::{Dataset, Tag, Value};
use crate::model::group::TEAM_COLUMN;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid `{attribute}` column: {reason}")]
pub struct ValidationError {
    pub attribute: String,
    pub reason: ValidationReason,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationReason {
    #[error("column is missing")]
    MissingColumn,
    #[error("value `{0}` is not allowed")]
    DisallowedValue(Tag),
    #[error("column must be numeric")]
    NotNumeric,
    #[error("column name is reserved for the team assignment")]
    ForbiddenColumn,
}

impl ValidationError {
    fn new(attribute: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            attribute: attribute.into(),
            reason,
        }
    }
}

pub fn validate(dataset: &Dataset, criteria: &[RankingCriterion]) -> Result<(), ValidationError> {
    for criterion in criteria {
        let entry = criterion.attribute.entry();
        check_column(dataset, entry.attribute, entry.rule)?;
        if let Some(companion) = entry.companion {
            if dataset.has_column(companion.column()) {
                check_column(dataset, companion, companion.entry().rule)?;
            }
        }
    }

    if dataset.has_column(TEAM_COLUMN) {
        return Err(ValidationError::new(TEAM_COLUMN, ValidationReason::ForbiddenColumn));
    }
    Ok(())
}

fn check_column(dataset: &Dataset, attribute: Attribute, rule: ValueRule) -> Result<(), ValidationError> {
    let column = attribute.column();
    if !dataset.has_column(column) {
        return Err(ValidationError::new(column, ValidationReason::MissingColumn));
    }

    match rule {
        ValueRule::Present => Ok(()),
        ValueRule::OneOf(allowed) => {
            for value in dataset.column(column) {
                let tag = value.tag().unwrap_or_default();
                if !allowed.iter().any(|label| *label == tag) {
                    return Err(ValidationError::new(column, ValidationReason::DisallowedValue(tag)));
                }
            }
            Ok(())
        }
        ValueRule::Numeric => {
            let textual = dataset
                .column(column)
                .any(|value| matches!(value, Value::Text(_)) && !value.is_empty());
            if textual {
                Err(ValidationError::new(column, ValidationReason::NotNumeric))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Record;

    fn dataset(rows: Vec<Record>) -> Dataset {
        Dataset::new(rows).unwrap()
    }

    fn criteria(attributes: &[Attribute]) -> Vec<RankingCriterion> {
        RankingCriterion::ranked(attributes.iter().copied())
    }

    #[test]
    fn missing_column_names_attribute() {
        let data = dataset(vec![Record::new().with("Gender", "Man")]);
        let err = validate(&data, &criteria(&[Attribute::Gender, Attribute::Age])).unwrap_err();
        assert_eq!(err, ValidationError::new("Age", ValidationReason::MissingColumn));
    }

    #[test]
    fn disallowed_label_is_reported() {
        let data = dataset(vec![
            Record::new().with("PQT", "P"),
            Record::new().with("PQT", "X"),
        ]);
        let err = validate(&data, &criteria(&[Attribute::Pqt])).unwrap_err();
        assert_eq!(err.attribute, "PQT");
        assert_eq!(err.reason, ValidationReason::DisallowedValue("X".to_owned()));
    }

    #[test]
    fn empty_cells_need_an_empty_label() {
        let data = dataset(vec![
            Record::new().with("Military Status", "Navy").with("Gender", "Woman"),
            Record::new().with("Military Status", "").with("Gender", Value::Empty),
        ]);
        assert!(validate(&data, &criteria(&[Attribute::MilitaryStatus])).is_ok());
        let err = validate(&data, &criteria(&[Attribute::Gender])).unwrap_err();
        assert_eq!(err.reason, ValidationReason::DisallowedValue(String::new()));
    }

    #[test]
    fn age_must_be_numeric() {
        let numeric = dataset(vec![
            Record::new().with("Age", 31),
            Record::new().with("Age", Value::Empty),
        ]);
        assert!(validate(&numeric, &criteria(&[Attribute::Age])).is_ok());

        let textual = dataset(vec![Record::new().with("Age", "thirty")]);
        let err = validate(&textual, &criteria(&[Attribute::Age])).unwrap_err();
        assert_eq!(err, ValidationError::new("Age", ValidationReason::NotNumeric));
    }

    #[test]
    fn team_column_is_always_forbidden() {
        let data = dataset(vec![Record::new().with("Team", 1).with("Industry", "Tech")]);
        let err = validate(&data, &[]).unwrap_err();
        assert_eq!(err.reason, ValidationReason::ForbiddenColumn);
        let err = validate(&data, &criteria(&[Attribute::Industry])).unwrap_err();
        assert_eq!(err.attribute, "Team");
    }

    #[test]
    fn continent_checked_with_citizenship() {
        let data = dataset(vec![
            Record::new().with("Citizenship Status", "FN").with("Continent", "Atlantis"),
        ]);
        assert!(validate(&data, &[]).is_ok());
        let err = validate(&data, &criteria(&[Attribute::CitizenshipStatus])).unwrap_err();
        assert_eq!(err.attribute, "Continent");
    }

    #[test]
    fn open_attributes_only_need_the_column() {
        let data = dataset(vec![Record::new().with("Employer", "Acme").with("Ethnicity", "")]);
        assert!(validate(&data, &criteria(&[Attribute::Employer, Attribute::Ethnicity])).is_ok());
        let err = validate(&data, &criteria(&[Attribute::Function])).unwrap_err();
        assert_eq!(err.reason, ValidationReason::MissingColumn);
    }
}
