pub mod entity {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use crate::error::SchemaError;

    pub type RowId = usize;
    pub type Tag = String;

    /// One cell of a record.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Value {
        Number(f64),
        Text(String),
        Empty,
    }

    impl Value {
        pub fn is_empty(&self) -> bool {
            matches!(self, Value::Empty) || matches!(self, Value::Text(text) if text.is_empty())
        }

        /// The label used for grouping, `None` for empty cells.
        pub fn tag(&self) -> Option<Tag> {
            match self {
                Value::Empty => None,
                Value::Text(text) if text.is_empty() => None,
                Value::Text(text) => Some(text.clone()),
                Value::Number(n) => Some(n.to_string()),
            }
        }

        pub fn as_number(&self) -> Option<f64> {
            match self {
                Value::Number(n) => Some(*n),
                _ => None,
            }
        }
    }

    impl From<&str> for Value {
        fn from(text: &str) -> Self {
            Value::Text(text.to_owned())
        }
    }

    impl From<String> for Value {
        fn from(text: String) -> Self {
            Value::Text(text)
        }
    }

    impl From<f64> for Value {
        fn from(n: f64) -> Self {
            Value::Number(n)
        }
    }

    impl From<i32> for Value {
        fn from(n: i32) -> Self {
            Value::Number(n as f64)
        }
    }

    impl From<i64> for Value {
        fn from(n: i64) -> Self {
            Value::Number(n as f64)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Record(BTreeMap<String, Value>);

    impl Record {
        pub fn new() -> Record {
            Record::default()
        }

        pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Record {
            self.insert(column, value);
            self
        }

        pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
            self.0.insert(column.into(), value.into());
        }

        pub fn get(&self, column: &str) -> Option<&Value> {
            self.0.get(column)
        }

        pub fn columns(&self) -> impl Iterator<Item = &str> {
            self.0.keys().map(String::as_str)
        }
    }

    impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
        fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
            Record(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
        }
    }

    static EMPTY: Value = Value::Empty;

    /// Records sharing a single schema, addressed by [`RowId`].
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Dataset {
        columns: Vec<String>,
        records: Vec<Record>,
    }

    impl Dataset {
        pub fn new(records: Vec<Record>) -> Result<Dataset, SchemaError> {
            let columns: Vec<String> = records
                .first()
                .map(|record| record.columns().map(str::to_owned).collect())
                .unwrap_or_default();
            for (row, record) in records.iter().enumerate() {
                if !record.columns().eq(columns.iter().map(String::as_str)) {
                    return Err(SchemaError::Mismatch { row });
                }
            }
            Ok(Dataset { columns, records })
        }

        pub fn len(&self) -> usize {
            self.records.len()
        }

        pub fn is_empty(&self) -> bool {
            self.records.is_empty()
        }

        pub fn columns(&self) -> &[String] {
            &self.columns
        }

        pub fn has_column(&self, column: &str) -> bool {
            self.columns.iter().any(|c| c == column)
        }

        pub fn records(&self) -> &[Record] {
            &self.records
        }

        pub fn get(&self, row: RowId) -> Option<&Record> {
            self.records.get(row)
        }

        /// Values of one column in row order; missing cells read as empty.
        pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
            self.records
                .iter()
                .map(move |record| record.get(column).unwrap_or(&EMPTY))
        }
    }
}

pub mod group {
    use super::entity::{Dataset, Record, RowId, Value};

    /// Name of the column appended to every assigned record.
    pub const TEAM_COLUMN: &str = "Team";

    #[derive(Debug, Clone, PartialEq)]
    pub struct Team {
        pub number: usize,
        pub members: Vec<RowId>,
    }

    impl Team {
        pub fn new(number: usize) -> Team {
            Team { number, members: Vec::new() }
        }

        pub fn len(&self) -> usize {
            self.members.len()
        }

        pub fn is_empty(&self) -> bool {
            self.members.is_empty()
        }

        pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + 'a {
            self.members.iter().filter_map(move |row| dataset.get(*row))
        }

        /// Member records with the team number stored under [`TEAM_COLUMN`].
        pub fn annotated(&self, dataset: &Dataset) -> Vec<Record> {
            self.records(dataset)
                .cloned()
                .map(|record| record.with(TEAM_COLUMN, Value::Number(self.number as f64)))
                .collect()
        }
    }
}

pub mod condition {
    pub type Score = f64;

    /// Exponentially decaying priority weights, normalized to sum to one.
    pub fn weights(n: usize) -> Vec<Score> {
        let raw: Vec<Score> = (0..n).map(|i| 0.5_f64.powi(i as i32)).collect();
        let sum: Score = raw.iter().sum();
        raw.into_iter().map(|w| w / sum).collect()
    }

    /// Largest team size that still lets `rows` fit into `teams` teams.
    pub fn capacity(rows: usize, teams: usize) -> usize {
        if teams == 0 {
            return 0;
        }
        (rows + teams - 1) / teams
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn weights_halve_and_sum_to_one() {
            let w = weights(3);
            assert!((w[0] - 4.0 / 7.0).abs() < 1e-12);
            assert!((w[1] - 2.0 / 7.0).abs() < 1e-12);
            assert!((w[2] - 1.0 / 7.0).abs() < 1e-12);
            assert!(weights(0).is_empty());
            assert_eq!(weights(1), vec![1.0]);
        }

        #[test]
        fn capacity_rounds_up() {
            assert_eq!(capacity(5, 2), 3);
            assert_eq!(capacity(12, 3), 4);
            assert_eq!(capacity(1, 1), 1);
        }
    }
}
