use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EurostatError;

/// Eurostat dataset code, e.g. `une_rt_m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetCode(String);

impl DatasetCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetCode {
    type Err = EurostatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !is_valid {
            return Err(EurostatError::InvalidDatasetCode(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

impl TryFrom<String> for DatasetCode {
    type Error = EurostatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetCode> for String {
    fn from(code: DatasetCode) -> Self {
        code.0
    }
}

/// One `key=value` query pair. Keys may repeat within a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    pub code: DatasetCode,
    pub name: String,
    pub query_params: Vec<QueryParam>,
}

impl DatasetDescriptor {
    pub fn new(code: DatasetCode, name: &str, query_params: Vec<QueryParam>) -> Self {
        Self {
            code,
            name: name.to_string(),
            query_params,
        }
    }

    /// The pinned `unit` filter, or empty when the query does not set one.
    pub fn unit(&self) -> &str {
        self.query_params
            .iter()
            .find(|param| param.key == "unit")
            .map(|param| param.value.as_str())
            .unwrap_or("")
    }

    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.query_params
            .iter()
            .map(|param| (param.key.as_str(), param.value.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Period {
    pub year: String,
    pub period_type: String,
    pub month: String,
    pub semester: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub year: String,
    pub period_type: String,
    pub month: String,
    pub semester: String,
    pub country_code: String,
    pub country_name: String,
    pub value: f64,
    pub unit: String,
    pub indicator: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTable {
    pub name: String,
    pub records: Vec<FlatRecord>,
}

impl DatasetTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_dataset_code_valid() {
        let code: DatasetCode = " une_rt_m ".parse().unwrap();
        assert_eq!(code.as_str(), "une_rt_m");
    }

    #[test]
    fn parse_dataset_code_invalid() {
        let err = "une-rt/m".parse::<DatasetCode>().unwrap_err();
        assert_matches!(err, EurostatError::InvalidDatasetCode(_));
        let err = "".parse::<DatasetCode>().unwrap_err();
        assert_matches!(err, EurostatError::InvalidDatasetCode(_));
    }

    #[test]
    fn unit_reads_pinned_filter() {
        let descriptor = DatasetDescriptor::new(
            "une_rt_m".parse().unwrap(),
            "Desempleo",
            vec![
                QueryParam::new("geo", "ES"),
                QueryParam::new("geo", "PT"),
                QueryParam::new("unit", "PC_ACT"),
            ],
        );
        assert_eq!(descriptor.unit(), "PC_ACT");

        let bare = DatasetDescriptor::new("tps00001".parse().unwrap(), "Población", vec![]);
        assert_eq!(bare.unit(), "");
    }
}
