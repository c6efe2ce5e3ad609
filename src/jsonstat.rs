//! Typed view of a Eurostat JSON-stat 2.0 dataset response.
//!
//! Only the pieces the decoder needs are kept: the `geo` and `time`
//! dimensions and the sparse `value` cells. Everything else in the payload
//! (`label`, `extension`, `status`, ...) is ignored.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::EurostatError;

const GEO: &str = "geo";
const TIME: &str = "time";

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    id: Option<Vec<String>>,
    #[serde(default)]
    size: Option<Vec<usize>>,
    #[serde(default)]
    dimension: HashMap<String, WireDimension>,
    #[serde(default)]
    value: Option<WireValues>,
}

#[derive(Debug, Deserialize)]
struct WireDimension {
    #[serde(default)]
    category: WireCategory,
}

#[derive(Debug, Default, Deserialize)]
struct WireCategory {
    #[serde(default)]
    index: Option<WireIndex>,
    #[serde(default)]
    label: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireIndex {
    Map(HashMap<String, usize>),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireValues {
    Map(HashMap<String, Option<f64>>),
    List(Vec<Option<f64>>),
}

/// One dimension's categories, addressable by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    codes: HashMap<usize, String>,
    labels: HashMap<String, String>,
}

impl Dimension {
    fn from_wire(name: &str, wire: WireDimension) -> Result<Self, EurostatError> {
        let WireCategory { index, label } = wire.category;
        let codes = match index {
            Some(WireIndex::Map(map)) => map.into_iter().map(|(code, at)| (at, code)).collect(),
            Some(WireIndex::List(list)) => list.into_iter().enumerate().collect(),
            // JSON-stat allows omitting the index for single-category dimensions.
            None if label.len() == 1 => label.keys().cloned().map(|code| (0, code)).collect(),
            None => {
                return Err(EurostatError::MalformedResponse(format!(
                    "dimension.{name} has no category index"
                )));
            }
        };
        Ok(Self {
            codes,
            labels: label,
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code_at(&self, offset: usize) -> Option<&str> {
        self.codes.get(&offset).map(String::as_str)
    }

    pub fn label_of(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }
}

/// Validated response: both dimensions present, cells sorted by flat index.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDatasetResponse {
    pub geo: Dimension,
    pub time: Dimension,
    pub values: Vec<(usize, f64)>,
}

impl RawDatasetResponse {
    pub fn from_value(raw: Value) -> Result<Self, EurostatError> {
        let wire: WireResponse = serde_json::from_value(raw)
            .map_err(|err| EurostatError::MalformedResponse(err.to_string()))?;
        Self::from_wire(wire)
    }

    fn from_wire(mut wire: WireResponse) -> Result<Self, EurostatError> {
        if let (Some(ids), Some(sizes)) = (&wire.id, &wire.size) {
            check_layout(ids, sizes)?;
        }

        let geo = wire
            .dimension
            .remove(GEO)
            .ok_or_else(|| EurostatError::MalformedResponse("missing dimension.geo".to_string()))?;
        let time = wire
            .dimension
            .remove(TIME)
            .ok_or_else(|| EurostatError::MalformedResponse("missing dimension.time".to_string()))?;
        let geo = Dimension::from_wire(GEO, geo)?;
        let time = Dimension::from_wire(TIME, time)?;

        let mut values = match wire.value {
            None => Vec::new(),
            Some(WireValues::List(list)) => list
                .into_iter()
                .enumerate()
                .filter_map(|(idx, value)| value.map(|value| (idx, value)))
                .collect(),
            Some(WireValues::Map(map)) => map
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value)))
                .map(|(key, value)| {
                    key.trim()
                        .parse::<usize>()
                        .map(|idx| (idx, value))
                        .map_err(|_| {
                            EurostatError::MalformedResponse(format!("non-numeric value key: {key}"))
                        })
                })
                .collect::<Result<Vec<_>, EurostatError>>()?,
        };
        values.sort_by_key(|(idx, _)| *idx);

        if time.is_empty() && !values.is_empty() {
            return Err(EurostatError::MalformedResponse(
                "dimension.time has no categories but values are present".to_string(),
            ));
        }

        Ok(Self { geo, time, values })
    }

    /// Flattening stride: the number of time categories.
    pub fn num_time_periods(&self) -> usize {
        self.time.len()
    }
}

/// The `geo * T + time` stride only holds when every other dimension has a
/// single category and `geo` precedes `time`.
fn check_layout(ids: &[String], sizes: &[usize]) -> Result<(), EurostatError> {
    if ids.len() != sizes.len() {
        return Err(EurostatError::MalformedResponse(format!(
            "id has {} entries but size has {}",
            ids.len(),
            sizes.len()
        )));
    }
    for (id, size) in ids.iter().zip(sizes) {
        if id != GEO && id != TIME && *size > 1 {
            return Err(EurostatError::MalformedResponse(format!(
                "dimension {id} has {size} categories; only geo and time may vary"
            )));
        }
    }
    let geo_at = ids.iter().position(|id| id == GEO);
    let time_at = ids.iter().position(|id| id == TIME);
    if let (Some(geo_at), Some(time_at)) = (geo_at, time_at) {
        if time_at < geo_at {
            return Err(EurostatError::MalformedResponse(
                "time dimension precedes geo".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn values_sorted_by_numeric_key() {
        let raw = json!({
            "dimension": {
                "geo": {"category": {"index": {"ES": 0}, "label": {"ES": "Spain"}}},
                "time": {"category": {"index": ["2020", "2021", "2022", "2023", "2024", "2025", "2026", "2027", "2028", "2029", "2030"]}}
            },
            "value": {"10": 3.0, "2": 2.0, "0": 1.0, "9": null}
        });
        let parsed = RawDatasetResponse::from_value(raw).unwrap();
        assert_eq!(parsed.values, vec![(0, 1.0), (2, 2.0), (10, 3.0)]);
        assert_eq!(parsed.num_time_periods(), 11);
        assert_eq!(parsed.time.code_at(10), Some("2030"));
    }

    #[test]
    fn single_category_without_index() {
        let raw = json!({
            "dimension": {
                "geo": {"category": {"label": {"ES": "Spain"}}},
                "time": {"category": {"index": {"2020": 0}}}
            },
            "value": {"0": 1.5}
        });
        let parsed = RawDatasetResponse::from_value(raw).unwrap();
        assert_eq!(parsed.geo.code_at(0), Some("ES"));
        assert_eq!(parsed.geo.label_of("ES"), Some("Spain"));
    }

    #[test]
    fn reject_extra_varying_dimension() {
        let raw = json!({
            "id": ["freq", "unit", "geo", "time"],
            "size": [1, 2, 1, 1],
            "dimension": {
                "geo": {"category": {"index": {"ES": 0}}},
                "time": {"category": {"index": {"2020": 0}}}
            },
            "value": {"0": 1.0}
        });
        let err = RawDatasetResponse::from_value(raw).unwrap_err();
        assert_matches!(err, EurostatError::MalformedResponse(msg) if msg.contains("unit"));
    }

    #[test]
    fn reject_non_numeric_key() {
        let raw = json!({
            "dimension": {
                "geo": {"category": {"index": {"ES": 0}}},
                "time": {"category": {"index": {"2020": 0}}}
            },
            "value": {"a": 1.0}
        });
        let err = RawDatasetResponse::from_value(raw).unwrap_err();
        assert_matches!(err, EurostatError::MalformedResponse(_));
    }
}
