#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::Mutex;

use serde_json::{Map, Value, json};

use eurostat_sync::catalog::Catalog;
use eurostat_sync::domain::{DatasetDescriptor, QueryParam};
use eurostat_sync::error::EurostatError;
use eurostat_sync::eurostat::StatsClient;
use eurostat_sync::sink::BlobSink;

/// Builds a JSON-stat body with `geo x time` dimensions.
pub fn response(geos: &[(&str, &str)], times: &[&str], values: &[(usize, f64)]) -> Value {
    let geo_index: Map<String, Value> = geos
        .iter()
        .enumerate()
        .map(|(at, (code, _))| (code.to_string(), json!(at)))
        .collect();
    let geo_label: Map<String, Value> = geos
        .iter()
        .map(|(code, label)| (code.to_string(), json!(label)))
        .collect();
    let time_index: Map<String, Value> = times
        .iter()
        .enumerate()
        .map(|(at, label)| (label.to_string(), json!(at)))
        .collect();
    let value: Map<String, Value> = values
        .iter()
        .map(|(idx, value)| (idx.to_string(), json!(value)))
        .collect();
    json!({
        "version": "2.0",
        "class": "dataset",
        "id": ["freq", "unit", "geo", "time"],
        "size": [1, 1, geos.len(), times.len()],
        "dimension": {
            "freq": {"category": {"index": {"M": 0}}},
            "unit": {"category": {"index": {"PC_ACT": 0}}},
            "geo": {"category": {"index": geo_index, "label": geo_label}},
            "time": {"category": {"index": time_index}}
        },
        "value": value
    })
}

/// Text of one part (e.g. `xl/worksheets/sheet1.xml`) of an `.xlsx` archive.
pub fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

pub fn descriptor(code: &str, name: &str) -> DatasetDescriptor {
    DatasetDescriptor::new(
        code.parse().unwrap(),
        name,
        vec![
            QueryParam::new("geo", "ES"),
            QueryParam::new("geo", "FR"),
            QueryParam::new("unit", "PC_ACT"),
        ],
    )
}

pub fn catalog(count: usize) -> Catalog {
    let datasets = (0..count)
        .map(|i| descriptor(&format!("ds{i}"), &format!("Serie {i}")))
        .collect();
    Catalog::new(datasets).unwrap()
}

pub struct FnStats<F>(pub F);

impl<F> StatsClient for FnStats<F>
where
    F: Fn(&DatasetDescriptor) -> Result<Value, EurostatError> + Send + Sync,
{
    fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<Value, EurostatError> {
        (self.0)(descriptor)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub failing_paths: Vec<String>,
}

impl RecordingSink {
    pub fn failing(paths: &[&str]) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            failing_paths: paths.iter().map(|path| path.to_string()).collect(),
        }
    }

    pub fn bytes_at(&self, path: &str) -> Option<Vec<u8>> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .find(|(uploaded, _)| uploaded == path)
            .map(|(_, bytes)| bytes.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl BlobSink for RecordingSink {
    fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), EurostatError> {
        if self.failing_paths.iter().any(|failing| failing == path) {
            return Err(EurostatError::Storage {
                path: path.to_string(),
                message: "injected failure".to_string(),
            });
        }
        self.uploads.lock().unwrap().push((path.to_string(), bytes));
        Ok(())
    }
}
