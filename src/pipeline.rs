use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::{MERGED_PATH, dataset_path};
use crate::decode::decode;
use crate::domain::{DatasetDescriptor, DatasetTable};
use crate::error::{EurostatError, Phase};
use crate::eurostat::StatsClient;
use crate::sink::BlobSink;
use crate::table::write_table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStatus {
    Uploaded,
    UploadFailed,
    FetchFailed,
    DecodeFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    pub name: String,
    pub code: String,
    pub status: DatasetStatus,
    pub rows: usize,
    pub path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedOutcome {
    pub path: String,
    pub datasets: usize,
    pub rows: usize,
    pub uploaded: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    pub datasets: Vec<DatasetOutcome>,
    pub merged: Option<MergedOutcome>,
}

impl RunResult {
    /// Datasets that produced a table, whether or not their own upload worked.
    pub fn decoded(&self) -> usize {
        self.datasets
            .iter()
            .filter(|item| {
                matches!(
                    item.status,
                    DatasetStatus::Uploaded | DatasetStatus::UploadFailed
                )
            })
            .count()
    }

    pub fn failed(&self) -> usize {
        self.datasets
            .iter()
            .filter(|item| item.status != DatasetStatus::Uploaded)
            .count()
    }
}

/// Runs the fetch, decode and publish cycle over a catalog.
///
/// Every failure is scoped to one dataset (or to the merge step), logged, and
/// recorded in the returned [`RunResult`]; `run` itself never fails.
pub struct Pipeline<C: StatsClient, S: BlobSink> {
    client: C,
    sink: S,
}

impl<C: StatsClient, S: BlobSink> Pipeline<C, S> {
    pub fn new(client: C, sink: S) -> Self {
        Self { client, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn run(&self, catalog: &Catalog) -> RunResult {
        let started = Instant::now();
        let mut result = RunResult::default();
        let mut tables = Vec::new();

        info!(datasets = catalog.len(), "starting Eurostat run");
        for descriptor in catalog.datasets() {
            let (outcome, table) = self.process(descriptor);
            result.datasets.push(outcome);
            if let Some(table) = table {
                tables.push(table);
            }
        }

        if tables.is_empty() {
            warn!("no dataset produced a table; merged spreadsheet not written");
        } else {
            result.merged = Some(self.publish_merged(&tables));
        }

        info!(
            total = result.datasets.len(),
            decoded = result.decoded(),
            failed = result.failed(),
            merged = result.merged.as_ref().is_some_and(|merged| merged.uploaded),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Eurostat run finished"
        );
        result
    }

    fn process(&self, descriptor: &DatasetDescriptor) -> (DatasetOutcome, Option<DatasetTable>) {
        let mut outcome = DatasetOutcome {
            name: descriptor.name.clone(),
            code: descriptor.code.to_string(),
            status: DatasetStatus::FetchFailed,
            rows: 0,
            path: None,
            error: None,
        };

        let raw = match self.client.fetch(descriptor) {
            Ok(raw) => raw,
            Err(err) => {
                log_failure(descriptor, &err);
                outcome.error = Some(err.to_string());
                return (outcome, None);
            }
        };

        let table = match decode(raw, descriptor) {
            Ok(table) => table,
            Err(err) => {
                log_failure(descriptor, &err);
                outcome.status = DatasetStatus::DecodeFailed;
                outcome.error = Some(err.to_string());
                return (outcome, None);
            }
        };

        let path = dataset_path(&descriptor.name);
        outcome.rows = table.len();
        outcome.path = Some(path.clone());
        match self.publish(&path, &table) {
            Ok(()) => {
                info!(dataset = %descriptor.name, rows = table.len(), %path, "dataset uploaded");
                outcome.status = DatasetStatus::Uploaded;
            }
            Err(err) => {
                log_failure(descriptor, &err);
                outcome.status = DatasetStatus::UploadFailed;
                outcome.error = Some(err.to_string());
            }
        }
        (outcome, Some(table))
    }

    fn publish(&self, path: &str, table: &DatasetTable) -> Result<(), EurostatError> {
        let bytes = write_table(&table.records)?;
        self.sink.upload(path, bytes)
    }

    fn publish_merged(&self, tables: &[DatasetTable]) -> MergedOutcome {
        let rows: usize = tables.iter().map(DatasetTable::len).sum();
        let merged = write_table(tables.iter().flat_map(|table| &table.records))
            .and_then(|bytes| self.sink.upload(MERGED_PATH, bytes))
            .map_err(|err| EurostatError::Merge(err.to_string()));

        let error = match merged {
            Ok(()) => {
                info!(datasets = tables.len(), rows, path = MERGED_PATH, "merged spreadsheet uploaded");
                None
            }
            Err(err) => {
                error!(phase = Phase::Merge.as_str(), error = %err, "merged spreadsheet failed");
                Some(err.to_string())
            }
        };
        MergedOutcome {
            path: MERGED_PATH.to_string(),
            datasets: tables.len(),
            rows,
            uploaded: error.is_none(),
            error,
        }
    }
}

fn log_failure(descriptor: &DatasetDescriptor, err: &EurostatError) {
    error!(
        dataset = %descriptor.name,
        code = %descriptor.code,
        phase = err.phase().as_str(),
        error = %err,
        "dataset failed"
    );
}
