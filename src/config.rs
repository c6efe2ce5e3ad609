use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::EurostatError;

pub const BASE_URL: &str = "https://ec.europa.eu/eurostat/api/dissemination/statistics/1.0/data/";
pub const CONTAINER: &str = "eurostat";
pub const DATASET_PREFIX: &str = "EuroStat/Eurostat_";
pub const MERGED_PATH: &str = "Eurostat.xlsx";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECTION_STRING_VARS: &[&str] = &["AZURE_STORAGE_CONNECTION_STRING", "AzureWebJobsStorage"];

pub fn dataset_path(name: &str) -> String {
    format!("{DATASET_PREFIX}{name}.xlsx")
}

/// Credential for the blob account, parsed from an Azure connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCredential {
    AccessKey { account: String, key: String },
    Emulator,
}

impl FromStr for StorageCredential {
    type Err = EurostatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut fields = HashMap::new();
        for part in value.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, val) = part.split_once('=').ok_or_else(|| {
                EurostatError::InvalidConnectionString(format!("segment without '=': {part}"))
            })?;
            fields.insert(key.trim().to_ascii_lowercase(), val.trim().to_string());
        }

        if fields
            .get("usedevelopmentstorage")
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
        {
            return Ok(StorageCredential::Emulator);
        }

        let account = fields
            .remove("accountname")
            .ok_or_else(|| EurostatError::InvalidConnectionString("missing AccountName".into()))?;
        let key = fields
            .remove("accountkey")
            .ok_or_else(|| EurostatError::InvalidConnectionString("missing AccountKey".into()))?;
        Ok(StorageCredential::AccessKey { account, key })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credential: StorageCredential,
}

impl Settings {
    pub fn from_env() -> Result<Self, EurostatError> {
        let raw = CONNECTION_STRING_VARS
            .iter()
            .find_map(|name| {
                std::env::var(name)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            })
            .ok_or(EurostatError::MissingCredential)?;
        Ok(Self {
            credential: raw.parse()?,
        })
    }
}
