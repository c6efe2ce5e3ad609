use serde_json::Value;

use crate::domain::{DatasetDescriptor, DatasetTable, FlatRecord};
use crate::error::EurostatError;
use crate::jsonstat::RawDatasetResponse;
use crate::period::parse_period;

pub const UNKNOWN: &str = "Desconocido";

/// Recovers `(geo_offset, time_offset)` from a flat cell index.
pub fn split_index(idx: usize, num_time_periods: usize) -> (usize, usize) {
    (idx / num_time_periods, idx % num_time_periods)
}

/// Validates a raw response and flattens it into one record per cell.
pub fn decode(raw: Value, descriptor: &DatasetDescriptor) -> Result<DatasetTable, EurostatError> {
    let response = RawDatasetResponse::from_value(raw)?;
    decode_response(&response, descriptor)
}

pub fn decode_response(
    response: &RawDatasetResponse,
    descriptor: &DatasetDescriptor,
) -> Result<DatasetTable, EurostatError> {
    let stride = response.num_time_periods();
    let unit = descriptor.unit();

    let records = response
        .values
        .iter()
        .map(|&(idx, value)| {
            let (geo_offset, time_offset) = split_index(idx, stride);
            let country_code = response.geo.code_at(geo_offset).unwrap_or(UNKNOWN);
            let country_name = response.geo.label_of(country_code).unwrap_or(UNKNOWN);
            let raw_period = response.time.code_at(time_offset).unwrap_or(UNKNOWN);
            let period = parse_period(raw_period)?;
            Ok(FlatRecord {
                year: period.year,
                period_type: period.period_type,
                month: period.month,
                semester: period.semester,
                country_code: country_code.to_string(),
                country_name: country_name.to_string(),
                value,
                unit: unit.to_string(),
                indicator: descriptor.name.clone(),
            })
        })
        .collect::<Result<Vec<_>, EurostatError>>()?;

    Ok(DatasetTable {
        name: descriptor.name.clone(),
        records,
    })
}
