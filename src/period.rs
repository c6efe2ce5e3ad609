use std::num::IntErrorKind;

use crate::domain::Period;
use crate::error::EurostatError;

pub const ANNUAL: &str = "Y";

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Classifies a Eurostat time label (`2022`, `2022-Q3`, `2022-S2`, `2022-07`).
///
/// Quarter tags become the period type; semesters and months keep the annual
/// period type and fill their own column. A month number outside `1..=12`,
/// however large, leaves the month empty. A tail that is neither a tag nor a
/// number is an [`EurostatError::InvalidPeriod`].
pub fn parse_period(label: &str) -> Result<Period, EurostatError> {
    let Some((year, tail)) = label.split_once('-') else {
        return Ok(Period {
            year: label.to_string(),
            period_type: ANNUAL.to_string(),
            ..Period::default()
        });
    };

    let mut period = Period {
        year: year.to_string(),
        period_type: ANNUAL.to_string(),
        ..Period::default()
    };

    if tail.starts_with('Q') {
        period.period_type = tail.to_string();
    } else if tail.starts_with('S') {
        period.semester = tail.to_string();
    } else {
        let month = match tail.parse::<i64>() {
            Ok(month) => u32::try_from(month).ok().and_then(month_name),
            // Still a number, just far outside 1..=12.
            Err(err)
                if matches!(
                    err.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                None
            }
            Err(_) => return Err(EurostatError::InvalidPeriod(label.to_string())),
        };
        if let Some(name) = month {
            period.month = name.to_string();
        }
    }

    Ok(period)
}
