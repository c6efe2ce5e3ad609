use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::domain::FlatRecord;
use crate::error::EurostatError;

pub const HEADERS: [&str; 9] = [
    "Año",
    "Periodo",
    "Mes",
    "Semestre",
    "Codigo",
    "País",
    "Valor",
    "Unidad",
    "Indicador",
];

const SHEET_NAME: &str = "Datos";

/// Renders records as a single-sheet `.xlsx` workbook.
pub fn write_table<'a, I>(records: I) -> Result<Vec<u8>, EurostatError>
where
    I: IntoIterator<Item = &'a FlatRecord>,
{
    build_workbook(records).map_err(|err| EurostatError::Spreadsheet(err.to_string()))
}

fn build_workbook<'a, I>(records: I) -> Result<Vec<u8>, XlsxError>
where
    I: IntoIterator<Item = &'a FlatRecord>,
{
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(HEADERS) {
        sheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (row, record) in (1u32..).zip(records) {
        sheet.write_string(row, 0, &record.year)?;
        sheet.write_string(row, 1, &record.period_type)?;
        sheet.write_string(row, 2, &record.month)?;
        sheet.write_string(row, 3, &record.semester)?;
        sheet.write_string(row, 4, &record.country_code)?;
        sheet.write_string(row, 5, &record.country_name)?;
        sheet.write_number(row, 6, record.value)?;
        sheet.write_string(row, 7, &record.unit)?;
        sheet.write_string(row, 8, &record.indicator)?;
    }

    workbook.save_to_buffer()
}
