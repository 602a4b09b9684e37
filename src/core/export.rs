use std::io;

use super::types::CashflowYear;
use crate::error::ExportError;

pub const CASHFLOW_CSV_FILENAME: &str = "cashflow_projection.csv";

const CASHFLOW_CSV_HEADER: [&str; 4] = ["Year", "Rent", "Expenses", "Cash Flow"];

pub fn cashflow_csv(years: &[CashflowYear]) -> Result<String, ExportError> {
    let bytes = write_cashflow(Vec::new(), years)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_cashflow<W: io::Write>(writer: W, years: &[CashflowYear]) -> Result<W, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CASHFLOW_CSV_HEADER)?;
    for row in years {
        wtr.serialize((row.year, row.rent, row.expenses, row.cash_flow))?;
    }
    wtr.into_inner().map_err(|e| ExportError::Flush(e.into_error()))
}
