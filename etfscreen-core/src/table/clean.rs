//! Cleaning pipeline: raw screener table in, typed DataFrame out.
//!
//! Steps run in a fixed order:
//! 1. flatten nested cells (`text`, else `type` sub-field)
//! 2. drop structural columns (fatal if one is missing)
//! 3. sentinel strings to missing, drop all-missing columns
//! 4. strip `$` / `%` / thousands separators, then cast to Float64 where possible
//! 5. parse the date column

use super::raw::RawTable;
use super::schema::ColumnSchema;
use crate::error::ScreenerError;
use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Columns that carry no data and must be present (dropped unconditionally).
    pub structural_columns: Vec<String>,
    /// Placeholder strings meaning "withheld" or "not available".
    pub sentinels: Vec<String>,
    /// Symbols stripped from a column when its first value contains them.
    pub strip_symbols: Vec<String>,
    pub thousands_separator: String,
    pub date_column: String,
    pub date_format: String,
    /// Declared column shapes; undeclared columns are inferred.
    pub column_shapes: ColumnSchema,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            structural_columns: vec!["head_to_head".into()],
            sentinels: ["restricted", "N/A", "View", "Advanced"]
                .into_iter()
                .map(String::from)
                .collect(),
            strip_symbols: vec!["$".into(), "%".into()],
            thousands_separator: ",".into(),
            date_column: "dividend_date".into(),
            date_format: "%Y-%m-%d".into(),
            column_shapes: ColumnSchema::new(),
        }
    }
}

/// Run the full cleaning pipeline.
pub fn clean_table(raw: RawTable, options: &CleanOptions) -> Result<DataFrame, ScreenerError> {
    let mut raw = raw;
    raw.flatten_nested(&options.column_shapes);
    drop_structural(&mut raw, &options.structural_columns)?;
    raw.replace_sentinels(&options.sentinels);

    let df = raw.to_dataframe()?;
    let df = coerce_numeric(df, &options.strip_symbols, &options.thousands_separator)?;
    parse_dates(df, &options.date_column, &options.date_format)
}

/// Remove columns that are known to be useless.
///
/// A missing column means the upstream layout changed, which is an error.
pub fn drop_structural(raw: &mut RawTable, columns: &[String]) -> Result<(), ScreenerError> {
    for column in columns {
        raw.remove_column(column)
            .ok_or_else(|| ScreenerError::Structural {
                column: column.clone(),
            })?;
    }
    Ok(())
}

/// Strip formatting from String columns and cast them to Float64 when every
/// value parses. Columns that still hold text after stripping stay String.
pub fn coerce_numeric(
    df: DataFrame,
    strip_symbols: &[String],
    thousands_separator: &str,
) -> Result<DataFrame, ScreenerError> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            if series.dtype() != &DataType::String {
                return Ok(column.clone());
            }
            let stripped = strip_formatting(series, strip_symbols, thousands_separator)?;
            Ok(Column::from(to_float_or_text(stripped)))
        })
        .collect::<Result<Vec<_>, ScreenerError>>()?;
    Ok(DataFrame::new(columns)?)
}

fn strip_formatting(
    series: &Series,
    strip_symbols: &[String],
    thousands_separator: &str,
) -> Result<Series, ScreenerError> {
    let ca = series.str()?;
    let first = ca.into_iter().flatten().next();

    // Decided once per column from the first non-null value.
    let symbols: Vec<&str> = strip_symbols
        .iter()
        .map(String::as_str)
        .filter(|sym| !sym.is_empty() && first.is_some_and(|v| v.contains(sym)))
        .collect();

    let values: Vec<Option<String>> = ca
        .into_iter()
        .map(|value| {
            value.map(|v| {
                let mut out = symbols
                    .iter()
                    .fold(v.to_string(), |acc, sym| acc.replace(sym, ""));
                if !thousands_separator.is_empty() {
                    out = out.replace(thousands_separator, "");
                }
                out
            })
        })
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

fn to_float_or_text(text: Series) -> Series {
    match text.strict_cast(&DataType::Float64) {
        Ok(numeric) => numeric,
        Err(_) => text,
    }
}

/// Parse `column` as a Date using `format`. Values that do not match become
/// null. A table without the column is returned unchanged.
pub fn parse_dates(
    mut df: DataFrame,
    column: &str,
    format: &str,
) -> Result<DataFrame, ScreenerError> {
    if df.column(column).is_err() {
        return Ok(df);
    }
    let text = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();

    let days: Vec<Option<i32>> = text
        .str()?
        .into_iter()
        .map(|value| {
            value
                .and_then(|v| NaiveDate::parse_from_str(v, format).ok())
                .map(|date| (date - epoch).num_days() as i32)
        })
        .collect();

    let dates = Series::new(column.into(), days).cast(&DataType::Date)?;
    df.with_column(dates)?;
    Ok(df)
}
