//! Writing tables to disk.
//!
//! Writes are atomic: the file is written next to the target with a `.tmp`
//! suffix and renamed into place.

use crate::error::ScreenerError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
    /// A JSON array of row objects.
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Json => "json",
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

pub fn write_table(
    df: &mut DataFrame,
    path: &Path,
    format: OutputFormat,
) -> Result<(), ScreenerError> {
    let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));

    let written = fs::File::create(&tmp_path)
        .map_err(ScreenerError::from)
        .and_then(|file| write_to(df, file, format));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ScreenerError::Io(e)
    })
}

fn write_to(df: &mut DataFrame, file: fs::File, format: OutputFormat) -> Result<(), ScreenerError> {
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
        OutputFormat::Json => {
            JsonWriter::new(file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
    }
    Ok(())
}
