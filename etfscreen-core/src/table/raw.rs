//! Raw (uncleaned) screener table and tab merging.
//!
//! Cells are kept as JSON values until cleaning, since a column may hold
//! nested objects, strings and numbers side by side. `None` marks a missing
//! cell; JSON `null` is normalised to `None` on construction.

use super::schema::{ColumnSchema, ColumnShape};
use crate::error::ScreenerError;
use crate::source::{Record, TabPayload};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Column holding the row's join key.
pub const SYMBOL_COLUMN: &str = "symbol";

/// How rows of a later tab are matched to rows already in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKey {
    /// Match row `i` with row `i`, as the screener's own index join does.
    #[default]
    Position,
    /// Match on the flattened `symbol` value.
    Symbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub cells: Vec<Option<Value>>,
}

impl RawColumn {
    pub fn is_all_missing(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    height: usize,
}

impl RawTable {
    /// Build a table from row records.
    ///
    /// Columns appear in order of first occurrence across the records. The
    /// `symbol` column is flattened to its `text` sub-field straight away, since
    /// it is the merge key.
    pub fn from_records(records: &[Record]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| RawColumn {
                name: name.to_string(),
                cells: records
                    .iter()
                    .map(|record| record.get(name).filter(|v| !v.is_null()).cloned())
                    .collect(),
            })
            .collect();

        let mut table = Self {
            columns,
            height: records.len(),
        };
        table.flatten_column(SYMBOL_COLUMN, ColumnShape::NestedText);
        table
    }

    pub fn from_payload(payload: &TabPayload) -> Self {
        Self::from_records(&payload.records)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell at `row` of column `name`; `None` if missing or out of range.
    pub fn cell(&self, name: &str, row: usize) -> Option<&Value> {
        self.column(name)?.cells.get(row)?.as_ref()
    }

    /// Remove a column, returning it if it existed.
    pub fn remove_column(&mut self, name: &str) -> Option<RawColumn> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Replace object cells of `name` with their `shape` sub-field.
    ///
    /// Non-object cells are kept; objects lacking the sub-field become missing.
    /// A `Scalar` shape, or an absent column, leaves the table unchanged.
    pub fn flatten_column(&mut self, name: &str, shape: ColumnShape) {
        let Some(field) = shape.sub_field() else {
            return;
        };
        let Some(column) = self.columns.iter_mut().find(|c| c.name == name) else {
            return;
        };
        for cell in column.cells.iter_mut() {
            let extracted = match cell {
                Some(Value::Object(map)) => Some(map.get(field).filter(|v| !v.is_null()).cloned()),
                _ => None,
            };
            if let Some(value) = extracted {
                *cell = value;
            }
        }
    }

    /// Flatten every column according to `schema`.
    pub fn flatten_nested(&mut self, schema: &ColumnSchema) {
        let shapes: Vec<(String, ColumnShape)> = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), schema.resolve(&c.name, &c.cells)))
            .collect();
        for (name, shape) in shapes {
            self.flatten_column(&name, shape);
        }
    }

    /// Turn cells equal to any sentinel string into missing, then drop
    /// columns left with no values. Returns the dropped column names.
    pub fn replace_sentinels<S: AsRef<str>>(&mut self, sentinels: &[S]) -> Vec<String> {
        for column in self.columns.iter_mut() {
            for cell in column.cells.iter_mut() {
                let is_sentinel = matches!(
                    cell.as_ref(),
                    Some(Value::String(s)) if sentinels.iter().any(|x| x.as_ref() == s.as_str())
                );
                if is_sentinel {
                    *cell = None;
                }
            }
        }

        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            let keep = !c.is_all_missing();
            if !keep {
                dropped.push(c.name.clone());
            }
            keep
        });
        dropped
    }

    /// Fold `other` into this table.
    ///
    /// Only columns absent from `self` are taken from `other`; existing columns
    /// are never overwritten. Rows of `other` with no match in `self` are
    /// appended, so no row of either table is lost. An empty table simply
    /// becomes `other`.
    pub fn merge_new_columns(&mut self, other: RawTable, key: MergeKey) {
        if self.is_empty() {
            *self = other;
            return;
        }

        let targets = match key {
            MergeKey::Symbol if self.contains(SYMBOL_COLUMN) && other.contains(SYMBOL_COLUMN) => {
                self.match_by_symbol(&other)
            }
            _ => self.match_by_position(&other),
        };

        let new_columns: Vec<RawColumn> = other
            .columns
            .into_iter()
            .filter(|c| !self.contains(&c.name))
            .collect();

        for column in self.columns.iter_mut() {
            column.cells.resize(self.height, None);
        }

        for column in new_columns {
            let mut cells = vec![None; self.height];
            for (cell, &target) in column.cells.into_iter().zip(targets.iter()) {
                cells[target] = cell;
            }
            self.columns.push(RawColumn {
                name: column.name,
                cells,
            });
        }
    }

    /// Target row in `self` for every row of `other`, growing `self.height`
    /// for rows that have to be appended.
    fn match_by_position(&mut self, other: &RawTable) -> Vec<usize> {
        self.height = self.height.max(other.height);
        (0..other.height).collect()
    }

    /// Like `match_by_position`, but keyed on the symbol column. Appended rows
    /// carry their symbol into `self`. A symbol already claimed by an earlier
    /// row of `other` does not match again; the duplicate is appended instead.
    fn match_by_symbol(&mut self, other: &RawTable) -> Vec<usize> {
        let mut index: HashMap<String, usize> = HashMap::new();
        if let Some(symbols) = self.column(SYMBOL_COLUMN) {
            for (row, cell) in symbols.cells.iter().enumerate() {
                if let Some(key) = cell.as_ref().map(cell_text) {
                    index.entry(key).or_insert(row);
                }
            }
        }

        let other_symbols: Vec<Option<Value>> = other
            .column(SYMBOL_COLUMN)
            .map(|c| c.cells.clone())
            .unwrap_or_else(|| vec![None; other.height]);

        let mut claimed: HashSet<usize> = HashSet::new();
        let mut appended: Vec<Option<Value>> = Vec::new();
        let mut targets = Vec::with_capacity(other.height);

        for symbol in other_symbols {
            let matched = symbol
                .as_ref()
                .map(cell_text)
                .and_then(|key| index.get(&key).copied())
                .filter(|row| !claimed.contains(row));

            let target = match matched {
                Some(row) => row,
                None => {
                    appended.push(symbol);
                    self.height + appended.len() - 1
                }
            };
            claimed.insert(target);
            targets.push(target);
        }

        if !appended.is_empty() {
            self.height += appended.len();
            if let Some(symbols) = self.columns.iter_mut().find(|c| c.name == SYMBOL_COLUMN) {
                symbols.cells.extend(appended);
            }
        }
        targets
    }

    /// Render the table as a DataFrame of String columns.
    ///
    /// Strings are kept verbatim; numbers, booleans and any remaining
    /// objects are written as JSON text.
    pub fn to_dataframe(&self) -> Result<DataFrame, ScreenerError> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| {
                let values: Vec<Option<String>> =
                    c.cells.iter().map(|cell| cell.as_ref().map(cell_text)).collect();
                Column::from(Series::new(c.name.as_str().into(), values))
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

/// Fold tab payloads into one table, in the order given.
pub fn assemble<'a>(payloads: impl IntoIterator<Item = &'a TabPayload>, key: MergeKey) -> RawTable {
    payloads
        .into_iter()
        .fold(RawTable::default(), |mut acc, payload| {
            acc.merge_new_columns(RawTable::from_payload(payload), key);
            acc
        })
}

/// Text form of a cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
