use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Expected shape of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnShape {
    /// Plain strings or numbers; left as they are.
    Scalar,
    /// Objects whose `text` sub-field carries the value.
    NestedText,
    /// Objects whose `type` sub-field carries the value.
    NestedType,
}

impl ColumnShape {
    /// Sub-field to extract, if any.
    pub fn sub_field(self) -> Option<&'static str> {
        match self {
            ColumnShape::Scalar => None,
            ColumnShape::NestedText => Some("text"),
            ColumnShape::NestedType => Some("type"),
        }
    }

    /// Infer the shape from the first non-missing cell.
    ///
    /// An all-missing column is `Scalar`, so nothing gets flattened.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Option<Value>>) -> Self {
        match cells.into_iter().flatten().next() {
            Some(Value::Object(map)) if map.contains_key("text") => ColumnShape::NestedText,
            Some(Value::Object(map)) if map.contains_key("type") => ColumnShape::NestedType,
            _ => ColumnShape::Scalar,
        }
    }
}

/// Per-column shapes declared up front, with inference for everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    declared: BTreeMap<String, ColumnShape>,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, column: impl Into<String>, shape: ColumnShape) -> Self {
        self.declared.insert(column.into(), shape);
        self
    }

    pub fn declared(&self, column: &str) -> Option<ColumnShape> {
        self.declared.get(column).copied()
    }

    /// Declared shape if there is one, otherwise inferred from `cells`.
    pub fn resolve(&self, column: &str, cells: &[Option<Value>]) -> ColumnShape {
        self.declared(column)
            .unwrap_or_else(|| ColumnShape::infer(cells))
    }
}
