//! Table assembly, cleaning and output.

pub mod clean;
pub mod output;
pub mod raw;
pub mod schema;

pub use clean::{clean_table, coerce_numeric, drop_structural, parse_dates, CleanOptions};
pub use output::{write_table, OutputFormat};
pub use raw::{assemble, cell_text, MergeKey, RawColumn, RawTable, SYMBOL_COLUMN};
pub use schema::{ColumnSchema, ColumnShape};
