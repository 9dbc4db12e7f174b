//! Public entry points: fetch, clean, and the catch-all composition.

use crate::config::ScreenerRequest;
use crate::error::ScreenerError;
use crate::source::{FetchObserver, ScreenerSource};
use crate::table::{assemble, clean_table, CleanOptions, RawTable};
use polars::prelude::DataFrame;

/// Fetch every requested tab, in order, and merge them into one raw table.
///
/// Tabs are fetched one at a time; the first failure aborts the session.
pub fn fetch_raw_table(
    source: &dyn ScreenerSource,
    request: &ScreenerRequest,
    observer: &dyn FetchObserver,
) -> Result<RawTable, ScreenerError> {
    let payloads = request
        .tabs
        .iter()
        .map(|&tab| {
            let payload = source.fetch_tab(tab, request.per_page, &request.only, observer)?;
            observer.on_tab_complete(tab, payload.records.len());
            Ok(payload)
        })
        .collect::<Result<Vec<_>, ScreenerError>>()?;
    Ok(assemble(&payloads, request.merge_key))
}

/// Fetch and clean in one go.
///
/// Any failure is reported to `observer` and an empty DataFrame is returned.
/// Call [`fetch_raw_table`] and [`clean_table`] directly to tell failures apart.
pub fn download_clean_public_data(
    source: &dyn ScreenerSource,
    request: &ScreenerRequest,
    options: &CleanOptions,
    observer: &dyn FetchObserver,
) -> DataFrame {
    let result =
        fetch_raw_table(source, request, observer).and_then(|raw| clean_table(raw, options));
    match result {
        Ok(df) => df,
        Err(e) => {
            observer.on_pipeline_error(&e);
            DataFrame::empty()
        }
    }
}
