//! End-to-end tests for fetch → assemble → clean, driven by a scripted transport.

use etfscreen_core::source::{
    AttemptOutcome, EtfDbSource, FetchObserver, HttpReply, NoopObserver, RetryPolicy,
    ScreenerSource, Transport,
};
use etfscreen_core::table::MergeKey;
use etfscreen_core::{
    clean_table, download_clean_public_data, fetch_raw_table, CleanOptions, ScreenerError,
    ScreenerRequest, Tab, TransportError,
};
use polars::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

// ── Helpers ──────────────────────────────────────────────────────────

/// Answers per tab from a queue; the last reply of a queue repeats.
#[derive(Default)]
struct TabRouter {
    replies: Mutex<HashMap<String, Vec<Result<HttpReply, TransportError>>>>,
    requests: Mutex<Vec<String>>,
}

impl TabRouter {
    fn reply(self, tab: Tab, replies: Vec<Result<HttpReply, TransportError>>) -> Self {
        let mut queue = replies;
        queue.reverse();
        self.replies
            .lock()
            .unwrap()
            .insert(tab.as_str().to_string(), queue);
        self
    }

    fn json(self, tab: Tab, body: Value) -> Self {
        self.reply(tab, vec![Ok(HttpReply::new(200, body.to_string()))])
    }

    fn requested_tabs(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for TabRouter {
    fn post_json(&self, _url: &str, body: &Value) -> Result<HttpReply, TransportError> {
        let tab = body["tab"].as_str().unwrap_or_default().to_string();
        self.requests.lock().unwrap().push(tab.clone());
        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(&tab)
            .ok_or_else(|| TransportError(format!("no route for {tab}")))?;
        if queue.len() > 1 {
            queue.pop().unwrap()
        } else {
            queue.last().cloned().unwrap()
        }
    }
}

#[derive(Default)]
struct Recorder {
    attempts: Mutex<Vec<(Tab, u32, AttemptOutcome)>>,
    completed: Mutex<Vec<(Tab, usize)>>,
    errors: Mutex<Vec<String>>,
}

impl FetchObserver for Recorder {
    fn on_attempt(&self, tab: Tab, attempt: u32, outcome: &AttemptOutcome) {
        self.attempts
            .lock()
            .unwrap()
            .push((tab, attempt, outcome.clone()));
    }

    fn on_tab_complete(&self, tab: Tab, rows: usize) {
        self.completed.lock().unwrap().push((tab, rows));
    }

    fn on_pipeline_error(&self, error: &ScreenerError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

fn request(tabs: &[Tab]) -> ScreenerRequest {
    ScreenerRequest {
        per_page: 25,
        tabs: tabs.to_vec(),
        ..ScreenerRequest::default()
    }
}

fn immediate() -> RetryPolicy {
    RetryPolicy::unbounded_immediate()
}

fn link(text: &str) -> Value {
    json!({"type": "link", "text": text, "url": format!("/etf/{text}/")})
}

fn overview_tab() -> Value {
    json!({"data": [
        {
            "symbol": link("SPY"),
            "name": link("SPDR S&P 500 ETF Trust"),
            "head_to_head": {"type": "link", "text": "Compare"},
            "aum": "$380,123.45",
            "price": "$450.12",
            "grade": {"type": "restricted", "url": "/pro/"}
        },
        {
            "symbol": link("QQQ"),
            "name": link("Invesco QQQ Trust"),
            "head_to_head": {"type": "link", "text": "Compare"},
            "aum": "$190,000.00",
            "price": "$380.00",
            "grade": {"type": "restricted", "url": "/pro/"}
        }
    ]})
}

fn dividends_tab() -> Value {
    json!({"data": [
        {
            "symbol": link("QQQ"),
            "dividend_yield": "0.55%",
            "dividend_date": "2021-06-21",
            "name": "should not overwrite"
        },
        {
            "symbol": link("VTI"),
            "dividend_yield": "1.25%",
            "dividend_date": "not a date",
            "name": "Vanguard Total"
        },
        {
            "symbol": link("SPY"),
            "dividend_yield": "1.30%",
            "dividend_date": "2021-07-15",
            "name": "should not overwrite"
        }
    ]})
}

fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

fn str_at<'a>(df: &'a DataFrame, column: &str, row: usize) -> Option<&'a str> {
    df.column(column).unwrap().str().unwrap().get(row)
}

fn date_days(year: i32, month: u32, day: u32) -> i32 {
    let date = chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap();
    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn two_tab_scenario_merges_and_cleans_to_one_row() {
    let transport = TabRouter::default()
        .json(
            Tab::Overview,
            json!({"data": [{"symbol": {"text": "AAA"}, "field1": "$1,000"}]}),
        )
        .json(
            Tab::Returns,
            json!({"data": [{"symbol": {"text": "AAA"}, "field2": "5%"}]}),
        );
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());
    let observer = Recorder::default();

    let raw = fetch_raw_table(&source, &request(&[Tab::Overview, Tab::Returns]), &observer).unwrap();
    assert_eq!(raw.height(), 1);
    assert_eq!(raw.column_names(), vec!["symbol", "field1", "field2"]);
    assert_eq!(raw.cell("field1", 0), Some(&json!("$1,000")));
    assert_eq!(raw.cell("field2", 0), Some(&json!("5%")));

    let options = CleanOptions {
        structural_columns: vec![],
        ..CleanOptions::default()
    };
    let df = clean_table(raw, &options).unwrap();

    assert_eq!(df.shape(), (1, 3));
    assert_eq!(str_at(&df, "symbol", 0), Some("AAA"));
    assert_eq!(f64_at(&df, "field1", 0), Some(1000.0));
    assert_eq!(f64_at(&df, "field2", 0), Some(5.0));
}

#[test]
fn full_session_outer_joins_and_types_columns() {
    let transport = TabRouter::default()
        .json(Tab::Overview, overview_tab())
        .json(Tab::Dividends, dividends_tab());
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());
    let observer = Recorder::default();

    let req = ScreenerRequest {
        merge_key: MergeKey::Symbol,
        ..request(&[Tab::Overview, Tab::Dividends])
    };

    let df = download_clean_public_data(&source, &req, &CleanOptions::default(), &observer);

    assert!(observer.errors.lock().unwrap().is_empty());
    // SPY and QQQ from overview, VTI only from dividends.
    assert_eq!(df.height(), 3);
    assert_eq!(str_at(&df, "symbol", 0), Some("SPY"));
    assert_eq!(str_at(&df, "symbol", 1), Some("QQQ"));
    assert_eq!(str_at(&df, "symbol", 2), Some("VTI"));

    // Earlier tab wins on name collisions; the new row has no overview name.
    assert_eq!(str_at(&df, "name", 0), Some("SPDR S&P 500 ETF Trust"));
    assert_eq!(str_at(&df, "name", 2), None);

    assert!(df.column("head_to_head").is_err());
    assert!(df.column("grade").is_err());

    assert_eq!(f64_at(&df, "aum", 0), Some(380123.45));
    assert_eq!(f64_at(&df, "aum", 2), None);
    assert_eq!(f64_at(&df, "price", 1), Some(380.0));
    assert_eq!(f64_at(&df, "dividend_yield", 0), Some(1.30));
    assert_eq!(f64_at(&df, "dividend_yield", 1), Some(0.55));

    let dates = df.column("dividend_date").unwrap();
    assert_eq!(dates.dtype(), &DataType::Date);
    let physical = dates.as_materialized_series().to_physical_repr();
    let days = physical.i32().unwrap();
    assert_eq!(days.get(0), Some(date_days(2021, 7, 15)));
    assert_eq!(days.get(1), Some(date_days(2021, 6, 21)));
    assert_eq!(days.get(2), None);

    assert_eq!(
        *observer.completed.lock().unwrap(),
        vec![(Tab::Overview, 2), (Tab::Dividends, 3)]
    );
}

#[test]
fn positional_merge_matches_rows_by_index() {
    let transport = TabRouter::default()
        .json(Tab::Overview, overview_tab())
        .json(Tab::Dividends, dividends_tab());
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());
    let req = ScreenerRequest {
        merge_key: MergeKey::Position,
        ..request(&[Tab::Overview, Tab::Dividends])
    };

    let raw = fetch_raw_table(&source, &req, &Recorder::default()).unwrap();

    assert_eq!(raw.height(), 3);
    // Row 0 is SPY from overview but carries QQQ's dividend data, as the
    // screener's own positional join would.
    assert_eq!(raw.cell("symbol", 0), Some(&json!("SPY")));
    assert_eq!(raw.cell("dividend_yield", 0), Some(&json!("0.55%")));
    assert_eq!(raw.cell("symbol", 2), None);
}

#[test]
fn tabs_are_fetched_sequentially_in_request_order() {
    let transport = TabRouter::default()
        .json(Tab::Risk, json!({"data": [{"symbol": "A"}]}))
        .json(Tab::Esg, json!({"data": [{"symbol": "A"}]}))
        .json(Tab::Taxes, json!({"data": [{"symbol": "A"}]}));
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());

    fetch_raw_table(
        &source,
        &request(&[Tab::Taxes, Tab::Risk, Tab::Esg]),
        &NoopObserver,
    )
    .unwrap();

    assert_eq!(source.name(), "etfdb");

    assert_eq!(
        source.transport().requested_tabs(),
        vec!["taxes", "risk", "esg"]
    );
}

#[test]
fn failures_are_retried_and_observed_per_attempt() {
    let transport = TabRouter::default().reply(
        Tab::Holdings,
        vec![
            Err(TransportError("connection reset".into())),
            Ok(HttpReply::new(502, "bad gateway")),
            Ok(HttpReply::new(200, r#"{"data": [{"symbol": "IVV"}]}"#)),
        ],
    );
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());
    let observer = Recorder::default();

    let raw = fetch_raw_table(&source, &request(&[Tab::Holdings]), &observer).unwrap();

    assert_eq!(raw.height(), 1);
    let attempts = observer.attempts.lock().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0].2, AttemptOutcome::Transport("connection reset".into()));
    assert_eq!(attempts[1].2, AttemptOutcome::Status(502));
    assert_eq!(attempts[2], (Tab::Holdings, 3, AttemptOutcome::Success));
}

#[test]
fn exhausted_retries_abort_the_session() {
    let transport = TabRouter::default()
        .json(Tab::Overview, overview_tab())
        .reply(Tab::Returns, vec![Ok(HttpReply::new(429, "slow down"))]);
    let source = EtfDbSource::with_transport(transport).retry_policy(RetryPolicy {
        max_attempts: Some(4),
        ..RetryPolicy::unbounded_immediate()
    });

    let err = fetch_raw_table(
        &source,
        &request(&[Tab::Overview, Tab::Returns]),
        &Recorder::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ScreenerError::RetriesExhausted {
            tab: Tab::Returns,
            attempts: 4,
            ..
        }
    ));
}

#[test]
fn single_quoted_payload_is_repaired_before_merge() {
    let transport = TabRouter::default().reply(
        Tab::Expenses,
        vec![Ok(HttpReply::new(
            200,
            "{'data': [{'symbol': {'type': 'link', 'text': 'SPY'}, 'expense_ratio': '0.09%'}]}",
        ))],
    );
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());

    let raw = fetch_raw_table(&source, &request(&[Tab::Expenses]), &Recorder::default()).unwrap();

    assert_eq!(raw.cell("symbol", 0), Some(&json!("SPY")));
    assert_eq!(raw.cell("expense_ratio", 0), Some(&json!("0.09%")));
}

#[test]
fn parse_errors_surface_from_the_fetch_stage() {
    let transport = TabRouter::default().reply(
        Tab::Technicals,
        vec![Ok(HttpReply::new(200, "<html>captcha</html>"))],
    );
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());

    let err = fetch_raw_table(&source, &request(&[Tab::Technicals]), &Recorder::default())
        .unwrap_err();

    assert!(matches!(err, ScreenerError::Parse { tab: Tab::Technicals, .. }));
}

#[test]
fn catch_all_entry_point_logs_and_returns_empty() {
    // No head_to_head column: the structural drop fails.
    let transport = TabRouter::default().json(
        Tab::Overview,
        json!({"data": [{"symbol": {"text": "AAA"}, "aum": "$1"}]}),
    );
    let source = EtfDbSource::with_transport(transport).retry_policy(immediate());
    let observer = Recorder::default();

    let df = download_clean_public_data(
        &source,
        &request(&[Tab::Overview]),
        &CleanOptions::default(),
        &observer,
    );

    assert_eq!(df.shape(), (0, 0));
    let errors = observer.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("head_to_head"));
}
