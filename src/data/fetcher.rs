//! Market Data Fetcher
//! Daily OHLCV history from the Yahoo Finance chart endpoint.

use crate::config::ProviderConfig;
use crate::data::{PriceBar, PriceHistory};
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Provider error code for unknown or delisted symbols.
const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("ticker symbol is empty")]
    EmptySymbol,
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP status {0}")]
    Status(u16),
    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{code}: {description}")]
    Provider { code: String, description: String },
}

/// Ticker and date range for one fetch. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryQuery {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            start,
            end,
        }
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.symbol.is_empty() {
            return Err(FetchError::EmptySymbol);
        }
        if self.start > self.end {
            return Err(FetchError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Anything that can produce a daily price history.
pub trait HistorySource: Send + Sync {
    /// An unknown symbol or a range without trading days yields an empty history.
    fn fetch(&self, query: &HistoryQuery) -> Result<PriceHistory, FetchError>;
}

/// Blocking client for the Yahoo Finance v8 chart API.
pub struct YahooFinance {
    client: Client,
    base_url: String,
    auto_adjust: bool,
}

impl YahooFinance {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auto_adjust: config.auto_adjust,
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        )
    }
}

impl HistorySource for YahooFinance {
    fn fetch(&self, query: &HistoryQuery) -> Result<PriceHistory, FetchError> {
        query.validate()?;

        let (period1, period2) = request_window(query);
        let url = self.chart_url(&query.symbol);
        debug!(%url, period1, period2, "requesting chart");

        let response = self
            .client
            .get(&url)
            .header("referer", "https://finance.yahoo.com/")
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if status == StatusCode::NOT_FOUND {
            warn!(symbol = %query.symbol, "symbol not found");
            return Ok(PriceHistory::empty(&query.symbol));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let history =
            parse_chart(&query.symbol, &body, self.auto_adjust)?.within(query.start, query.end);
        info!(symbol = %query.symbol, rows = history.len(), "chart fetched");
        Ok(history)
    }
}

/// Request bounds in unix seconds, one day wider than the query on each side.
///
/// Bars are dated in the exchange's time zone, so UTC midnights alone can cut
/// off the first or last session. The parsed history is clipped back to
/// `[start, end)` afterwards.
fn request_window(query: &HistoryQuery) -> (i64, i64) {
    let before = query.start.checked_sub_days(Days::new(1)).unwrap_or(query.start);
    let after = query.end.checked_add_days(Days::new(1)).unwrap_or(query.end);
    (unix_midnight(before), unix_midnight(after))
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parse a chart response body into a history.
///
/// Timestamps are shifted by the exchange `gmtoffset` before taking the
/// calendar day. Rows missing any of open/high/low/close are skipped.
pub fn parse_chart(symbol: &str, body: &str, auto_adjust: bool) -> Result<PriceHistory, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND_CODE {
            return Ok(PriceHistory::empty(symbol));
        }
        return Err(FetchError::Provider {
            code: error.code,
            description: error.description,
        });
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceHistory::empty(symbol));
    };

    let Some(quote) = result.indicators.quote.first() else {
        return Ok(PriceHistory::empty(symbol));
    };
    let adjclose = result
        .indicators
        .adjclose
        .first()
        .map(|a| a.adjclose.as_slice())
        .unwrap_or(&[]);

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(date) =
            DateTime::from_timestamp(ts + result.meta.gmtoffset, 0).map(|dt| dt.date_naive())
        else {
            continue;
        };

        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };

        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .map(|v| v.max(0.0) as u64)
            .unwrap_or(0);

        let ratio = match adjclose.get(i) {
            Some(Some(adj)) if auto_adjust && *close != 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(PriceBar {
            date,
            open: open * ratio,
            high: high * ratio,
            low: low * ratio,
            close: close * ratio,
            volume,
        });
    }

    Ok(PriceHistory::new(symbol, bars))
}
