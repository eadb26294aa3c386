//! Report Loader Module
//! One pipeline pass: fetch the history, check it, derive the moving average.

use crate::data::{FetchError, HistoryQuery, HistorySource, PriceHistory};
use crate::stats::moving_average;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No data found. Check the ticker symbol or date range.")]
    NoData,
    #[error("Error fetching data: {0}")]
    Fetch(#[from] FetchError),
}

/// Everything the viewer needs for one render pass.
#[derive(Debug, Clone)]
pub struct StockReport {
    pub query: HistoryQuery,
    pub history: PriceHistory,
    pub moving_average: Vec<Option<f64>>,
    pub window: usize,
}

/// Fetch and prepare a report for `query`.
pub fn load_report(
    source: &dyn HistorySource,
    query: &HistoryQuery,
    window: usize,
) -> Result<StockReport, LoadError> {
    info!(symbol = %query.symbol, start = %query.start, end = %query.end, "loading report");

    let history = source.fetch(query).map_err(|e| {
        warn!(symbol = %query.symbol, error = %e, "fetch failed");
        LoadError::from(e)
    })?;

    if history.is_empty() {
        warn!(symbol = %query.symbol, "no data in range");
        return Err(LoadError::NoData);
    }

    let moving_average = moving_average(&history.closes(), window);

    Ok(StockReport {
        query: query.clone(),
        history,
        moving_average,
        window,
    })
}
