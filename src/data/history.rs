//! Price History Module
//! Daily OHLCV records for one ticker, with a Polars table view.

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

pub const DATE_COL: &str = "Date";
pub const OPEN_COL: &str = "Open";
pub const HIGH_COL: &str = "High";
pub const LOW_COL: &str = "Low";
pub const CLOSE_COL: &str = "Close";
pub const VOLUME_COL: &str = "Volume";
pub const MA_COL: &str = "MA30";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Table error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// One trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// One row of the raw data table as shown in the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct TailRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars ordered by date, one bar per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    /// Sorts the bars by date and drops duplicate dates, keeping the last one seen.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);

        let mut unique: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: unique,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    /// Bars dated in `[start, end)`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> PriceHistory {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date < end)
            .cloned()
            .collect();
        Self {
            symbol: self.symbol.clone(),
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Build the OHLCV table, with the moving average column when given.
    pub fn to_dataframe(&self, moving_average: Option<&[Option<f64>]>) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self.bars.iter().map(|b| b.date.to_string()).collect();
        let opens: Vec<f64> = self.bars.iter().map(|b| b.open).collect();
        let highs: Vec<f64> = self.bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = self.bars.iter().map(|b| b.low).collect();
        let volumes: Vec<u64> = self.bars.iter().map(|b| b.volume).collect();

        let mut columns = vec![
            Column::new(DATE_COL.into(), dates),
            Column::new(OPEN_COL.into(), opens),
            Column::new(HIGH_COL.into(), highs),
            Column::new(LOW_COL.into(), lows),
            Column::new(CLOSE_COL.into(), self.closes()),
            Column::new(VOLUME_COL.into(), volumes),
        ];

        if let Some(ma) = moving_average {
            columns.push(Column::new(MA_COL.into(), ma.to_vec()));
        }

        DataFrame::new(columns)
    }

    /// Last `n` rows of the raw table.
    pub fn tail_rows(&self, n: usize) -> Result<Vec<TailRow>, HistoryError> {
        let tail = self.to_dataframe(None)?.tail(Some(n));

        let dates = tail.column(DATE_COL)?.as_materialized_series().str()?.clone();
        let opens = tail.column(OPEN_COL)?.as_materialized_series().f64()?.clone();
        let highs = tail.column(HIGH_COL)?.as_materialized_series().f64()?.clone();
        let lows = tail.column(LOW_COL)?.as_materialized_series().f64()?.clone();
        let closes = tail.column(CLOSE_COL)?.as_materialized_series().f64()?.clone();
        let volumes = tail.column(VOLUME_COL)?.as_materialized_series().u64()?.clone();

        let rows = (0..tail.height())
            .map(|i| TailRow {
                date: dates.get(i).unwrap_or_default().to_string(),
                open: opens.get(i).unwrap_or(f64::NAN),
                high: highs.get(i).unwrap_or(f64::NAN),
                low: lows.get(i).unwrap_or(f64::NAN),
                close: closes.get(i).unwrap_or(f64::NAN),
                volume: volumes.get(i).unwrap_or(0),
            })
            .collect();

        Ok(rows)
    }

    /// Export the table (with the moving average) to CSV.
    pub fn write_csv(
        &self,
        path: &Path,
        moving_average: Option<&[Option<f64>]>,
    ) -> Result<(), HistoryError> {
        let mut df = self.to_dataframe(moving_average)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: date.parse().unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1_000,
        }
    }

    /// Consecutive calendar days starting 2020-01-01 with the given closes.
    pub(crate) fn history_from_closes(closes: &[f64]) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 100 * (i as u64 + 1),
            })
            .collect();
        PriceHistory::new("TEST", bars)
    }

    #[test]
    fn new_sorts_and_dedups_dates() {
        let history = PriceHistory::new(
            "AAPL",
            vec![
                bar("2020-01-03", 3.0),
                bar("2020-01-01", 1.0),
                bar("2020-01-02", 2.0),
                bar("2020-01-02", 2.5),
            ],
        );

        let dates: Vec<String> = history.dates().iter().map(|d| d.to_string()).collect();
        assert_eq!(dates, ["2020-01-01", "2020-01-02", "2020-01-03"]);
        assert_eq!(history.closes(), vec![1.0, 2.5, 3.0]);
        assert!(history.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn within_keeps_start_and_drops_end() {
        let history = history_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let clipped = history.within(
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
        );

        assert_eq!(clipped.symbol, "TEST");
        assert_eq!(clipped.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn tail_rows_returns_last_five() {
        let history = history_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let rows = history.tail_rows(5).unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].date, "2020-01-03");
        assert_eq!(rows[4].date, "2020-01-07");
        assert_eq!(rows[4].close, 7.0);
        assert_eq!(rows[4].volume, 700);
    }

    #[test]
    fn tail_rows_on_short_history() {
        let history = history_from_closes(&[1.0, 2.0]);
        assert_eq!(history.tail_rows(5).unwrap().len(), 2);
    }

    #[test]
    fn dataframe_has_ohlcv_and_optional_ma() {
        let history = history_from_closes(&[1.0, 2.0, 3.0]);
        let df = history.to_dataframe(None).unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(df.height(), 3);

        let ma = vec![None, Some(1.5), Some(2.5)];
        let df = history.to_dataframe(Some(&ma)).unwrap();
        assert_eq!(df.width(), 7);
        assert_eq!(df.column(MA_COL).unwrap().null_count(), 1);
    }

    #[test]
    fn write_csv_includes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let history = history_from_closes(&[10.0, 11.0]);
        let ma = vec![None, Some(10.5)];

        history.write_csv(&path, Some(&ma)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Open,High,Low,Close,Volume,MA30"
        );
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("2020-01-02"));
    }
}
