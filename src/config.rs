//! Application Configuration
//! Default inputs and provider settings. Every launch starts from the defaults.

use crate::data::HistoryQuery;
use crate::stats::MA_WINDOW;
use chrono::NaiveDate;

pub const DEFAULT_TICKER: &str = "GOOGL";
pub const DEFAULT_TAIL_ROWS: usize = 5;

/// Market data provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Scale OHLC by the adjusted close ratio (splits and dividends).
    pub auto_adjust: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
            auto_adjust: true,
        }
    }
}

/// User inputs and display settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub ma_window: usize,
    pub tail_rows: usize,
    pub provider: ProviderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            start: NaiveDate::from_ymd_opt(2010, 5, 31).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2020, 5, 31).unwrap_or_default(),
            ma_window: MA_WINDOW,
            tail_rows: DEFAULT_TAIL_ROWS,
            provider: ProviderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Query for the current inputs.
    pub fn query(&self) -> HistoryQuery {
        HistoryQuery::new(&self.ticker, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_inputs() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.ticker, "GOOGL");
        assert_eq!(cfg.start, NaiveDate::from_ymd_opt(2010, 5, 31).unwrap());
        assert_eq!(cfg.end, NaiveDate::from_ymd_opt(2020, 5, 31).unwrap());
        assert_eq!(cfg.ma_window, 30);
        assert_eq!(cfg.tail_rows, 5);
        assert!(cfg.provider.auto_adjust);
    }

    #[test]
    fn query_uses_current_inputs() {
        let cfg = AppConfig {
            ticker: " msft ".to_string(),
            ..AppConfig::default()
        };
        let query = cfg.query();
        assert_eq!(query.symbol, "MSFT");
        assert_eq!(query.start, cfg.start);
        assert_eq!(query.end, cfg.end);
    }
}
