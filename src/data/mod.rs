//! Data module - Market data fetching and the price table

mod fetcher;
pub(crate) mod history;
mod loader;

pub use fetcher::{FetchError, HistoryQuery, HistorySource, YahooFinance};
pub use history::{PriceBar, PriceHistory, TailRow};
pub use loader::{load_report, LoadError, StockReport};
