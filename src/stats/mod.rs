//! Stats module - Derived price series

mod indicators;

pub use indicators::{moving_average, PriceSummary, MA_WINDOW};
