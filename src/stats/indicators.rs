//! Price Indicators Module
//! Trailing moving average and period summary figures.

use crate::data::PriceHistory;

/// Trailing window for the close price moving average.
pub const MA_WINDOW: usize = 30;

/// Trailing mean over `window` samples.
///
/// The output has the same length as `values`. Entry `i` is the mean of
/// `values[i + 1 - window ..= i]`, or `None` while fewer than `window`
/// samples are available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }

        if i + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }

    out
}

/// Headline figures for the fetched period.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub last_close: f64,
    pub change: f64,
    /// `None` when the first close is zero.
    pub change_pct: Option<f64>,
    pub period_high: f64,
    pub period_low: f64,
    pub avg_volume: f64,
}

impl PriceSummary {
    pub fn from_history(history: &PriceHistory) -> Option<Self> {
        let bars = history.bars();
        let first = bars.first()?;
        let last = bars.last()?;

        let change = last.close - first.close;
        let change_pct = (first.close != 0.0).then(|| change / first.close * 100.0);

        let period_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let period_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let avg_volume = bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;

        Some(Self {
            last_close: last.close,
            change,
            change_pct,
            period_high,
            period_low,
            avg_volume,
        })
    }

    /// Absolute and percentage change, e.g. `+20.00 (+20.00%)`.
    pub fn change_label(&self) -> String {
        match self.change_pct {
            Some(pct) => format!("{:+.2} ({:+.2}%)", self.change, pct),
            None => format!("{:+.2} (n/a)", self.change),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::history::tests::history_from_closes;
    use quickcheck_macros::quickcheck;

    fn naive_mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn small_window_example() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(ma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn thirty_day_window_starts_at_thirtieth_sample() {
        let closes: Vec<f64> = (1..=40).map(f64::from).collect();
        let ma = moving_average(&closes, MA_WINDOW);

        assert_eq!(ma.len(), closes.len());
        assert!(ma[..29].iter().all(Option::is_none));
        assert_eq!(ma[29], Some(15.5));
        assert_eq!(ma[39], Some(25.5));
    }

    #[test]
    fn short_series_is_all_missing() {
        let ma = moving_average(&[10.0; 29], MA_WINDOW);
        assert_eq!(ma.len(), 29);
        assert!(ma.iter().all(Option::is_none));
    }

    #[test]
    fn zero_window_is_all_missing() {
        assert_eq!(moving_average(&[1.0, 2.0], 0), vec![None, None]);
        assert!(moving_average(&[], 30).is_empty());
    }

    #[quickcheck]
    fn same_length_and_leading_gap(values: Vec<u16>, window: u8) -> bool {
        let window = window as usize % 40 + 1;
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let ma = moving_average(&values, window);

        ma.len() == values.len()
            && ma
                .iter()
                .enumerate()
                .all(|(i, v)| v.is_some() == (i + 1 >= window))
    }

    #[quickcheck]
    fn matches_direct_mean(values: Vec<u16>) -> bool {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let ma = moving_average(&values, MA_WINDOW);

        ma.iter().enumerate().skip(MA_WINDOW - 1).all(|(i, v)| {
            let expected = naive_mean(&values[i + 1 - MA_WINDOW..=i]);
            v.is_some_and(|got| (got - expected).abs() < 1e-6)
        })
    }

    #[test]
    fn summary_figures() {
        let history = history_from_closes(&[100.0, 90.0, 120.0]);
        let summary = PriceSummary::from_history(&history).unwrap();

        assert_eq!(summary.last_close, 120.0);
        assert_eq!(summary.change, 20.0);
        assert!((summary.change_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(summary.period_high, 121.0);
        assert_eq!(summary.period_low, 89.0);
        assert_eq!(summary.avg_volume, 200.0);
        assert_eq!(summary.change_label(), "+20.00 (+20.00%)");
    }

    #[test]
    fn zero_first_close_has_no_percentage() {
        let history = history_from_closes(&[0.0, 5.0]);
        let summary = PriceSummary::from_history(&history).unwrap();

        assert_eq!(summary.change, 5.0);
        assert_eq!(summary.change_pct, None);
        assert_eq!(summary.change_label(), "+5.00 (n/a)");
    }

    #[test]
    fn summary_of_empty_history_is_none() {
        assert!(PriceSummary::from_history(&PriceHistory::empty("X")).is_none());
    }
}
