//! Chart Plotter Module
//! Interactive price, volume and candlestick charts using egui_plot.

use crate::data::StockReport;
use chrono::NaiveDate;
use egui::{Color32, Stroke};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints};
use std::ops::RangeInclusive;

pub const CLOSE_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const MA_COLOR: Color32 = Color32::from_rgb(243, 156, 18); // Orange
pub const VOLUME_COLOR: Color32 = Color32::from_rgb(26, 188, 156); // Teal
pub const UP_COLOR: Color32 = Color32::from_rgb(46, 204, 113); // Green
pub const DOWN_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red

const CHART_HEIGHT: f32 = 320.0;
const CANDLE_WIDTH: f64 = 0.7;

/// Creates the interactive charts for a report.
/// The x axis is the trading-day index, labelled with its date.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Label for a grid mark, empty between trading days or outside the series.
    pub fn date_label(dates: &[NaiveDate], value: f64) -> String {
        let rounded = value.round();
        if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        dates
            .get(rounded as usize)
            .map(|d| d.to_string())
            .unwrap_or_default()
    }

    fn date_formatter(report: &StockReport) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
        let dates = report.history.dates();
        move |mark, _range| Self::date_label(&dates, mark.value)
    }

    /// `[index, value]` points, skipping missing entries.
    pub fn indexed_points(values: &[Option<f64>]) -> Vec<[f64; 2]> {
        values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| [i as f64, v]))
            .collect()
    }

    /// Close price with its trailing moving average.
    pub fn draw_price_chart(ui: &mut egui::Ui, report: &StockReport) {
        let closes: Vec<Option<f64>> = report.history.closes().into_iter().map(Some).collect();
        let close_points = Self::indexed_points(&closes);
        let ma_points = Self::indexed_points(&report.moving_average);
        let ma_name = format!("MA{}", report.window);

        Plot::new(format!("price_{}", report.query.symbol))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .y_axis_label("Price")
            .x_axis_formatter(Self::date_formatter(report))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(close_points))
                        .color(CLOSE_COLOR)
                        .width(1.5)
                        .name("Close"),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(ma_points))
                        .color(MA_COLOR)
                        .width(1.5)
                        .name(ma_name),
                );
            });
    }

    pub fn draw_volume_chart(ui: &mut egui::Ui, report: &StockReport) {
        let volumes: Vec<Option<f64>> = report.history.volumes().into_iter().map(Some).collect();
        let points = Self::indexed_points(&volumes);

        Plot::new(format!("volume_{}", report.query.symbol))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .y_axis_label("Volume")
            .x_axis_formatter(Self::date_formatter(report))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(points))
                        .color(VOLUME_COLOR)
                        .width(1.2)
                        .name("Volume"),
                );
            });
    }

    /// OHLC candles drawn as box elements: body open..close, whiskers low..high.
    pub fn draw_candlestick_chart(ui: &mut egui::Ui, report: &StockReport) {
        let mut rising = Vec::new();
        let mut falling = Vec::new();

        for (i, bar) in report.history.bars().iter().enumerate() {
            let body_low = bar.open.min(bar.close);
            let body_high = bar.open.max(bar.close);
            let up = bar.close >= bar.open;
            let color = if up { UP_COLOR } else { DOWN_COLOR };

            let elem = BoxElem::new(
                i as f64,
                BoxSpread::new(bar.low, body_low, body_low, body_high, bar.high),
            )
            .name(bar.date.to_string())
            .box_width(CANDLE_WIDTH)
            .whisker_width(0.0)
            .fill(color)
            .stroke(Stroke::new(1.0, color));

            if up {
                rising.push(elem);
            } else {
                falling.push(elem);
            }
        }

        Plot::new(format!("candles_{}", report.query.symbol))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .y_axis_label("Price")
            .x_axis_formatter(Self::date_formatter(report))
            .show(ui, |plot_ui| {
                plot_ui.box_plot(BoxPlot::new(rising).color(UP_COLOR).name("Increasing"));
                plot_ui.box_plot(BoxPlot::new(falling).color(DOWN_COLOR).name("Decreasing"));
            });
    }
}
