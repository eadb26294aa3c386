//! Static Chart Renderer
//! Writes the report charts to PNG files with plotters.
//!
//! Output, one file per chart:
//! 1. `{SYMBOL}_price.png`: close price with the moving average
//! 2. `{SYMBOL}_volume.png`: traded volume
//! 3. `{SYMBOL}_candlestick.png`: OHLC candles

use crate::charts::ChartPlotter;
use crate::data::StockReport;
use plotters::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const WIDTH: u32 = 1400;
const HEIGHT: u32 = 700;
const FONT: &str = "sans-serif";

const CLOSE_RGB: RGBColor = RGBColor(52, 152, 219);
const MA_RGB: RGBColor = RGBColor(243, 156, 18);
const VOLUME_RGB: RGBColor = RGBColor(26, 188, 156);
const UP_RGB: RGBColor = RGBColor(46, 204, 113);
const DOWN_RGB: RGBColor = RGBColor(231, 76, 60);

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to render")]
    Empty,
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Draw(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Price,
    Volume,
    Candlestick,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Price, ChartKind::Volume, ChartKind::Candlestick];

    pub fn file_name(self, symbol: &str) -> String {
        let suffix = match self {
            ChartKind::Price => "price",
            ChartKind::Volume => "volume",
            ChartKind::Candlestick => "candlestick",
        };
        format!("{}_{}.png", symbol, suffix)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart into `dir` in parallel. Returns the written paths.
    pub fn export_all(report: &StockReport, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        if report.history.is_empty() {
            return Err(ExportError::Empty);
        }

        let paths = ChartKind::ALL
            .par_iter()
            .map(|&kind| {
                let path = dir.join(kind.file_name(&report.query.symbol));
                Self::render(kind, report, &path)?;
                Ok::<PathBuf, ExportError>(path)
            })
            .collect::<Result<Vec<_>, ExportError>>()?;

        info!(count = paths.len(), dir = %dir.display(), "charts exported");
        Ok(paths)
    }

    pub fn render(kind: ChartKind, report: &StockReport, path: &Path) -> Result<(), ExportError> {
        match kind {
            ChartKind::Price => Self::render_price(report, path),
            ChartKind::Volume => Self::render_volume(report, path),
            ChartKind::Candlestick => Self::render_candlestick(report, path),
        }
    }

    /// Value range with 5% padding on both ends.
    pub fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return (0.0, 1.0);
        }
        let pad = ((max - min) * 0.05).max(max.abs() * 0.01).max(1e-9);
        (min - pad, max + pad)
    }

    fn x_range(report: &StockReport) -> std::ops::Range<f64> {
        -1.0..report.history.len() as f64
    }

    fn render_price(report: &StockReport, path: &Path) -> Result<(), ExportError> {
        let dates = report.history.dates();
        let closes = report.history.closes();
        let (y_min, y_max) = Self::padded_range(closes.iter().copied());

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!(
                    "{}: Closing Price with {}-Day Moving Average",
                    report.query.symbol, report.window
                ),
                (FONT, 24),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(Self::x_range(report), y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| ChartPlotter::date_label(&dates, *x))
            .y_desc("Price")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                closes.iter().enumerate().map(|(i, &c)| (i as f64, c)),
                CLOSE_RGB.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label("Close")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CLOSE_RGB));

        chart
            .draw_series(LineSeries::new(
                ChartPlotter::indexed_points(&report.moving_average)
                    .into_iter()
                    .map(|[x, y]| (x, y)),
                MA_RGB.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label(format!("MA{}", report.window))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MA_RGB));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    fn render_volume(report: &StockReport, path: &Path) -> Result<(), ExportError> {
        let dates = report.history.dates();
        let volumes = report.history.volumes();
        let (_, y_max) = Self::padded_range(volumes.iter().copied());

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{}: Volume Traded", report.query.symbol), (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(Self::x_range(report), 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| ChartPlotter::date_label(&dates, *x))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .y_desc("Volume")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                volumes.iter().enumerate().map(|(i, &v)| (i as f64, v)),
                VOLUME_RGB.stroke_width(1),
            ))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    fn render_candlestick(report: &StockReport, path: &Path) -> Result<(), ExportError> {
        let dates = report.history.dates();
        let bars = report.history.bars();
        let (y_min, y_max) =
            Self::padded_range(bars.iter().flat_map(|b| [b.low, b.high]));

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{}: Candlestick Chart", report.query.symbol), (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(Self::x_range(report), y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| ChartPlotter::date_label(&dates, *x))
            .y_desc("Price")
            .draw()
            .map_err(draw_err)?;

        let plot_width = WIDTH.saturating_sub(100) as f64;
        let candle_px = ((plot_width / (bars.len() + 1) as f64) * 0.7).clamp(1.0, 15.0) as u32;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, b)| {
                CandleStick::new(
                    i as f64,
                    b.open,
                    b.high,
                    b.low,
                    b.close,
                    UP_RGB.filled(),
                    DOWN_RGB.filled(),
                    candle_px,
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }
}
