//! Chart Viewer Widget
//! Central scrollable panel: header, raw data tail and the three charts.

use crate::charts::ChartPlotter;
use crate::config::AppConfig;
use crate::data::{HistoryQuery, StockReport, TailRow};
use crate::stats::PriceSummary;
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// A fetched report with its display rows prepared once.
pub struct ReportView {
    pub report: StockReport,
    pub tail: Vec<TailRow>,
    pub summary: Option<PriceSummary>,
}

/// What the central panel currently shows.
#[derive(Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Ready(Box<ReportView>),
    Failed(String),
}

#[derive(Default)]
pub struct ChartViewer {
    pub state: ViewState,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> Option<&StockReport> {
        match &self.state {
            ViewState::Ready(view) => Some(&view.report),
            _ => None,
        }
    }

    /// Ticker and range named in the header: the shown report's, else the inputs'.
    pub fn header_query(&self, config: &AppConfig) -> HistoryQuery {
        match &self.state {
            ViewState::Ready(view) => view.report.query.clone(),
            _ => config.query(),
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, config: &AppConfig) {
        let header = self.header_query(config);
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new("📈 Simple Stock Price App").size(26.0).strong());
                ui.add_space(5.0);
                ui.horizontal_wrapped(|ui| {
                    ui.label("View historical");
                    ui.label(RichText::new("closing price").strong());
                    ui.label("and");
                    ui.label(RichText::new("volume").strong());
                    ui.label("for");
                    ui.label(RichText::new(&header.symbol).strong());
                });
                ui.horizontal_wrapped(|ui| {
                    ui.label("From");
                    ui.label(RichText::new(header.start.to_string()).strong());
                    ui.label("to");
                    ui.label(RichText::new(header.end.to_string()).strong());
                });
                ui.add_space(SECTION_SPACING);

                match &self.state {
                    ViewState::Idle => {}
                    ViewState::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Fetching data...");
                        });
                    }
                    ViewState::Failed(message) => Self::draw_error(ui, message),
                    ViewState::Ready(view) => Self::draw_report(ui, view),
                }
            });
    }

    fn draw_error(ui: &mut egui::Ui, message: &str) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, ERROR_COLOR))
            .fill(ERROR_COLOR.gamma_multiply(0.15))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(message).size(14.0).color(ERROR_COLOR));
            });
    }

    fn draw_report(ui: &mut egui::Ui, view: &ReportView) {
        let report = &view.report;

        Self::subheader(ui, "Raw Data");
        if let Some(summary) = &view.summary {
            Self::draw_summary(ui, summary);
            ui.add_space(8.0);
        }
        Self::draw_tail_table(ui, &view.tail);
        ui.add_space(SECTION_SPACING);

        Self::subheader(
            ui,
            &format!("Closing Price with {}-Day Moving Average", report.window),
        );
        ChartPlotter::draw_price_chart(ui, report);
        ui.add_space(SECTION_SPACING);

        Self::subheader(ui, "Volume Traded");
        ChartPlotter::draw_volume_chart(ui, report);
        ui.add_space(SECTION_SPACING);

        Self::subheader(ui, "Candlestick Chart");
        ChartPlotter::draw_candlestick_chart(ui, report);
        ui.add_space(SECTION_SPACING);
    }

    fn subheader(ui: &mut egui::Ui, text: &str) {
        ui.label(RichText::new(text).size(18.0).strong());
        ui.add_space(6.0);
    }

    fn draw_summary(ui: &mut egui::Ui, summary: &PriceSummary) {
        let change_color = if summary.change >= 0.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            ERROR_COLOR
        };

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(format!("Last close: {:.2}", summary.last_close)).strong());
            ui.label(RichText::new(summary.change_label()).color(change_color));
            ui.separator();
            ui.label(format!("High: {:.2}", summary.period_high));
            ui.label(format!("Low: {:.2}", summary.period_low));
            ui.separator();
            ui.label(format!("Avg volume: {:.0}", summary.avg_volume));
        });
    }

    fn draw_tail_table(ui: &mut egui::Ui, rows: &[TailRow]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("raw_data_tail")
                    .striped(true)
                    .min_col_width(80.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Date", "Open", "High", "Low", "Close", "Volume"] {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for row in rows {
                            ui.label(RichText::new(&row.date).size(12.0));
                            ui.label(RichText::new(format!("{:.4}", row.open)).size(12.0));
                            ui.label(RichText::new(format!("{:.4}", row.high)).size(12.0));
                            ui.label(RichText::new(format!("{:.4}", row.low)).size(12.0));
                            ui.label(RichText::new(format!("{:.4}", row.close)).size(12.0));
                            ui.label(RichText::new(row.volume.to_string()).size(12.0));
                            ui.end_row();
                        }
                    });
            });
    }
}
