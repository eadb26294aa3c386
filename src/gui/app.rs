//! Stock Viewer Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::{AppConfig, ProviderConfig};
use crate::data::{
    load_report, FetchError, HistoryQuery, HistorySource, LoadError, StockReport, YahooFinance,
};
use crate::gui::chart_viewer::{ReportView, ViewState};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::PriceSummary;
use anyhow::Context;
use egui::SidePanel;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Result of one background pipeline run, tagged with its request number.
struct FetchMessage {
    generation: u64,
    result: Result<StockReport, LoadError>,
}

/// Builds the provider client on first use.
type SourceBuilder = fn(&ProviderConfig) -> Result<Arc<dyn HistorySource>, FetchError>;

fn yahoo_source(config: &ProviderConfig) -> Result<Arc<dyn HistorySource>, FetchError> {
    Ok(Arc::new(YahooFinance::new(config)?))
}

/// Inputs, view and background fetch bookkeeping, independent of the window.
struct ViewerState {
    config: AppConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    source: Option<Arc<dyn HistorySource>>,
    build_source: SourceBuilder,

    // Background fetch
    fetch_tx: Sender<FetchMessage>,
    fetch_rx: Receiver<FetchMessage>,
    generation: u64,
    is_loading: bool,
    last_query: Option<HistoryQuery>,
}

/// Main application window.
pub struct StockViewerApp {
    state: ViewerState,
}

impl StockViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut state = ViewerState::new(yahoo_source);
        info!(ticker = %state.config.ticker, "starting with default inputs");
        state.start_fetch(true);
        Self { state }
    }
}

impl ViewerState {
    fn new(build_source: SourceBuilder) -> Self {
        let (fetch_tx, fetch_rx) = channel();
        Self {
            config: AppConfig::default(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            source: None,
            build_source,
            fetch_tx,
            fetch_rx,
            generation: 0,
            is_loading: false,
            last_query: None,
        }
    }

    fn source(&mut self) -> Result<Arc<dyn HistorySource>, FetchError> {
        if let Some(source) = &self.source {
            return Ok(Arc::clone(source));
        }
        let source = (self.build_source)(&self.config.provider)?;
        self.source = Some(Arc::clone(&source));
        Ok(source)
    }

    /// Run the pipeline for the current inputs in a background thread.
    /// Unless `force` is set, an unchanged query is not fetched again.
    fn start_fetch(&mut self, force: bool) {
        let query = self.config.query();
        if !force && self.last_query.as_ref() == Some(&query) {
            return;
        }

        // Any run still in flight is stale from here on.
        self.generation += 1;
        self.last_query = Some(query.clone());

        let source = match self.source() {
            Ok(source) => source,
            Err(e) => {
                let message = LoadError::from(e).to_string();
                error!(%message, "cannot create provider client");
                self.is_loading = false;
                self.control_panel.set_status(&message);
                self.chart_viewer.state = ViewState::Failed(message);
                return;
            }
        };

        self.is_loading = true;
        self.chart_viewer.state = ViewState::Loading;
        self.control_panel
            .set_status(&format!("Fetching {}...", query.symbol));

        let generation = self.generation;
        let window = self.config.ma_window;
        let tx = self.fetch_tx.clone();

        thread::spawn(move || {
            let result = load_report(source.as_ref(), &query, window);
            let _ = tx.send(FetchMessage { generation, result });
        });
    }

    /// Apply the newest finished run, dropping results of superseded ones.
    fn check_fetch_results(&mut self) {
        loop {
            match self.fetch_rx.try_recv() {
                Ok(message) => {
                    if message.generation != self.generation {
                        debug!(generation = message.generation, "discarding stale result");
                        continue;
                    }
                    self.is_loading = false;
                    self.apply_result(message.result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply_result(&mut self, result: Result<StockReport, LoadError>) {
        match result {
            Ok(report) => {
                let tail = match report.history.tail_rows(self.config.tail_rows) {
                    Ok(tail) => tail,
                    Err(e) => {
                        let message = format!("Error fetching data: {}", e);
                        self.control_panel.set_status(&message);
                        self.chart_viewer.state = ViewState::Failed(message);
                        return;
                    }
                };
                let summary = PriceSummary::from_history(&report.history);
                let span = match (report.history.first_date(), report.history.last_date()) {
                    (Some(first), Some(last)) => format!(" ({} to {})", first, last),
                    _ => String::new(),
                };
                self.control_panel.set_status(&format!(
                    "Loaded {} rows for {}{}",
                    report.history.len(),
                    report.query.symbol,
                    span
                ));
                self.chart_viewer.state = ViewState::Ready(Box::new(ReportView {
                    report,
                    tail,
                    summary,
                }));
            }
            Err(e) => {
                let message = e.to_string();
                self.control_panel.set_status(&message);
                self.chart_viewer.state = ViewState::Failed(message);
            }
        }
    }

    fn handle_export_csv(&mut self) {
        let Some(report) = self.chart_viewer.report() else {
            self.control_panel.set_status("No data to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(format!("{}.csv", report.query.symbol))
            .save_file()
        else {
            return; // User cancelled
        };

        let status = match export_csv(report, &path) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => {
                error!(error = %e, "csv export failed");
                format!("Error: {:#}", e)
            }
        };
        self.control_panel.set_status(&status);
    }

    fn handle_export_charts(&mut self) {
        let Some(report) = self.chart_viewer.report() else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return; // User cancelled
        };

        let status = match export_charts(report, &dir) {
            Ok(count) => format!("Exported {} charts to {}", count, dir.display()),
            Err(e) => {
                error!(error = %e, "chart export failed");
                format!("Error: {:#}", e)
            }
        };
        self.control_panel.set_status(&status);
    }
}

fn export_csv(report: &StockReport, path: &Path) -> anyhow::Result<()> {
    report
        .history
        .write_csv(path, Some(&report.moving_average))
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = report.history.len(), "csv exported");
    Ok(())
}

fn export_charts(report: &StockReport, dir: &Path) -> anyhow::Result<usize> {
    let paths = StaticChartRenderer::export_all(report, dir)
        .with_context(|| format!("rendering charts into {}", dir.display()))?;
    Ok(paths.len())
}

impl eframe::App for StockViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = &mut self.state;

        // Check for background results
        state.check_fetch_results();

        // Request repaint while fetching
        if state.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let exports_enabled = state.chart_viewer.report().is_some();
                    let action = state.control_panel.show(
                        ui,
                        &mut state.config,
                        state.is_loading,
                        exports_enabled,
                    );

                    match action {
                        ControlPanelAction::InputsChanged => state.start_fetch(false),
                        ControlPanelAction::Refresh => state.start_fetch(true),
                        ControlPanelAction::ExportCsv => state.handle_export_csv(),
                        ControlPanelAction::ExportCharts => state.handle_export_charts(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            state.chart_viewer.show(ui, &state.config);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::history::tests::history_from_closes;
    use crate::data::PriceHistory;
    use crate::stats::{moving_average, MA_WINDOW};
    use std::time::Duration;

    fn report_for(symbol: &str, n: usize) -> StockReport {
        let closes: Vec<f64> = (0..n).map(|i| 50.0 + i as f64).collect();
        let history = history_from_closes(&closes);
        StockReport {
            query: HistoryQuery::new(
                symbol,
                chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            ),
            moving_average: moving_average(&history.closes(), MA_WINDOW),
            history,
            window: MA_WINDOW,
        }
    }

    fn report(n: usize) -> StockReport {
        report_for("test", n)
    }

    struct FixedSource;

    impl HistorySource for FixedSource {
        fn fetch(&self, _query: &HistoryQuery) -> Result<PriceHistory, FetchError> {
            let closes: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
            Ok(history_from_closes(&closes))
        }
    }

    fn fixed_source(_: &ProviderConfig) -> Result<Arc<dyn HistorySource>, FetchError> {
        Ok(Arc::new(FixedSource))
    }

    fn broken_source(_: &ProviderConfig) -> Result<Arc<dyn HistorySource>, FetchError> {
        Err(FetchError::Status(500))
    }

    fn send(state: &ViewerState, generation: u64, result: Result<StockReport, LoadError>) {
        state
            .fetch_tx
            .send(FetchMessage { generation, result })
            .unwrap();
    }

    fn shown_symbol(state: &ViewerState) -> Option<String> {
        state
            .chart_viewer
            .report()
            .map(|r| r.query.symbol.clone())
    }

    #[test]
    fn starts_from_default_inputs() {
        let state = ViewerState::new(fixed_source);
        assert_eq!(state.config, AppConfig::default());
        assert_eq!(state.config.ticker, "GOOGL");
        assert!(state.chart_viewer.report().is_none());
    }

    #[test]
    fn only_latest_generation_is_applied() {
        let mut state = ViewerState::new(fixed_source);
        state.generation = 2;
        state.is_loading = true;

        send(&state, 1, Ok(report_for("OLD", 35)));
        send(&state, 2, Ok(report_for("NEW", 35)));
        state.check_fetch_results();

        assert_eq!(shown_symbol(&state).as_deref(), Some("NEW"));
        assert!(!state.is_loading);
    }

    #[test]
    fn late_stale_result_does_not_replace_current_one() {
        let mut state = ViewerState::new(fixed_source);
        state.generation = 2;

        send(&state, 2, Ok(report_for("NEW", 35)));
        send(&state, 1, Ok(report_for("OLD", 35)));
        state.check_fetch_results();

        assert_eq!(shown_symbol(&state).as_deref(), Some("NEW"));
    }

    #[test]
    fn no_data_shows_message_without_report() {
        let mut state = ViewerState::new(fixed_source);
        state.generation = 1;
        state.is_loading = true;

        send(&state, 1, Err(LoadError::NoData));
        state.check_fetch_results();

        assert!(state.chart_viewer.report().is_none());
        match &state.chart_viewer.state {
            ViewState::Failed(message) => assert!(message.starts_with("No data found")),
            _ => panic!("expected a failed view"),
        }
        assert!(!state.is_loading);
    }

    #[test]
    fn fetch_error_shows_message_without_report() {
        let mut state = ViewerState::new(fixed_source);
        state.generation = 1;

        send(&state, 1, Err(LoadError::Fetch(FetchError::Status(503))));
        state.check_fetch_results();

        assert!(state.chart_viewer.report().is_none());
        match &state.chart_viewer.state {
            ViewState::Failed(message) => {
                assert!(message.starts_with("Error fetching data: "));
                assert!(message.contains("503"));
            }
            _ => panic!("expected a failed view"),
        }
    }

    #[test]
    fn client_failure_makes_in_flight_run_stale() {
        let mut state = ViewerState::new(broken_source);
        // a previous run is still in flight
        state.generation = 1;
        state.is_loading = true;

        state.start_fetch(true);
        assert_eq!(state.generation, 2);
        assert!(!state.is_loading);

        send(&state, 1, Ok(report_for("OLD", 35)));
        state.check_fetch_results();

        assert!(state.chart_viewer.report().is_none());
        assert!(matches!(state.chart_viewer.state, ViewState::Failed(_)));
    }

    #[test]
    fn fetch_runs_in_background_and_unchanged_query_is_not_refetched() {
        let mut state = ViewerState::new(fixed_source);
        state.start_fetch(true);
        assert!(state.is_loading);
        assert!(matches!(state.chart_viewer.state, ViewState::Loading));

        for _ in 0..500 {
            state.check_fetch_results();
            if !state.is_loading {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(shown_symbol(&state).as_deref(), Some("GOOGL"));
        assert_eq!(state.chart_viewer.report().unwrap().history.len(), 40);

        state.start_fetch(false);
        assert_eq!(state.generation, 1);
        assert!(!state.is_loading);
    }

    #[test]
    fn export_csv_writes_moving_average_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST.csv");

        export_csv(&report(35), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().ends_with("MA30"));
        assert_eq!(text.lines().count(), 36);
    }

    #[test]
    fn export_csv_reports_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("TEST.csv");

        let err = export_csv(&report(3), &path).unwrap_err();
        assert!(format!("{:#}", err).contains("writing"));
    }
}
