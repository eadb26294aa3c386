//! Stock Price Viewer - Historical Prices, Moving Average & Candlestick Charts
//!
//! A Rust application that fetches daily stock prices and displays interactive charts.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use eframe::egui;
use gui::StockViewerApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 900.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Stock Price Viewer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Stock Price Viewer",
        options,
        Box::new(|cc| Ok(Box::new(StockViewerApp::new(cc)))),
    )
}
