//! Control Panel Widget
//! Left side panel with the ticker and date inputs.

use crate::config::AppConfig;
use egui::{Color32, RichText};
use egui_extras::DatePickerButton;

/// Left side control panel with query inputs and export controls.
pub struct ControlPanel {
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        config: &mut AppConfig,
        is_loading: bool,
        exports_enabled: bool,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Stock Price Viewer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Inputs =====
        ui.label(RichText::new("User Input Options").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Ticker:"));
            let response = ui
                .add(
                    egui::TextEdit::singleline(&mut config.ticker)
                        .hint_text("Example: AAPL, MSFT, TSLA")
                        .desired_width(140.0),
                )
                .on_hover_text("Enter stock ticker. Example: AAPL, MSFT, TSLA");
            if response.lost_focus() {
                action = ControlPanelAction::InputsChanged;
            }
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Start date:"));
            if ui
                .add(DatePickerButton::new(&mut config.start).id_salt("start_date"))
                .changed()
            {
                action = ControlPanelAction::InputsChanged;
            }
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("End date:"));
            if ui
                .add(DatePickerButton::new(&mut config.end).id_salt("end_date"))
                .changed()
            {
                action = ControlPanelAction::InputsChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!is_loading, |ui| {
                let button = egui::Button::new(RichText::new("⟳ Refresh").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Refresh;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(exports_enabled, |ui| {
                let csv_button = egui::Button::new(RichText::new("💾 Export CSV").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(csv_button).clicked() {
                    action = ControlPanelAction::ExportCsv;
                }

                ui.add_space(4.0);

                let png_button = egui::Button::new(RichText::new("🖼 Export Charts").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        ui.horizontal(|ui| {
            if is_loading {
                ui.spinner();
            }
            let is_error = self.status.contains("Error") || self.status.starts_with("No data");
            let status_color = if is_error {
                Color32::from_rgb(220, 53, 69)
            } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
                Color32::from_rgb(40, 167, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        });

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    InputsChanged,
    Refresh,
    ExportCsv,
    ExportCharts,
}
