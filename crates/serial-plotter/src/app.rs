//! Chart window
//!
//! The render loop ticks on its own cadence, independent of how fast the
//! device sends. Each tick borrows the latest record from the mailbox,
//! runs it through the plot driver and redraws the chart.

use crate::config::DisconnectPolicy;
use eframe::egui::{self, Align2, Color32, RichText};
use egui_plot::{Corner, Legend, Line, Plot, PlotBounds, PlotPoint, PlotPoints, Text};
use plot_driver::{ChartConfig, PlotDriver, PlotFrame};
use serial_link::{LinkState, Mailbox};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Overlay anchor, as fractions of the visible plot area
const INTERVAL_TEXT_POS: (f64, f64) = (0.50, 0.95);
const VALUE_TEXT_POS: (f64, f64) = (0.50, 0.90);
const DISCONNECT_TEXT_POS: (f64, f64) = (0.05, 0.95);

/// Live plot of the most recent samples
pub struct PlotterApp {
    mailbox: Mailbox,
    driver: PlotDriver,
    chart: ChartConfig,
    policy: DisconnectPolicy,
    render_interval: Duration,
    last_render: Option<Instant>,
    frame: Option<PlotFrame>,
    disconnect_logged: bool,
}

impl PlotterApp {
    pub fn new(
        mailbox: Mailbox,
        driver: PlotDriver,
        chart: ChartConfig,
        policy: DisconnectPolicy,
    ) -> Self {
        Self {
            mailbox,
            driver,
            render_interval: chart.render_interval(),
            chart,
            policy,
            last_render: None,
            frame: None,
            disconnect_logged: false,
        }
    }

    /// Run one driver tick if the render interval has elapsed.
    ///
    /// Once the reader has exited the last frame is kept as is. Returns
    /// true if a tick happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.mailbox.state().is_terminal() {
            return false;
        }

        let due = self
            .last_render
            .map_or(true, |last| now.saturating_duration_since(last) >= self.render_interval);
        if !due {
            return false;
        }
        self.last_render = Some(now);

        let Some(record) = self.mailbox.record() else {
            return false;
        };

        match self.driver.on_tick(&record, now) {
            Ok(frame) => {
                self.frame = Some(frame);
                true
            }
            Err(e) => {
                error!("Failed to decode record {}: {}", record.sequence(), e);
                false
            }
        }
    }

    /// Latest frame produced by the driver
    pub fn frame(&self) -> Option<&PlotFrame> {
        self.frame.as_ref()
    }

    /// Whether the window should close because the device went away
    pub fn should_close(&self) -> bool {
        self.policy == DisconnectPolicy::Exit
            && matches!(self.mailbox.state(), LinkState::Disconnected(_))
    }

    /// One-line link summary for the status bar
    pub fn status_text(&self) -> String {
        let overwritten = self.frame.as_ref().map_or(0, |frame| frame.overwritten);
        match self.mailbox.state() {
            LinkState::Connecting => "Waiting for data...".to_string(),
            LinkState::Receiving => format!(
                "Receiving | ticks: {} | overwritten records: {}",
                self.driver.ticks(),
                overwritten
            ),
            LinkState::Stopped => "Disconnected...".to_string(),
            LinkState::Disconnected(reason) => format!("Device disconnected: {}", reason),
        }
    }

    /// Draw the chart on fixed axes and return the bounds actually shown
    fn draw_plot(&self, ui: &mut egui::Ui) -> PlotBounds {
        let (y_low, y_high) = self.chart.y_bounds();
        let x_range = self.driver.x_range();
        let (x_low, x_high) = (x_range.start as f64, x_range.end as f64);
        let bounds = PlotBounds::from_min_max([x_low, y_low], [x_high, y_high]);
        let disconnected = match self.mailbox.state() {
            LinkState::Disconnected(reason) => Some(reason),
            _ => None,
        };
        let overlay = |(fx, fy): (f64, f64)| {
            PlotPoint::new(x_low + (x_high - x_low) * fx, y_low + (y_high - y_low) * fy)
        };

        let series = self
            .frame
            .as_ref()
            .map_or_else(|| self.driver.series(), |frame| frame.series.clone());

        let response = Plot::new("serial_plot")
            .legend(Legend::default().position(Corner::LeftTop))
            .x_axis_label(self.chart.x_label.as_str())
            .y_axis_label(self.chart.y_label.as_str())
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .auto_bounds(false.into())
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(bounds);
                plot_ui.line(Line::new(PlotPoints::new(series)).name(&self.chart.line_label));

                if let Some(frame) = &self.frame {
                    plot_ui.text(
                        Text::new(overlay(INTERVAL_TEXT_POS), frame.interval_text.as_str())
                            .anchor(Align2::LEFT_CENTER),
                    );
                    plot_ui.text(
                        Text::new(overlay(VALUE_TEXT_POS), frame.value_text.as_str())
                            .anchor(Align2::LEFT_CENTER),
                    );
                }

                if let Some(reason) = disconnected {
                    plot_ui.text(
                        Text::new(
                            overlay(DISCONNECT_TEXT_POS),
                            format!("Device disconnected: {}", reason),
                        )
                        .color(Color32::RED)
                        .anchor(Align2::LEFT_CENTER),
                    );
                }
            });

        *response.transform.bounds()
    }
}

impl eframe::App for PlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick(Instant::now());

        if let LinkState::Disconnected(reason) = self.mailbox.state() {
            if !self.disconnect_logged {
                warn!("Device disconnected: {}", reason);
                self.disconnect_logged = true;
            }
        }
        if self.should_close() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let status = self.status_text();
            if matches!(self.mailbox.state(), LinkState::Disconnected(_)) {
                ui.label(RichText::new(status).color(Color32::RED));
            } else {
                ui.label(status);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.chart.title.as_str());
            self.draw_plot(ui);
        });

        ctx.request_repaint_after(self.render_interval);
    }
}
