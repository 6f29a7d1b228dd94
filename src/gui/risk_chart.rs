use chrono::{Days, NaiveDate};
use eframe::egui;
use egui_plot::{Corner, HLine, Legend, Line, Plot, Points};
use log::info;

use crate::analysis::{MARKET_CAP_THRESHOLD, PRICE_THRESHOLD};
use crate::config::ChartConfig;
use crate::errors::{DelistError, Result};
use crate::models::risk::RiskAssessment;
use crate::report::{level_icon, level_rgb, summary_lines};
use crate::util::date_to_str;

const PURPLE: egui::Color32 = egui::Color32::from_rgb(128, 0, 128);
const CRIMSON: egui::Color32 = egui::Color32::from_rgb(220, 20, 60);

/// Two-panel price and market cap chart with the assessment message box
pub struct RiskChart {
    ticker: String,
    config: ChartConfig,
    start_date: Option<NaiveDate>,
    price_points: Vec<[f64; 2]>,
    cap_points: Vec<[f64; 2]>,
    message_lines: Vec<String>,
    color: egui::Color32,
}

impl RiskChart {
    pub fn new(cc: &eframe::CreationContext, assessment: &RiskAssessment, config: ChartConfig) -> Self {
        if config.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }

        let (price_points, cap_points) = chart_points(assessment);
        let (r, g, b) = level_rgb(assessment.risk_level);
        let mut message_lines = summary_lines(assessment);
        message_lines[0] = format!("📊 {}", message_lines[0]);

        Self {
            ticker: assessment.ticker.clone(),
            config,
            start_date: assessment.days.first().map(|d| d.date),
            price_points,
            cap_points,
            message_lines,
            color: egui::Color32::from_rgb(r, g, b),
        }
    }

    fn point_label(&self, name: &str, x: f64, value: String) -> String {
        if name.is_empty() {
            return String::new();
        }
        match self.start_date {
            Some(start) => format!(
                "[{}] {}",
                date_to_str(&(start + Days::new(x.max(0.0).round() as u64))),
                value
            ),
            None => value,
        }
    }

    fn price_plot(&self, ui: &mut egui::Ui) {
        ui.strong(format!("{} Price Trend", self.ticker));
        Plot::new("price_plot")
            .legend(Legend::default().position(Corner::LeftTop))
            .label_formatter(|name, point| self.point_label(name, point.x, format!("${:.4}", point.y)))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Closing Price ($)", self.price_points.clone())
                        .color(egui::Color32::BLUE)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new("", self.price_points.clone())
                        .color(egui::Color32::BLUE)
                        .radius(3.0),
                );
                plot_ui.hline(
                    HLine::new(format!("Price Threshold (${:.0})", PRICE_THRESHOLD), PRICE_THRESHOLD)
                        .color(egui::Color32::RED)
                        .width(1.2),
                );
            });
    }

    fn cap_plot(&self, ui: &mut egui::Ui) {
        ui.strong(format!("{} Market Cap Trend", self.ticker));
        Plot::new("cap_plot")
            .legend(Legend::default().position(Corner::LeftTop))
            .label_formatter(|name, point| self.point_label(name, point.x, format!("${:.2}M", point.y)))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Market Cap (Million $)", self.cap_points.clone())
                        .color(PURPLE)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new("", self.cap_points.clone())
                        .color(PURPLE)
                        .radius(3.0),
                );
                plot_ui.hline(
                    HLine::new(
                        format!("Cap Threshold (${:.0}M)", MARKET_CAP_THRESHOLD / 1e6),
                        MARKET_CAP_THRESHOLD / 1e6,
                    )
                    .color(CRIMSON)
                    .width(1.2),
                );
            });
    }
}

impl eframe::App for RiskChart {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("assessment_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    for line in &self.message_lines {
                        ui.label(
                            egui::RichText::new(line)
                                .color(self.color)
                                .size(self.config.message_font_size),
                        );
                    }
                });
                ui.add_space(8.0);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(
                    egui::RichText::new(chart_title(&self.ticker))
                        .color(self.color)
                        .size(18.0),
                );
            });
            ui.columns(2, |columns| {
                self.price_plot(&mut columns[0]);
                self.cap_plot(&mut columns[1]);
            });
        });
    }
}

pub fn chart_title(ticker: &str) -> String {
    format!("{} Price & Market Cap Trend and Delisting Risk", ticker)
}

/// Plot points for price and market cap (millions), x in days from the first sample
pub fn chart_points(assessment: &RiskAssessment) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let start = match assessment.days.first() {
        Some(day) => day.date,
        None => return (Vec::new(), Vec::new()),
    };

    assessment
        .days
        .iter()
        .map(|day| {
            let x = (day.date - start).num_days() as f64;
            ([x, day.close], [x, day.market_cap / 1e6])
        })
        .unzip()
}

/// Open the chart window and block until it is closed
pub fn show(assessment: &RiskAssessment, config: ChartConfig) -> Result<()> {
    info!(
        "Opening chart for {} {}",
        level_icon(assessment.risk_level),
        assessment.ticker
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([config.width, config.height]),
        ..Default::default()
    };

    eframe::run_native(
        &chart_title(&assessment.ticker),
        options,
        Box::new(|cc| Ok(Box::new(RiskChart::new(cc, assessment, config)))),
    )
    .map_err(|e| DelistError::Unknown(format!("Chart window error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use chrono::Datelike;
    use crate::models::stock::{AnalysisInput, PriceSample};

    #[test]
    fn test_chart_points_use_day_offsets() {
        // weekdays only, so x skips weekends
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: Vec<PriceSample> = (0..42u64)
            .map(|i| start + Days::new(i))
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .take(30)
            .map(|d| PriceSample::new(d, 0.5))
            .collect();
        let assessment = analyze(
            &AnalysisInput::new("MULL", series, Some(10_000_000)),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .unwrap();

        let (price, cap) = chart_points(&assessment);
        assert_eq!(price.len(), 30);
        assert_eq!(price[0], [0.0, 0.5]);
        // 2024-01-08 is the first Monday after the start
        assert_eq!(price[5][0], 7.0);
        assert_eq!(cap[0], [0.0, 5.0]);
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(chart_title("AMC"), "AMC Price & Market Cap Trend and Delisting Risk");
    }
}
