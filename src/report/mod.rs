use colored::Colorize;
use tabled::{
    Table,
    settings::{
        Alignment, Color,
        object::{Columns, Object, Rows},
    },
};

use crate::analysis::{MARKET_CAP_THRESHOLD, PRICE_THRESHOLD};
use crate::errors::Result;
use crate::models::risk::{RiskAssessment, RiskLevel};
use crate::util::{date_to_str, format_dollars, format_thousands};

pub fn level_icon(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::CriticalBoth | RiskLevel::CriticalPrice | RiskLevel::CriticalCap => "🔴",
        RiskLevel::Warning => "🟠",
        RiskLevel::Caution => "🟡",
        RiskLevel::Safe => "✅",
    }
}

/// Display color for a level as RGB, shared by the terminal and chart views
pub fn level_rgb(level: RiskLevel) -> (u8, u8, u8) {
    match level {
        RiskLevel::CriticalBoth | RiskLevel::CriticalPrice => (255, 0, 0),
        RiskLevel::CriticalCap => (139, 0, 0),
        RiskLevel::Warning => (255, 165, 0),
        RiskLevel::Caution => (255, 215, 0),
        RiskLevel::Safe => (0, 128, 0),
    }
}

fn status_prefix(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Warning => "Warning: ",
        RiskLevel::Caution => "Caution: ",
        _ => "",
    }
}

/// Plain summary lines, without icon or color
pub fn summary_lines(assessment: &RiskAssessment) -> Vec<String> {
    let mut lines = vec![
        format!("{} Risk Assessment:", assessment.ticker),
        format!("- Shares Outstanding: {}", format_thousands(assessment.shares_outstanding)),
        format!(
            "- Days below ${:.0}: {} (Remaining: {})",
            PRICE_THRESHOLD, assessment.low_price_days, assessment.remaining_price_days
        ),
        format!(
            "- Days below ${:.0}M Market Cap: {} (Remaining: {})",
            MARKET_CAP_THRESHOLD / 1e6,
            assessment.low_cap_days,
            assessment.remaining_cap_days
        ),
        format!(
            "- Status: {}{}",
            status_prefix(assessment.risk_level),
            assessment.statement
        ),
    ];

    if let Some(date) = assessment.estimated_delisting_date {
        lines.push(format!("⚠ Potential delisting date: {}", date_to_str(&date)));
    }

    lines
}

/// Summary block colored by risk level
pub fn render_summary(assessment: &RiskAssessment) -> String {
    let (r, g, b) = level_rgb(assessment.risk_level);
    let mut lines = summary_lines(assessment);
    lines[0] = format!("{} {}", level_icon(assessment.risk_level), lines[0]);

    lines
        .iter()
        .map(|line| line.truecolor(r, g, b).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Day table, oldest first. Rows under a threshold are highlighted.
pub fn build_table(assessment: &RiskAssessment) -> Table {
    let mut table_data: Vec<Vec<String>> = vec![vec![
        "Date".to_string(),
        "Close ($)".to_string(),
        "Market Cap ($)".to_string(),
    ]];

    for day in &assessment.days {
        table_data.push(vec![
            date_to_str(&day.date),
            format!("{:.4}", day.close),
            format_dollars(day.market_cap),
        ]);
    }

    let mut table = tabled::builder::Builder::from_iter(&table_data).build();
    table.modify(Rows::first(), Color::FG_BRIGHT_BLACK);
    table.modify(Columns::first().not(Rows::first()), Color::FG_CYAN);
    table.modify(Columns::new(1..), Alignment::right());

    for (i, day) in assessment.days.iter().enumerate() {
        let row = i + 1;
        if day.below_price_threshold {
            table.modify(Rows::new(row..row + 1).not(Columns::first()), Color::FG_RED);
        } else if day.below_cap_threshold {
            table.modify(Rows::new(row..row + 1).not(Columns::first()), Color::FG_YELLOW);
        }
    }

    table
}

pub fn render_json(assessment: &RiskAssessment) -> Result<String> {
    Ok(serde_json::to_string_pretty(assessment)?)
}
