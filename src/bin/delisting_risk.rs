use delisting_risk::config::{ChartConfig, Config};
use delisting_risk::data_provider::SnapshotProvider;
use delisting_risk::gui::risk_chart;
use delisting_risk::report;
use delisting_risk::scrapers::base::MarketDataScraper;
use delisting_risk::scrapers::yahoo::YahooScraper;
use delisting_risk::services::risk_service::RiskService;
use delisting_risk::util;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use colored::Colorize;
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize logger
    env_logger::init();

    let app = App::new("Delisting Risk Analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Checks a ticker against the $1 price and $35M market cap rules over the last 30 trading days")
        .subcommand(
            SubCommand::with_name("analyze")
                .about("Analyze delisting risk for one ticker")
                .arg(
                    Arg::with_name("ticker")
                        .short('t')
                        .long("ticker")
                        .value_name("TICKER")
                        .help("Stock ticker, e.g. AMC")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("date")
                        .short('d')
                        .long("date")
                        .value_name("DATE")
                        .help("Date to project the delisting date from (YYYY-MM-DD), defaults to today")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("snapshot")
                        .short('s')
                        .long("snapshot")
                        .value_name("FILE")
                        .help("JSON snapshot to read market data from before querying Yahoo")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("offline")
                        .long("offline")
                        .help("Only use the snapshot, never query Yahoo")
                        .requires("snapshot")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("lookback-days")
                        .long("lookback-days")
                        .value_name("DAYS")
                        .help("Calendar days of history to request")
                        .takes_value(true)
                        .default_value("60"),
                )
                .arg(
                    Arg::with_name("timeout")
                        .long("timeout")
                        .value_name("SECS")
                        .help("HTTP request timeout in seconds")
                        .takes_value(true)
                        .default_value("30"),
                )
                .arg(
                    Arg::with_name("request-interval")
                        .long("request-interval")
                        .value_name("MS")
                        .help("Minimum delay between Yahoo requests in milliseconds")
                        .takes_value(true)
                        .default_value("500"),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the assessment as JSON")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("chart")
                        .short('c')
                        .long("chart")
                        .help("Open a chart window after printing the report")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("width")
                        .long("width")
                        .value_name("PX")
                        .help("Chart window width")
                        .takes_value(true)
                        .default_value("1400"),
                )
                .arg(
                    Arg::with_name("height")
                        .long("height")
                        .value_name("PX")
                        .help("Chart window height")
                        .takes_value(true)
                        .default_value("1000"),
                )
                .arg(
                    Arg::with_name("font-size")
                        .long("font-size")
                        .value_name("PT")
                        .help("Font size of the assessment message in the chart window")
                        .takes_value(true)
                        .default_value("15"),
                )
                .arg(
                    Arg::with_name("dark")
                        .long("dark")
                        .help("Use dark colors in the chart window")
                        .takes_value(false),
                ),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("analyze") {
        if let Err(e) = run_analyze(matches).await {
            error!("{:#}", e);
            println!("[!] {}", e.to_string().red());
            std::process::exit(1);
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }
}

async fn run_analyze(matches: &ArgMatches) -> anyhow::Result<()> {
    let ticker = matches.value_of("ticker").unwrap_or_default();
    let today = match matches.value_of("date") {
        Some(date_str) => util::parse_date(date_str)
            .with_context(|| format!("invalid --date {}", date_str))?,
        None => chrono::Local::now().date_naive(),
    };
    let lookback_days = matches
        .value_of("lookback-days")
        .unwrap_or("60")
        .parse::<u32>()
        .context("invalid --lookback-days")?;

    let timeout_secs = matches
        .value_of("timeout")
        .unwrap_or("30")
        .parse::<u64>()
        .context("invalid --timeout")?;
    let request_interval_ms = matches
        .value_of("request-interval")
        .unwrap_or("500")
        .parse::<u64>()
        .context("invalid --request-interval")?;

    let config = Config::new()
        .with_lookback_days(lookback_days)
        .with_request_timeout_secs(timeout_secs)
        .with_request_interval_ms(request_interval_ms)
        .with_snapshot_path(matches.value_of("snapshot"))
        .with_offline(matches.is_present("offline"));

    let mut scrapers: Vec<Arc<dyn MarketDataScraper + Send + Sync>> = Vec::new();
    if let Some(path) = config.snapshot_path.as_deref() {
        scrapers.push(Arc::new(SnapshotProvider::load_from_file(path)?));
    }
    if !config.offline {
        scrapers.push(Arc::new(YahooScraper::new(&config)?));
    }
    if scrapers.is_empty() {
        bail!("no market data source configured");
    }

    info!("Analyzing {} as of {}", ticker, today);
    let service = RiskService::new(scrapers);
    let assessment = service.assess(ticker, today).await?;

    if matches.is_present("json") {
        println!("{}", report::render_json(&assessment)?);
    } else {
        println!("\n{}", report::render_summary(&assessment));
        println!("\nRecent {}-Day Data", assessment.days.len());
        println!("{}", report::build_table(&assessment));
    }

    if matches.is_present("chart") {
        let width = matches
            .value_of("width")
            .unwrap_or("1400")
            .parse::<f32>()
            .context("invalid --width")?;
        let height = matches
            .value_of("height")
            .unwrap_or("1000")
            .parse::<f32>()
            .context("invalid --height")?;
        let font_size = matches
            .value_of("font-size")
            .unwrap_or("15")
            .parse::<f32>()
            .context("invalid --font-size")?;
        let chart_config = ChartConfig::new()
            .with_size(width, height)
            .with_message_font_size(font_size)
            .with_dark_mode(matches.is_present("dark"));
        risk_chart::show(&assessment, chart_config)?;
    }

    Ok(())
}
