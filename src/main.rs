use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use optlab::prelude::*;
use prettytable::{Cell, Row, Table};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "optlab")]
#[command(about = "Option pricing and strategy evaluation over historical prices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //price one option and print its greeks
    Price {
        //spot price of the underlying
        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        //time to expiry in years
        #[arg(long, default_value = "0.1")]
        expiry: f64,

        //annual risk-free rate
        #[arg(long, default_value = "0.01")]
        rate: f64,

        //annual volatility
        #[arg(long, default_value = "0.2")]
        vol: f64,

        //call or put
        #[arg(long, default_value = "call")]
        option_type: String,
    },

    //evaluate the strategies of a json config over a csv of bars
    Run {
        #[arg(long)]
        config: PathBuf,

        //overrides the data path from the config
        #[arg(long)]
        data: Option<PathBuf>,
    },

    //write the default config to a file
    InitConfig {
        #[arg(long, default_value = "optlab.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Price {
            spot,
            strike,
            expiry,
            rate,
            vol,
            option_type,
        } => price_option(spot, strike, expiry, rate, vol, &option_type)?,
        Commands::Run { config, data } => run_evaluation(config, data)?,
        Commands::InitConfig { output } => {
            EvaluationConfig::default().to_json_file(&output)?;
            println!("Default config written to {:?}", output);
        }
    }

    Ok(())
}

fn price_option(
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
    option_type: &str,
) -> Result<()> {
    let option_type = OptionType::parse(option_type)?;
    let params = OptionParameters::new(spot, strike, expiry, rate, vol, option_type)?;

    let value = price(&params)?;
    let g = greeks(&params)?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Output"), Cell::new("Value")]));
    for (label, v) in [
        ("Price", value),
        ("Delta", g.delta),
        ("Gamma", g.gamma),
        ("Vega", g.vega),
        ("Theta", g.theta),
        ("Rho", g.rho),
    ] {
        table.add_row(Row::new(vec![Cell::new(label), Cell::new(&format!("{:.4}", v))]));
    }

    println!(
        "{} option: spot {}, strike {}, expiry {}y, rate {}, vol {}\n",
        option_type, spot, strike, expiry, rate, vol
    );
    table.printstd();

    Ok(())
}

fn run_evaluation(config_path: PathBuf, data_override: Option<PathBuf>) -> Result<()> {
    println!("Optlab Strategy Evaluation");
    println!("==========================\n");

    let mut config = EvaluationConfig::from_json_file(&config_path)?;
    if let Some(data) = data_override {
        config.data_path = data;
    }

    //load data
    info!(path = ?config.data_path, "loading bars");
    let all_bars = load_csv(&config.data_path)
        .context(format!("Failed to load data from {:?}", config.data_path))?;

    //filter by symbol
    let bars = filter_by_symbol(&all_bars, &config.symbol);

    let (first, last) = match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => anyhow::bail!("No data found for symbol {}", config.symbol),
    };

    println!("Loaded {} bars for {}", bars.len(), config.symbol);
    println!("Date range: {} to {}\n", first, last);

    let series = PriceSeries::from_bars(&bars, config.price_field)
        .context("Failed to build price series")?;

    if !config.strategies.is_empty() {
        let results = sweep_strategies(
            config.build_strategies(),
            &series,
            &config.market,
            &config.settings,
        );
        print_sweep_table(&results);
        print_option_positions(&config, &series);
    }

    if let Some(rules) = config.backtest {
        println!("\nEntry/Exit Backtest");
        println!("===================\n");

        let result = run_backtest(&series, rules.entry, rules.exit)?;
        print_events_table(&result.events);
        println!();
        result.stats.pretty_print_table();

        if let Some(position) = result.open_position {
            println!(
                "\nPosition still open: {} {} from {:.2} (unrealized {:.2})",
                position.side,
                position.qty,
                position.entry_price,
                series
                    .last()
                    .map(|p| position.unrealized_pnl(p.price))
                    .unwrap_or(0.0)
            );
        }
    }

    Ok(())
}

fn print_sweep_table(results: &[(String, EvalResult<StrategyRun>)]) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Strategy"),
        Cell::new("Periods"),
        Cell::new("Sharpe"),
        Cell::new("Max Drawdown"),
        Cell::new("Cumulative Return"),
        Cell::new("Volatility"),
    ]));

    for (name, result) in results {
        match result {
            Ok(run) => {
                let report = &run.report;
                table.add_row(Row::new(vec![
                    Cell::new(name),
                    Cell::new(&format!("{}", report.periods)),
                    Cell::new(&format!("{:.3}", report.sharpe_ratio)),
                    Cell::new(&format!("{:.2}%", report.max_drawdown * 100.0)),
                    Cell::new(&format!("{:.2}%", report.cumulative_return * 100.0)),
                    Cell::new(&format!("{:.2}%", report.annualized_volatility * 100.0)),
                ]));
            }
            Err(err) => {
                table.add_row(Row::new(vec![
                    Cell::new(name),
                    Cell::new(&format!("error: {}", err)),
                ]));
            }
        }
    }

    table.printstd();
}

//entry premium and net greeks of every configured option strategy
fn print_option_positions(config: &EvaluationConfig, series: &PriceSeries) {
    let entry = match series.first() {
        Some(point) => point.price,
        None => return,
    };

    let options: Vec<(&String, OptionStrategy)> = config
        .strategies
        .iter()
        .filter_map(|(name, spec)| spec.option_strategy().map(|s| (name, s)))
        .collect();
    if options.is_empty() {
        return;
    }

    println!("\nOption Positions at Entry (spot {:.2})", entry);
    println!("=====================================\n");

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Strategy"),
        Cell::new("Premium Paid"),
        Cell::new("Delta"),
        Cell::new("Gamma"),
        Cell::new("Vega"),
        Cell::new("Theta"),
        Cell::new("Rho"),
    ]));

    for (name, strategy) in options {
        match strategy.price_legs(entry, &config.market) {
            Ok(priced) => {
                let g = OptionStrategy::position_greeks(&priced);
                table.add_row(Row::new(vec![
                    Cell::new(name),
                    Cell::new(&format!("{:.4}", OptionStrategy::premium_paid(&priced))),
                    Cell::new(&format!("{:.4}", g.delta)),
                    Cell::new(&format!("{:.4}", g.gamma)),
                    Cell::new(&format!("{:.4}", g.vega)),
                    Cell::new(&format!("{:.4}", g.theta)),
                    Cell::new(&format!("{:.4}", g.rho)),
                ]));
            }
            Err(err) => {
                table.add_row(Row::new(vec![
                    Cell::new(name),
                    Cell::new(&format!("error: {}", err)),
                ]));
            }
        }
    }

    table.printstd();
}

fn print_events_table(events: &[TradeEvent]) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Timestamp"),
        Cell::new("Action"),
        Cell::new("Side"),
        Cell::new("Price"),
        Cell::new("Reason"),
    ]));

    for event in events {
        table.add_row(Row::new(vec![
            Cell::new(&event.timestamp.to_rfc3339()),
            Cell::new(&event.action.to_string()),
            Cell::new(&event.side.to_string()),
            Cell::new(&format!("{:.2}", event.price)),
            Cell::new(
                &event
                    .reason
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            ),
        ]));
    }

    table.printstd();
}
