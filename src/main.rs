use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use farewatch::alert::message::{deal_message, summary_message};
use farewatch::alert::{AlertSink, StdoutSink, TelegramSink};
use farewatch::config::{Config, ConfigOverrides};
use farewatch::deal::Deal;
use farewatch::dedupe::SeenDealStore;
use farewatch::fares::AmadeusClient;
use farewatch::output::{
    render_deals_table, render_json, render_open_jaw_table, render_routes_table,
};
use farewatch::scan::{run_scan, ScanReport};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "farewatch", about = "Flight deal scanner with Telegram alerts")]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    origin: Option<String>,
    #[arg(long = "seen-file")]
    seen_file: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Scan {
        #[arg(long)]
        dry_run: bool,
    },
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
        #[arg(long, default_value_t = 1)]
        iterations: u32,
        #[arg(long)]
        dry_run: bool,
    },
    Routes,
    Seen,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        origin: cli.origin.clone(),
        snapshot_path: cli.seen_file.clone(),
    });
    config.apply_env();

    // Config maintenance must stay reachable while the file is broken.
    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    config.validate()?;

    match &cli.command {
        Commands::Config { .. } => Ok(()),
        Commands::Routes => {
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_routes_table(&config.routes));
                    if !config.open_jaw_routes.is_empty() {
                        println!("{}", render_open_jaw_table(&config.open_jaw_routes));
                    }
                }
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "routes": config.routes,
                        "open_jaw_routes": config.open_jaw_routes,
                    });
                    println!("{}", render_json(&payload)?);
                }
            }
            Ok(())
        }
        Commands::Seen => {
            let mut store =
                SeenDealStore::new(config.resolved_snapshot_path(), config.dedupe.ttl_ms());
            store.load();
            println!(
                "{} fingerprint(s) tracked in {}",
                store.len(),
                store.path().display()
            );
            Ok(())
        }
        Commands::Scan { dry_run } => {
            let client = build_client(&config)?;
            run_scan_once(&config, &client, cli.output, *dry_run).await
        }
        Commands::Watch {
            interval_secs,
            iterations,
            dry_run,
        } => {
            let client = build_client(&config)?;
            let interval = Duration::from_secs((*interval_secs).max(1));
            let total_iterations = (*iterations).max(1);
            for i in 0..total_iterations {
                info!("watch iteration {}", i + 1);
                run_scan_once(&config, &client, cli.output, *dry_run).await?;
                if i + 1 < total_iterations {
                    tokio::time::sleep(interval).await;
                }
            }
            Ok(())
        }
    }
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn build_client(config: &Config) -> Result<AmadeusClient> {
    let (api_key, api_secret) = config.amadeus_credentials()?;
    Ok(AmadeusClient::new(
        config.amadeus.base_url.clone(),
        api_key,
        api_secret,
        config.search.currency.clone(),
        Duration::from_millis(config.throttle.min_request_gap_ms),
    ))
}

async fn run_scan_once(
    config: &Config,
    client: &AmadeusClient,
    output: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    let mut store = SeenDealStore::new(config.resolved_snapshot_path(), config.dedupe.ttl_ms());
    store.load();
    info!(
        "{} fingerprint(s) loaded from {}",
        store.len(),
        store.path().display()
    );

    let report = run_scan(client, &mut store, config).await;
    info!(
        "scan finished: {} route(s), {} new deal(s)",
        report.routes_scanned,
        report.deals.len()
    );

    dispatch_alerts(config, &report, dry_run).await;

    if dry_run {
        info!("dry run, snapshot not saved");
    } else {
        store.save()?;
    }

    match output {
        OutputFormat::Table => {
            if report.deals.is_empty() {
                println!("No new deals.");
            } else {
                println!("{}", render_deals_table(&report.deals));
            }
        }
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }
    Ok(())
}

/// Summary first, then the cheapest deals, capped to keep the chat readable.
async fn dispatch_alerts(config: &Config, report: &ScanReport, dry_run: bool) {
    if report.deals.is_empty() {
        return;
    }
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if config.alerts.enable_stdout || dry_run {
        sinks.push(Box::new(StdoutSink));
    }
    if !dry_run {
        if let Some((bot_token, chat_id)) = config.telegram_credentials() {
            sinks.push(Box::new(TelegramSink::new(bot_token, chat_id)));
        }
    }
    if sinks.is_empty() {
        return;
    }

    let mut ranked: Vec<&Deal> = report.deals.iter().collect();
    ranked.sort_by(|a, b| a.price.total_cmp(&b.price));
    ranked.truncate(config.alerts.max_messages_per_scan);

    let mut messages = vec![summary_message(&config.search.origin, report)];
    messages.extend(
        ranked
            .iter()
            .map(|deal| deal_message(&config.search.origin, deal)),
    );

    let between_messages = Duration::from_millis(config.throttle.between_messages_ms);
    let total = messages.len();
    for (i, message) in messages.iter().enumerate() {
        for sink in &sinks {
            if let Err(err) = sink.send(message).await {
                warn!("failed sending alert: {err}");
            }
        }
        if i + 1 < total {
            tokio::time::sleep(between_messages).await;
        }
    }
}
