use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricemonitor::client::grid::GridRequest;
use pricemonitor::client::submit::Navigation;
use pricemonitor::client::DEFAULT_SERVER;
use pricemonitor::{api, cron, export};
use pricemonitor::{Database, HttpProductSource, PriceMonitor, PriceMonitorClient, Settings};

#[derive(Parser)]
#[command(name = "pricemonitor", about = "Track product prices from shop pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the pages and the JSON endpoints
    Serve,
    /// Re-scrape tracked products on a fixed interval
    Cron {
        /// Run a single refresh and exit
        #[arg(long)]
        once: bool,
    },
    /// Submit a product link to a running server
    Add {
        link: String,
        #[arg(long, env = "PRICEMONITOR_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Print one page of the product listing
    List {
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = 10)]
        length: u32,
        #[arg(long, env = "PRICEMONITOR_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Print a product's price history
    History {
        product_id: i64,
        /// Print the chart configuration as JSON
        #[arg(long)]
        json: bool,
        #[arg(long, env = "PRICEMONITOR_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Write a product's stored price history to CSV
    Export {
        product_id: i64,
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Number of records, newest first; 0 uses HISTORY_LIMIT
        #[arg(long, default_value_t = 0)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pricemonitor=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let monitor = build_monitor(&settings).await?;
            api::start_server(monitor, &settings.bind_address(), &settings.assets_dir).await?;
        }
        Command::Cron { once } => {
            let monitor = build_monitor(&settings).await?;
            if once {
                cron::refresh_once(&monitor).await;
            } else {
                cron::run(&monitor, settings.refresh.interval).await?;
            }
        }
        Command::Add { link, server } => {
            let client = PriceMonitorClient::new(&server)?;
            match client.submit(&link).await {
                Navigation::Redirect(path) => println!("Tracking product: {}{}", server.trim_end_matches('/'), path),
                Navigation::Alert(message) => anyhow::bail!(message),
            }
        }
        Command::List { start, length, server } => {
            let client = PriceMonitorClient::new(&server)?;
            let page = client.list_products(&GridRequest::new(1, start, length)).await?;

            println!("{:<6} {:<40} {:>18} {:>18}", "ID", "Name", "Current", "Original");
            println!("{}", "-".repeat(85));
            for row in &page.products {
                println!(
                    "{:<6} {:<40} {:>18} {:>18}",
                    row.id,
                    row.name,
                    settings.currency.format(row.current_price),
                    settings.currency.format(row.original_price),
                );
            }
            println!(
                "\nShowing {} of {} products (from {})",
                page.products.len(),
                page.records_total,
                start
            );
        }
        Command::History { product_id, json, server } => {
            let client = PriceMonitorClient::new(&server)?;
            let chart = client.load_chart(product_id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&chart)?);
            } else {
                println!("{:<34} {:>18} {:>18}", "Updated", "Current", "Original");
                println!("{}", "-".repeat(72));
                for (label, current, original) in chart.points() {
                    println!(
                        "{:<34} {:>18} {:>18}",
                        label,
                        settings.currency.format(current),
                        settings.currency.format(original),
                    );
                }
            }
        }
        Command::Export { product_id, output, limit } => {
            let monitor = build_monitor(&settings).await?;
            let history = monitor.list_price_history(product_id, limit).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::generate_filename(product_id)));

            export::save_history_to_csv(&history, |p| settings.currency.format(p), &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} records saved to: {}", history.len(), path.display());
        }
    }

    Ok(())
}

async fn build_monitor(settings: &Settings) -> Result<PriceMonitor> {
    let db = Database::new(&settings.database_url, settings.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", settings.database_url))?;
    let source = HttpProductSource::new()?;

    Ok(PriceMonitor::new(Arc::new(db), Arc::new(source), settings))
}
