use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use proofd_core::api::{self, ErrorBody, SaveResponse};
use proofd_core::config::Config;
use proofd_core::event::{self, PurchaseEvent};
use proofd_core::view;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "proofctl", about = "Manage a proofd notification server")]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, default_value_t = api::default_server_url())]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current settings as JSON
    Get,
    /// Replace the settings with a JSON document
    Set {
        /// Path to the settings document
        file: PathBuf,
    },
    /// Print synthesized purchase events
    Mock {
        /// Number of events
        #[arg(default_value_t = api::DEFAULT_MOCK_COUNT)]
        count: usize,
    },
    /// Render a popup locally without contacting the server
    Preview {
        /// Settings document to preview (defaults to built-in settings)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the HTML fragment instead of a text summary
        #[arg(long)]
        html: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.server.trim_end_matches('/');

    match cli.command {
        Command::Get => {
            let url = format!("{base}{}", api::PATH_SETTINGS);
            let config: Config = reqwest::blocking::get(&url)
                .with_context(|| format!("connecting to proofd at {url}\nIs the server running?"))?
                .error_for_status()?
                .json()
                .context("decoding settings")?;
            println!("{}", config.to_json_pretty()?);
        }
        Command::Set { file } => {
            let config = read_config(&file)?;
            let url = format!("{base}{}", api::PATH_SETTINGS);
            let response = reqwest::blocking::Client::new()
                .post(&url)
                .json(&config)
                .send()
                .with_context(|| format!("connecting to proofd at {url}\nIs the server running?"))?;
            if response.status().is_success() {
                let saved: SaveResponse = response.json().context("decoding response")?;
                if saved.success {
                    println!("settings saved");
                }
            } else {
                let status = response.status();
                let body: ErrorBody = response.json().context("decoding error response")?;
                bail!(
                    "server rejected settings ({status}): {}{}",
                    body.error,
                    body.details.map(|d| format!(": {d}")).unwrap_or_default()
                );
            }
        }
        Command::Mock { count } => {
            let url = format!("{base}{}/{count}", api::PATH_MOCK_PURCHASES);
            let events: Vec<PurchaseEvent> = reqwest::blocking::get(&url)
                .with_context(|| format!("connecting to proofd at {url}\nIs the server running?"))?
                .error_for_status()?
                .json()
                .context("decoding purchases")?;
            for e in events {
                println!(
                    "{:<10} {:<10} {:<16} {:>8}  {}",
                    e.customer,
                    e.location,
                    e.product,
                    event::format_currency(e.price),
                    e.timestamp.with_timezone(&Local).format("%H:%M")
                );
            }
        }
        Command::Preview { file, html } => {
            let config = match file {
                Some(path) => read_config(&path)?,
                None => Config::default(),
            };
            let view = view::build(&config, &event::random_purchase(), &Local::now());
            if html {
                println!("{}", view.to_html());
            } else {
                println!("{}", view.summary());
            }
        }
    }

    Ok(())
}

fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Config::from_json(&contents).with_context(|| format!("parsing {}", path.display()))
}
