mod client;
mod scheduler;
mod timer;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use client::ApiClient;
use proofd_core::api;
use proofd_core::config::Config;
use proofd_core::event::PurchaseEvent;
use scheduler::{Action, Scheduler};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "proofd-popup", about = "Show purchase notifications from a proofd server")]
struct Cli {
    /// Server base URL
    #[arg(long, default_value_t = api::default_server_url())]
    server: String,
    /// Print each popup's HTML fragment to stdout
    #[arg(long)]
    html: bool,
    /// Exit after the first popup has been removed
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proofd_popup=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    info!(server = %cli.server, "proofd-popup starting");

    let client = ApiClient::new(&cli.server)?;
    let config = load_config(&client).await;
    let mut scheduler = Scheduler::new(config);
    info!(
        interval_ms = scheduler.config().timing.interval.as_millis() as u64,
        position = ?scheduler.config().display.position,
        "scheduler ready"
    );

    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<Result<PurchaseEvent>>();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    let actions = scheduler.start(Instant::now());
    let mut done = perform(actions, &scheduler, &cli, &client, &fetch_tx);

    while !done {
        let deadline = scheduler.next_deadline();
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep(Duration::from_secs(86400)),
        };
        let has_deadline = deadline.is_some();

        let actions = tokio::select! {
            Some(result) = fetch_rx.recv() => match result {
                Ok(event) => scheduler.deliver(event, Instant::now(), &Local::now()),
                Err(e) => scheduler.fetch_failed(&format!("{e:#}")),
            },
            _ = sleep_fut, if has_deadline => scheduler.check_timer(Instant::now()),
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim() == "close" => match scheduler.active() {
                    Some(active) => {
                        let id = active.id;
                        debug!(id = %id, customer = %active.event.customer, "close requested");
                        scheduler.close(id, Instant::now())
                    }
                    None => Vec::new(),
                },
                Ok(Some(line)) => {
                    debug!(input = %line.trim(), "ignoring unknown command");
                    Vec::new()
                }
                Ok(None) | Err(_) => {
                    stdin_open = false;
                    Vec::new()
                }
            },
            _ = hangup.recv() => {
                info!("SIGHUP received, reloading settings");
                scheduler.reload(load_config(&client).await);
                Vec::new()
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = terminate.recv() => break,
        };

        done = perform(actions, &scheduler, &cli, &client, &fetch_tx);
    }

    info!("proofd-popup shutting down");
    Ok(())
}

/// Settings from the server, or the built-in defaults if they can't be read.
async fn load_config(client: &ApiClient) -> Config {
    match client.fetch_config().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to load settings, using defaults");
            Config::default()
        }
    }
}

/// Carry out scheduler actions. Returns true when the process should exit.
fn perform(
    actions: Vec<Action>,
    scheduler: &Scheduler,
    cli: &Cli,
    client: &ApiClient,
    fetch_tx: &mpsc::UnboundedSender<Result<PurchaseEvent>>,
) -> bool {
    let mut done = false;
    for action in actions {
        match action {
            Action::FetchEvent => {
                let client = client.clone();
                let tx = fetch_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(client.fetch_event().await);
                });
            }
            Action::Mount { id, view } => {
                info!(id = %id, text = %view.summary(), "popup shown");
                if cli.html {
                    println!("{}", view.to_html());
                }
            }
            Action::Reveal { id } => {
                debug!(id = %id, frame = ?scheduler.frame(Instant::now()), "popup at rest")
            }
            Action::BeginExit { id } => debug!(id = %id, "popup leaving"),
            Action::Unmount { id } => {
                info!(id = %id, "popup removed");
                done |= cli.once;
            }
        }
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::PopupId;

    fn cli(once: bool) -> Cli {
        Cli { server: "http://127.0.0.1:1".into(), html: false, once }
    }

    fn perform_with(cli: &Cli, actions: Vec<Action>) -> bool {
        let client = ApiClient::new(&cli.server).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(Config::default());
        perform(actions, &scheduler, cli, &client, &tx)
    }

    // --- exit handling ---

    #[tokio::test]
    async fn once_exits_after_unmount() {
        let id = PopupId(1);
        assert!(perform_with(&cli(true), vec![Action::BeginExit { id }, Action::Unmount { id }]));
    }

    #[tokio::test]
    async fn once_keeps_running_until_unmount() {
        let id = PopupId(1);
        assert!(!perform_with(&cli(true), vec![Action::Reveal { id }, Action::BeginExit { id }]));
    }

    #[tokio::test]
    async fn without_once_unmount_keeps_running() {
        assert!(!perform_with(&cli(false), vec![Action::Unmount { id: PopupId(1) }]));
    }
}
