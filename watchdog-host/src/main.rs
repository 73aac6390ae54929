//! codex-watchdog - poll the watchdog beacon on a fixed cadence
//!
//! Every tick drains the beacon and prints each event as one JSON line on
//! stdout. Logs go to stderr, filtered by `RUST_LOG` (default: info).

mod sources;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use codex_watchdog::{BEACON_NAME, Beacon, OutputEvent, WatchdogBeacon};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Watch files and print their changes as events",
    long_about = None
)]
struct Args {
    /// Beacon configuration (YAML). Repeat to layer several files; later ones win.
    #[arg(short, long = "config", value_name = "FILE", required = true)]
    config: Vec<PathBuf>,

    /// Seconds between polls
    #[arg(short, long, default_value_t = 1)]
    interval: u64,

    /// Wait one interval, print whatever changed, and exit
    #[arg(long)]
    once: bool,
}

#[derive(Serialize)]
struct TaggedEvent<'a> {
    tag: &'static str,
    #[serde(flatten)]
    event: &'a OutputEvent,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let fragments = sources::load_fragments(&args.config)?;

    let Some(beacon) = WatchdogBeacon::register() else {
        bail!("{BEACON_NAME} beacon is unavailable on this host");
    };

    let validation = beacon.validate(&fragments);
    if !validation.valid {
        bail!(validation.message);
    }
    info!("{}", validation.message);

    let interval = Duration::from_secs(args.interval.max(1));

    if args.once {
        poll_and_print(&beacon, &fragments)?;
        tokio::time::sleep(interval).await;
        poll_and_print(&beacon, &fragments)?;
        beacon.close(&fragments);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = poll_and_print(&beacon, &fragments) {
                    error!("{BEACON_NAME} poll failed: {e:#}");
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    beacon.close(&fragments);
    Ok(())
}

fn poll_and_print(beacon: &impl Beacon, fragments: &[Value]) -> Result<()> {
    let events = beacon.poll(fragments)?;
    if events.is_empty() {
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    for event in &events {
        serde_json::to_writer(
            &mut stdout,
            &TaggedEvent {
                tag: beacon.name(),
                event,
            },
        )?;
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tagged_event_is_flat() {
        let event = OutputEvent {
            path: "/etc/important_file".to_string(),
            change: "created".to_string(),
        };
        let tagged = TaggedEvent {
            tag: BEACON_NAME,
            event: &event,
        };

        assert_eq!(
            serde_json::to_value(&tagged).unwrap(),
            json!({"tag": "watchdog", "path": "/etc/important_file", "change": "created"})
        );
    }

    #[test]
    fn test_args_parse_once_and_layered_configs() {
        let args =
            Args::try_parse_from(["codex-watchdog", "-c", "a.yaml", "-c", "b.yaml", "--once"])
                .unwrap();

        assert_eq!(args.config, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
        assert_eq!(args.interval, 1);
        assert!(args.once);
    }

    #[test]
    fn test_args_require_config() {
        assert!(Args::try_parse_from(["codex-watchdog", "--once"]).is_err());
    }
}
