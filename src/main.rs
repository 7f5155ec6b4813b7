//! Packet Inspector - reports raw Ethernet frames seen on the wire.

use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use packet_inspector::capture::list_interfaces;
use packet_inspector::{CaptureConfig, CaptureError, Inspector};

#[derive(Parser, Debug)]
#[command(name = "packet-inspector")]
#[command(about = "Capture raw Ethernet frames from the network")]
#[command(version)]
struct Cli {
    /// Network interface to capture on (default: all interfaces)
    #[arg(short, long)]
    interface: Option<String>,

    /// Read buffer size in bytes; longer frames are truncated
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    count: Option<NonZeroUsize>,

    /// List available network interfaces and exit
    #[arg(short, long)]
    list_interfaces: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_interfaces {
        let interfaces = list_interfaces();
        if interfaces.is_empty() {
            println!("No network interfaces found");
        }
        for iface in interfaces {
            println!("{}", iface);
        }
        return ExitCode::SUCCESS;
    }

    let mut config = match CaptureConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(interface) = cli.interface.clone() {
        config.interface = Some(interface);
    }
    if let Some(size) = cli.buffer_size {
        config.buffer_size = size;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(&config, cli.count) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if matches!(
                e.downcast_ref::<CaptureError>(),
                Some(CaptureError::InsufficientPermissions(_))
            ) {
                eprintln!("Hint: run as root or grant CAP_NET_RAW:");
                eprintln!("  sudo setcap cap_net_raw+ep $(which packet-inspector)");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CaptureConfig, count: Option<NonZeroUsize>) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let mut inspector = Inspector::from_config(config)?;
    inspector.open()?;
    info!("Press Ctrl+C to stop");

    let mut seen = 0usize;
    for frame in inspector.frames(running) {
        let frame = frame?;
        seen += 1;
        info!("frame {}: {} bytes", seen, frame.len());

        if count.is_some_and(|n| seen >= n.get()) {
            break;
        }
    }

    inspector.close()?;
    info!("Stopped after {} frames", seen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_must_be_positive() {
        assert!(Cli::try_parse_from(["packet-inspector", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["packet-inspector", "--count", "-1"]).is_err());
    }

    #[test]
    fn test_count_parsed() {
        let cli = Cli::try_parse_from(["packet-inspector", "-n", "3", "-i", "eth0"]).unwrap();
        assert_eq!(cli.count.map(NonZeroUsize::get), Some(3));
        assert_eq!(cli.interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_count_optional() {
        let cli = Cli::try_parse_from(["packet-inspector"]).unwrap();
        assert!(cli.count.is_none());
        assert!(!cli.list_interfaces);
    }
}
