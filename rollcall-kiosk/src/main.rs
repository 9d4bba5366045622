//! rollcall-kiosk - operator console
//!
//! Reads scanner bursts and commands from stdin, forwards taps to the
//! attendance server and keeps a local mirror of what it has seen.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_kiosk::{ApiClient, Console, KioskArgs, KioskConfig, LocalMirror, MirrorStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall_kiosk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting rollcall-kiosk v{}", env!("CARGO_PKG_VERSION"));

    let config = KioskConfig::load(KioskArgs::parse());
    info!("Server: {}", config.server_url);
    info!("Data directory: {}", config.data_dir.display());

    let store = MirrorStore::open(&config.data_dir).with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.data_dir.display()
        )
    })?;
    let mirror = LocalMirror::load(store);
    let api = ApiClient::new(&config.server_url).context("Failed to initialize API client")?;

    let mut console = Console::new(api, mirror, config.download_dir);
    for line in console.sync().await.lines {
        println!("{}", line);
    }
    println!("{}", rollcall_kiosk::console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", console.prompt());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = console.handle_line(&line).await;
        for line in &reply.lines {
            println!("{}", line);
        }
        if reply.quit {
            break;
        }
    }

    info!("rollcall-kiosk stopped");
    Ok(())
}
