// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! vibecanvas CLI entrypoint.
//!
//! By default this serves MCP over stdio; the agent starts the WebSocket hub with the
//! `vibe_start` tool. `--start-hub` starts it up front, and `--hub-only` serves just the hub
//! in the foreground. Logs go to stderr because stdout carries JSON-RPC.

use std::error::Error;
use std::net::IpAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vibecanvas::config::{HubConfig, DEFAULT_HUB_PORT, DEFAULT_QUEUE_CAPACITY};
use vibecanvas::hub::Hub;
use vibecanvas::mcp::types::VibeStartParams;
use vibecanvas::mcp::{serve_stdio, Dispatcher};

#[derive(Debug, Parser)]
#[command(name = "vibecanvas", version)]
#[command(about = "Live design canvas shared between an MCP agent and browsers")]
struct Cli {
    /// Serve only the WebSocket hub in the foreground, without the stdio MCP session
    #[arg(long, conflicts_with = "start_hub")]
    hub_only: bool,

    /// Start the WebSocket hub at launch instead of waiting for vibe_start
    #[arg(long)]
    start_hub: bool,

    /// WebSocket hub port
    #[arg(long, default_value_t = DEFAULT_HUB_PORT)]
    port: u16,

    /// WebSocket hub bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Frames buffered per browser before it is dropped as too slow
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn hub_config(&self) -> HubConfig {
        HubConfig {
            host: self.host,
            port: self.port,
            queue_capacity: self.queue_capacity,
            ..HubConfig::default()
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = (|| -> Result<(), Box<dyn Error>> {
        let config = cli.hub_config();
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(async move {
            if cli.hub_only {
                let hub = Hub::new(config);
                let stopper = hub.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("interrupt received");
                        stopper.shutdown();
                    }
                });
                hub.bind_and_serve().await?;
                return Ok::<(), Box<dyn Error>>(());
            }

            let dispatcher = Dispatcher::new(config);
            if cli.start_hub {
                dispatcher
                    .vibe_start(VibeStartParams { mode: None, port: Some(cli.port) })
                    .await?;
            }
            info!(version = env!("CARGO_PKG_VERSION"), "serving MCP over stdio");
            let served = serve_stdio(dispatcher.registry()?).await;
            dispatcher.shutdown().await;
            served?;
            Ok(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("vibecanvas: {err}");
        std::process::exit(1);
    }
}
