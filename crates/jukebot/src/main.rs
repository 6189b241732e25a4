// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! jukebot - a multi-tenant chat-driven audio jukebox.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod gateway;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jukebot - a multi-tenant chat-driven audio jukebox.
#[derive(Parser, Debug)]
#[command(name = "jukebot", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (otherwise the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the jukebot service.
    Serve,
    /// Print the effective configuration.
    Config,
}

fn load_config(path: &Option<PathBuf>) -> Result<jukebot_config::JukebotConfig, String> {
    let loaded = match path {
        Some(path) => jukebot_config::load_config_from_path(path),
        None => jukebot_config::load_config(),
    };
    loaded.map_err(|e| format!("config error: {e}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => match load_config(&cli.config) {
            Ok(config) => serve::run_serve(config).await.map_err(|e| e.to_string()),
            Err(e) => Err(e),
        },
        Commands::Config => match load_config(&cli.config) {
            Ok(config) => {
                match serde_json::to_string_pretty(&config) {
                    Ok(rendered) => {
                        println!("{rendered}");
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
            Err(e) => Err(e),
        },
    };

    if let Err(message) = result {
        eprintln!("jukebot: {message}");
        std::process::exit(1);
    }
}
