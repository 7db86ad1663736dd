use anyhow::Result;
use clap::Parser;
use colored::*;
use log::{LevelFilter, debug};
use std::io::Write;

use maia_cli::cli::{self, Cli};
use maia_cli::config::{self, Config};

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    if config::debug_requested() {
        builder.filter_module("maia_cli", LevelFilter::Debug);
        builder.filter_module("maia", LevelFilter::Debug);
    }
    // RUST_LOG wins over both defaults
    builder.parse_env("RUST_LOG");
    builder.format(|buf, record| {
        let message = record.args().to_string().replace(['\n', '\r'], " ");
        writeln!(buf, "[{} {}] {}", record.level(), record.target(), message)
    });
    builder.target(env_logger::Target::Stderr).init();
}

async fn run() -> Result<String> {
    let cli = Cli::parse();
    let config = Config::load()?;
    debug!("Starting maia");
    cli::run(cli, &config).await
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logger();

    match run().await {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
