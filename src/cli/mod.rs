pub mod app;
pub mod commands;

pub use app::{Cli, Commands};
pub use commands::{CommandContext, OutputOptions, dispatch};

use crate::config::Config;

/// Build the invocation context and run the selected command.
pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<String> {
    let mut ctx = CommandContext::from_cli(&cli, config)?;
    dispatch(cli.command, &mut ctx).await
}
