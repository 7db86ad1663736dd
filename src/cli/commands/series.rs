use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::api::query::builder;
use crate::render::{OutputFormat, Payload};

#[derive(Args, Debug, Clone, Default)]
pub struct SeriesArgs {
    /// Label selector restricting the series
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Start timestamp (RFC 3339 or Unix date; default: 3h before end)
    #[arg(long)]
    pub start: Option<String>,

    /// End timestamp (RFC 3339 or Unix date; default: now)
    #[arg(long)]
    pub end: Option<String>,
}

pub async fn series_command(args: SeriesArgs, ctx: &mut CommandContext) -> Result<String> {
    let request = builder::series(
        args.selector.as_deref(),
        args.start.as_deref(),
        args.end.as_deref(),
        ctx.now,
    )?;
    Ok(ctx
        .execute(&request, Payload::LabelSets, OutputFormat::Table)
        .await?)
}
