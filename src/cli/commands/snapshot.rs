use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::api::query::builder;
use crate::render::{OutputFormat, Payload};

#[derive(Args, Debug, Clone, Default)]
pub struct SnapshotArgs {
    /// Label selector restricting the metrics (e.g. 'job="api"')
    #[arg(short = 'l', long)]
    pub selector: Option<String>,
}

/// Current values of all matching series, in federation text format
pub async fn snapshot_command(args: SnapshotArgs, ctx: &mut CommandContext) -> Result<String> {
    let request = builder::snapshot(args.selector.as_deref());
    Ok(ctx
        .execute(&request, Payload::StringList, OutputFormat::Value)
        .await?)
}
