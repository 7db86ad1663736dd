use anyhow::Result;
use clap::Args;
use std::time::Duration;

use super::CommandContext;
use crate::api::query::builder::{self, QueryWindow};
use crate::api::query::time::parse_duration;
use crate::error::MaiaError;
use crate::render::{OutputFormat, Payload};

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// PromQL expression, passed through unchanged
    #[arg(value_name = "PROMQL_QUERY")]
    pub query: Option<String>,

    /// Range query: start timestamp (RFC 3339 or Unix date; default: 3h before end)
    #[arg(long)]
    pub start: Option<String>,

    /// Range query: end timestamp (RFC 3339 or Unix date; default: now)
    #[arg(long)]
    pub end: Option<String>,

    /// Instant query: evaluation timestamp (default: now)
    #[arg(long)]
    pub time: Option<String>,

    /// Query timeout, e.g. 10m (default: server setting)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Range query step, e.g. 30s (default: sized for about ten values)
    #[arg(long, value_parser = parse_duration)]
    pub step: Option<Duration>,
}

pub async fn query_command(args: QueryArgs, ctx: &mut CommandContext) -> Result<String> {
    let expr = args
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| MaiaError::config("missing argument: PromQL Query"))?;

    let window = QueryWindow {
        time: args.time,
        start: args.start,
        end: args.end,
        step: args.step,
        timeout: args.timeout,
    };
    let request = builder::query(&expr, &window, ctx.now)?;

    Ok(ctx
        .execute(&request, Payload::QueryResult, OutputFormat::Json)
        .await?)
}
