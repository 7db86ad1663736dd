//! Label listings: values of one label, metric names, label names

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::api::query::builder;
use crate::render::{OutputFormat, Payload};

#[derive(Args, Debug, Clone, Default)]
pub struct LabelValuesArgs {
    /// Name of the label
    #[arg(value_name = "LABEL_NAME")]
    pub label_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LabelNamesArgs {
    /// Only consider series matching this label selector
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,
}

pub async fn label_values_command(args: LabelValuesArgs, ctx: &mut CommandContext) -> Result<String> {
    let request = builder::label_values(args.label_name.as_deref())?;
    Ok(ctx
        .execute(&request, Payload::StringList, OutputFormat::Value)
        .await?)
}

pub async fn metric_names_command(ctx: &mut CommandContext) -> Result<String> {
    Ok(ctx
        .execute(&builder::metric_names(), Payload::StringList, OutputFormat::Value)
        .await?)
}

pub async fn label_names_command(args: LabelNamesArgs, ctx: &mut CommandContext) -> Result<String> {
    let request = builder::labels(
        args.selector.as_deref(),
        args.start.as_deref(),
        args.end.as_deref(),
    );
    Ok(ctx
        .execute(&request, Payload::StringList, OutputFormat::Value)
        .await?)
}
