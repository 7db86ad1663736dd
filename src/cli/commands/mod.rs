pub mod label_values;
pub mod query;
pub mod series;
pub mod snapshot;

use chrono::{DateTime, Utc};
use log::debug;
use std::time::Duration;

use super::app::{Cli, Commands};
use crate::api::{QueryRequest, SessionManager, check_response};
use crate::config::Config;
use crate::error::Result;
use crate::render::{self, OutputFormat, OutputZone, Payload, RenderSpec};

/// Output settings common to all commands
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// `None` means the command's own default
    pub format: Option<OutputFormat>,
    pub columns: Vec<String>,
    pub separator: String,
    pub template: Option<String>,
    pub zone: OutputZone,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: None,
            columns: Vec::new(),
            separator: " ".to_string(),
            template: None,
            zone: OutputZone::default(),
        }
    }
}

/// State of one invocation, shared by the command handlers
pub struct CommandContext {
    pub sessions: SessionManager,
    pub output: OutputOptions,
    /// Reference time for defaulted time ranges
    pub now: DateTime<Utc>,
}

impl CommandContext {
    pub fn new(sessions: SessionManager, output: OutputOptions, now: DateTime<Utc>) -> Self {
        Self {
            sessions,
            output,
            now,
        }
    }

    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self> {
        let zone = match cli.output.timezone.as_deref().or(config.maia.timezone.as_deref()) {
            Some(name) if !name.is_empty() => name.parse()?,
            _ => OutputZone::default(),
        };
        let output = OutputOptions {
            format: cli.output.format,
            columns: cli.output.column_list(),
            separator: cli.output.separator.clone(),
            template: cli.output.template.clone(),
            zone,
        };
        let sessions = SessionManager::new(cli.connection_settings(config));
        Ok(Self::new(sessions, output, Utc::now()))
    }

    pub fn render_spec(&self, default: OutputFormat, step: Option<Duration>) -> RenderSpec {
        RenderSpec {
            format: self.output.format.unwrap_or(default),
            columns: self.output.columns.clone(),
            separator: self.output.separator.clone(),
            template: self.output.template.clone(),
            zone: self.output.zone,
            step,
        }
    }

    /// Send one request and render its response.
    pub async fn execute(
        &mut self,
        request: &QueryRequest,
        payload: Payload,
        default_format: OutputFormat,
    ) -> Result<String> {
        let spec = self.render_spec(default_format, request.step());
        debug!("Executing {} with format {}", request.path(), spec.format);

        let global = self.sessions.global();
        let backend = self.sessions.backend().await?;
        let response = backend.execute(request).await?;
        check_response(&response, global)?;

        render::render(
            response.body_bytes(),
            response.content_type.as_deref(),
            payload,
            &spec,
        )
    }
}

/// Run a parsed command line and return what it prints.
pub async fn dispatch(command: Commands, ctx: &mut CommandContext) -> anyhow::Result<String> {
    match command {
        Commands::Snapshot(args) => snapshot::snapshot_command(args, ctx).await,
        Commands::Query(args) => query::query_command(args, ctx).await,
        Commands::Series(args) => series::series_command(args, ctx).await,
        Commands::LabelValues(args) => label_values::label_values_command(args, ctx).await,
        Commands::MetricNames => label_values::metric_names_command(ctx).await,
        Commands::LabelNames(args) => label_values::label_names_command(args, ctx).await,
    }
}
