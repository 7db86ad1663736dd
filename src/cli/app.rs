use clap::{Args, Parser, Subcommand};

use super::commands::label_values::{LabelNamesArgs, LabelValuesArgs};
use super::commands::query::QueryArgs;
use super::commands::series::SeriesArgs;
use super::commands::snapshot::SnapshotArgs;
use crate::api::ClientOptions;
use crate::api::ConnectionSettings;
use crate::auth::{AuthOptions, Scope};
use crate::config::Config;
use crate::render::OutputFormat;

#[derive(Parser)]
#[command(name = "maia")]
#[command(version)]
#[command(about = "Query the Maia multi-tenant metrics service")]
pub struct Cli {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get a snapshot of the current metric values for a project/domain
    Snapshot(SnapshotArgs),
    /// Perform a PromQL query
    Query(QueryArgs),
    /// List measurement series for a project/domain
    Series(SeriesArgs),
    /// Get the values of a label
    LabelValues(LabelValuesArgs),
    /// Get the list of metric names
    MetricNames,
    /// Get the list of label names
    LabelNames(LabelNamesArgs),
}

/// OpenStack credentials, also taken from the usual `OS_*` variables
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// OpenStack authentication URL
    #[arg(long, global = true, env = "OS_AUTH_URL")]
    pub os_auth_url: Option<String>,

    /// OpenStack username
    #[arg(long, global = true, env = "OS_USERNAME")]
    pub os_username: Option<String>,

    /// OpenStack user ID
    #[arg(long, global = true, env = "OS_USER_ID")]
    pub os_user_id: Option<String>,

    /// OpenStack password
    #[arg(long, global = true, env = "OS_PASSWORD", hide_env_values = true)]
    pub os_password: Option<String>,

    /// Domain name of the user
    #[arg(long, global = true, env = "OS_USER_DOMAIN_NAME")]
    pub os_user_domain_name: Option<String>,

    /// Domain ID of the user
    #[arg(long, global = true, env = "OS_USER_DOMAIN_ID")]
    pub os_user_domain_id: Option<String>,

    /// Project name to scope to
    #[arg(long, global = true, env = "OS_PROJECT_NAME")]
    pub os_project_name: Option<String>,

    /// Project ID to scope to
    #[arg(long, global = true, env = "OS_PROJECT_ID")]
    pub os_project_id: Option<String>,

    /// Domain name of the project
    #[arg(long, global = true, env = "OS_PROJECT_DOMAIN_NAME")]
    pub os_project_domain_name: Option<String>,

    /// Domain name to scope to
    #[arg(long, global = true, env = "OS_DOMAIN_NAME")]
    pub os_domain_name: Option<String>,

    /// Domain ID to scope to
    #[arg(long, global = true, env = "OS_DOMAIN_ID")]
    pub os_domain_id: Option<String>,

    /// Keystone token
    #[arg(long, global = true, env = "OS_TOKEN", hide_env_values = true)]
    pub os_token: Option<String>,

    /// Authentication type: password, token or v3applicationcredential
    #[arg(long, global = true, env = "OS_AUTH_TYPE")]
    pub os_auth_type: Option<String>,

    /// Application credential name
    #[arg(long, global = true, env = "OS_APPLICATION_CREDENTIAL_NAME")]
    pub os_application_credential_name: Option<String>,

    /// Application credential ID
    #[arg(long, global = true, env = "OS_APPLICATION_CREDENTIAL_ID")]
    pub os_application_credential_id: Option<String>,

    /// Application credential secret
    #[arg(
        long,
        global = true,
        env = "OS_APPLICATION_CREDENTIAL_SECRET",
        hide_env_values = true
    )]
    pub os_application_credential_secret: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// URL of the Maia service (overrides the service catalog)
    #[arg(long, global = true, env = "MAIA_URL")]
    pub maia_url: Option<String>,

    /// URL of the Prometheus server backing Maia; skips authentication
    #[arg(long, global = true, env = "MAIA_PROMETHEUS_URL")]
    pub prometheus_url: Option<String>,

    /// Use global keystone backend for metrics queries
    #[arg(long, global = true)]
    pub global: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format (default depends on the command)
    #[arg(short, long, global = true, ignore_case = true)]
    pub format: Option<OutputFormat>,

    /// Columns to print, comma-separated (table and value formats)
    #[arg(short, long, global = true)]
    pub columns: Option<String>,

    /// Separator between columns
    #[arg(long, global = true, default_value = " ")]
    pub separator: String,

    /// Handlebars template applied to the JSON response (--format template)
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Time zone of rendered timestamps: IANA name or "local"
    #[arg(long, global = true)]
    pub timezone: Option<String>,
}

impl AuthArgs {
    pub fn to_options(&self) -> AuthOptions {
        // an explicit domain scope wins over the project's domain
        let scope_domain = self
            .os_domain_name
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| self.os_project_domain_name.clone());

        AuthOptions {
            identity_endpoint: self.os_auth_url.clone(),
            auth_type: self.os_auth_type.clone(),
            username: self.os_username.clone(),
            user_id: self.os_user_id.clone(),
            password: self.os_password.clone(),
            domain_id: self.os_user_domain_id.clone(),
            domain_name: self.os_user_domain_name.clone(),
            token: self.os_token.clone(),
            application_credential_id: self.os_application_credential_id.clone(),
            application_credential_name: self.os_application_credential_name.clone(),
            application_credential_secret: self.os_application_credential_secret.clone(),
            scope: Scope {
                project_id: self.os_project_id.clone(),
                project_name: self.os_project_name.clone(),
                domain_id: self.os_domain_id.clone(),
                domain_name: scope_domain,
            },
        }
    }
}

impl OutputArgs {
    pub fn column_list(&self) -> Vec<String> {
        self.columns
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| c.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

impl Cli {
    pub fn connection_settings(&self, config: &Config) -> ConnectionSettings {
        ConnectionSettings {
            prometheus_url: self.backend.prometheus_url.clone(),
            maia_url: self.backend.maia_url.clone(),
            global: self.backend.global,
            auth: self.auth.to_options(),
            client: ClientOptions {
                proxy: config.maia.proxy.clone(),
                federate_url: config.maia.federate_url.clone(),
                insecure: config.maia.insecure,
            },
        }
    }
}
