//! Backend access for the Maia metrics service
//!
//! Request planning, the HTTP client, status classification and the
//! per-invocation session that ties them to an authenticated target.

pub mod client;
pub mod constants;
pub mod manager;
pub mod query;
pub mod status;

pub use client::{Backend, BackendResponse, ClientOptions, PrometheusClient};
pub use manager::{BackendTarget, ConnectionSettings, SessionManager};
pub use query::{QueryRequest, QueryResult, QueryWindow};
pub use status::check_response;
