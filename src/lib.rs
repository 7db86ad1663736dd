//! Command-line client for the Maia multi-tenant metrics service.
//!
//! Resolves OpenStack credentials into a session, runs Prometheus API queries
//! through it and renders the results as values, JSON, tables or templates.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod render;

pub use error::{MaiaError, Result};
