//! Backend paths, header names and content types

/// Base path of the Prometheus HTTP API
pub const API_BASE_PATH: &str = "/api/v1";

/// Federation endpoint, outside the versioned API
pub const FEDERATE_PATH: &str = "/federate";

/// Service type of the metrics service in the identity catalog
pub const METRICS_SERVICE_TYPE: &str = "metrics";

/// Reserved label holding the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    pub const CONTENT_TYPE_TEXT: &str = "text/plain";

    /// Bearer token for the metrics service
    pub const AUTH_TOKEN: &str = "X-Auth-Token";

    /// Token issued by the identity service
    pub const SUBJECT_TOKEN: &str = "X-Subject-Token";

    /// Asks the service to answer from the global (cross-region) backend
    pub const GLOBAL_REGION: &str = "X-Global-Region";
}

pub fn query_path() -> String {
    format!("{}/query", API_BASE_PATH)
}

pub fn query_range_path() -> String {
    format!("{}/query_range", API_BASE_PATH)
}

pub fn series_path() -> String {
    format!("{}/series", API_BASE_PATH)
}

pub fn labels_path() -> String {
    format!("{}/labels", API_BASE_PATH)
}

pub fn label_values_path(name: &str) -> String {
    format!("{}/label/{}/values", API_BASE_PATH, name)
}
