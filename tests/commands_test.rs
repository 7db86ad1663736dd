//! End-to-end command tests against a fake backend
//!
//! Every test parses a real command line, runs the handler and compares the
//! buffered output with what the backend fixture should render to.

mod common;

use common::{fixture, json_fixture, maia_error, run_with, status_response, text_fixture};
use maia_cli::api::{BackendResponse, QueryRequest};
use maia_cli::error::MaiaError;
use reqwest::StatusCode;
use std::time::Duration;

const KEYSTONE_QUERY: &str = "sum(blackbox_api_status_gauge{check=~\"keystone\"})";

/// Snapshot passes the federation text through unchanged
#[tokio::test]
async fn test_snapshot_values() {
    let (output, requests) = run_with(
        &["snapshot", "--format", "vAlue", "--selector", "vmware_name=\"win_cifs_13\""],
        text_fixture("federate.txt"),
    )
    .await;

    assert_eq!(output.unwrap().as_bytes(), fixture("federate.txt").as_slice());
    assert_eq!(
        requests,
        vec![QueryRequest::Snapshot {
            selectors: vec!["{vmware_name=\"win_cifs_13\"}".to_string()]
        }]
    );
}

#[tokio::test]
async fn test_snapshot_rejects_json_format() {
    let (output, _) = run_with(&["snapshot", "--format", "json"], text_fixture("federate.txt")).await;
    let err = output.unwrap_err();
    assert!(matches!(maia_error(&err), MaiaError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_series_json() {
    let (output, requests) = run_with(
        &[
            "series",
            "--selector",
            "component!=\"\"",
            "--start",
            "2017-07-01T20:10:30.781Z",
            "--end",
            "2017-07-02T04:00:00.000Z",
            "--format",
            "jsoN",
        ],
        json_fixture("series.json"),
    )
    .await;

    assert_eq!(output.unwrap().as_bytes(), fixture("series.json").as_slice());
    assert_eq!(
        requests,
        vec![QueryRequest::Series {
            selectors: vec!["{component!=\"\"}".to_string()],
            start: "2017-07-01T20:10:30.781Z".to_string(),
            end: "2017-07-02T04:00:00.000Z".to_string(),
        }]
    );
}

/// Series default to a table with every label as a column
#[tokio::test]
async fn test_series_table() {
    let (output, _) = run_with(
        &["series", "--selector", "component!=\"\""],
        json_fixture("series.json"),
    )
    .await;

    assert_eq!(
        output.unwrap(),
        "__name__ component instance job kubernetes_name kubernetes_namespace os_cluster region system\n\
         up objectstore 100.64.1.159:9102 endpoints swift-proxy-cluster-3 swift cluster-3 staging openstack\n"
    );
}

#[tokio::test]
async fn test_series_default_range() {
    let (_, requests) = run_with(&["series"], json_fixture("series.json")).await;
    assert_eq!(
        requests,
        vec![QueryRequest::Series {
            selectors: vec!["{}".to_string()],
            start: "2017-07-13T20:00:00Z".to_string(),
            end: "2017-07-13T23:00:00Z".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_label_values_json() {
    let (output, requests) = run_with(
        &["label-values", "component", "--format", "jSon"],
        json_fixture("label_values.json"),
    )
    .await;

    assert_eq!(output.unwrap().as_bytes(), fixture("label_values.json").as_slice());
    assert_eq!(
        requests,
        vec![QueryRequest::LabelValues {
            name: "component".to_string()
        }]
    );
}

#[tokio::test]
async fn test_label_values_value() {
    let (output, _) = run_with(
        &["label-values", "component", "--format", "VaLue"],
        json_fixture("label_values.json"),
    )
    .await;
    assert_eq!(output.unwrap(), "objectstore\n");
}

/// A missing label name is rejected before anything is sent
#[tokio::test]
async fn test_label_values_requires_name() {
    let (output, requests) = run_with(&["label-values"], json_fixture("label_values.json")).await;
    let err = output.unwrap_err();
    assert_eq!(err.to_string(), "missing argument: label-name");
    assert!(matches!(maia_error(&err), MaiaError::Configuration(_)));
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_metric_names_value() {
    let (output, requests) = run_with(&["metric-names"], json_fixture("metric_names.json")).await;

    assert_eq!(
        output.unwrap(),
        "vcenter_cpu_costop_summation\n\
         vcenter_cpu_demand_average\n\
         vcenter_cpu_idle_summation\n\
         vcenter_cpu_latency_average\n"
    );
    assert_eq!(
        requests,
        vec![QueryRequest::LabelValues {
            name: "__name__".to_string()
        }]
    );
}

#[tokio::test]
async fn test_label_names() {
    let (output, requests) = run_with(
        &["label-names", "--selector", "job=\"api\""],
        json_fixture("metric_names.json"),
    )
    .await;

    assert_eq!(output.unwrap().lines().count(), 4);
    assert_eq!(
        requests,
        vec![QueryRequest::Labels {
            selectors: vec!["{job=\"api\"}".to_string()],
            start: None,
            end: None,
        }]
    );
}

#[tokio::test]
async fn test_query_json() {
    let (output, requests) = run_with(
        &[
            "query",
            KEYSTONE_QUERY,
            "--time",
            "2017-07-01T20:10:30.781Z",
            "--timeout",
            "1440s",
        ],
        json_fixture("query.json"),
    )
    .await;

    assert_eq!(output.unwrap().as_bytes(), fixture("query.json").as_slice());
    assert_eq!(
        requests,
        vec![QueryRequest::Instant {
            query: KEYSTONE_QUERY.to_string(),
            time: Some("2017-07-01T20:10:30.781Z".to_string()),
            timeout: Some(Duration::from_secs(1440)),
        }]
    );
    assert_eq!(requests[0].params()[2], ("timeout", "1440s".to_string()));
}

#[tokio::test]
async fn test_query_table() {
    let (output, _) = run_with(
        &["query", KEYSTONE_QUERY, "--format", "TaBle", "--time", "2017-07-03T07:26:23.997Z"],
        json_fixture("query.json"),
    )
    .await;
    assert_eq!(output.unwrap(), "__timestamp__ __value__\n2017-07-03T07:26:23.997Z 0\n");
}

#[tokio::test]
async fn test_query_table_columns() {
    let (output, _) = run_with(
        &["query", "limes_domain_quota", "--format", "TaBle", "--columns", "domain"],
        json_fixture("query2.json"),
    )
    .await;
    assert_eq!(
        output.unwrap(),
        "domain __timestamp__ __value__\n\
         monsoon3 2019-05-09T12:00:10.724Z 54975581388800\n\
         monsoon3 2019-05-09T12:00:10.724Z 11240\n"
    );
}

#[tokio::test]
async fn test_query_table_separator_and_timezone() {
    let (output, _) = run_with(
        &[
            "query",
            "up",
            "--format",
            "table",
            "--separator",
            ";",
            "--timezone",
            "Europe/Berlin",
        ],
        json_fixture("query.json"),
    )
    .await;
    assert_eq!(output.unwrap(), "__timestamp__;__value__\n2017-07-03T09:26:23.997+02:00;0\n");
}

#[tokio::test]
async fn test_query_range_json() {
    let (output, requests) = run_with(
        &[
            "query",
            KEYSTONE_QUERY,
            "--start",
            "2017-07-13T20:10:30.781Z",
            "--end",
            "2017-07-13T20:15:00.781Z",
            "--step",
            "300s",
            "--timeout",
            "90s",
        ],
        json_fixture("query_range_values.json"),
    )
    .await;

    assert_eq!(output.unwrap().as_bytes(), fixture("query_range_values.json").as_slice());
    assert_eq!(
        requests,
        vec![QueryRequest::Range {
            query: KEYSTONE_QUERY.to_string(),
            start: "2017-07-13T20:10:30.781Z".to_string(),
            end: "2017-07-13T20:15:00.781Z".to_string(),
            step: Duration::from_secs(300),
            timeout: Some(Duration::from_secs(90)),
        }]
    );
}

/// Range results pivot into one column per step-aligned timestamp
#[tokio::test]
async fn test_query_range_values_table() {
    let (output, _) = run_with(
        &[
            "query",
            KEYSTONE_QUERY,
            "--start",
            "2017-07-13T20:10:30.000Z",
            "--end",
            "2017-07-13T20:15:00.000Z",
            "--step",
            "300s",
            "--format",
            "tablE",
        ],
        json_fixture("query_range_values.json"),
    )
    .await;
    assert_eq!(output.unwrap(), "2017-07-13T20:10:00Z 2017-07-13T20:15:00Z\n0 1\n");
}

#[tokio::test]
async fn test_query_range_series_table() {
    let (output, _) = run_with(
        &[
            "query",
            "blackbox_api_status_gauge{check=~\"keystone\"}",
            "--start",
            "2017-07-22T20:10:00.000Z",
            "--end",
            "2017-07-22T20:20:00.000Z",
            "--step",
            "300s",
            "--format",
            "tablE",
            "--columns",
            "region,check,instance",
        ],
        json_fixture("query_range_series.json"),
    )
    .await;
    assert_eq!(
        output.unwrap(),
        "region check instance 2017-07-22T20:10:00Z 2017-07-22T20:15:00Z 2017-07-22T20:20:00Z\n\
         staging keystone 100.64.0.102:9102 0 1 0\n"
    );
}

/// Without --step the step is sized from the range, and matrix columns are
/// aligned to it
#[tokio::test]
async fn test_query_range_auto_step() {
    let (output, requests) = run_with(
        &[
            "query",
            KEYSTONE_QUERY,
            "--start",
            "2017-07-13T20:10:30.781Z",
            "--end",
            "2017-07-13T20:15:00.781Z",
            "--format",
            "table",
        ],
        json_fixture("query_range_values.json"),
    )
    .await;

    assert_eq!(requests[0].step(), Some(Duration::from_secs(30)));
    assert_eq!(output.unwrap(), "2017-07-13T20:10:30Z 2017-07-13T20:15:30Z\n0 1\n");
}

#[tokio::test]
async fn test_query_with_only_start_is_range() {
    let (_, requests) = run_with(
        &["query", "up", "--start", "2017-07-13T22:00:00Z"],
        json_fixture("query_range_values.json"),
    )
    .await;
    match &requests[0] {
        QueryRequest::Range { start, end, step, .. } => {
            assert_eq!(start, "2017-07-13T22:00:00Z");
            assert_eq!(end, "2017-07-13T23:00:00Z");
            assert_eq!(*step, Duration::from_secs(10 * 60));
        }
        other => panic!("expected a range query, got {:?}", other),
    }
}

#[tokio::test]
async fn test_query_requires_expression() {
    let (output, requests) = run_with(&["query"], json_fixture("query.json")).await;
    assert_eq!(output.unwrap_err().to_string(), "missing argument: PromQL Query");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_query_rejects_bad_timestamp() {
    let (output, requests) = run_with(
        &["query", "up", "--end", "tomorrow at noon"],
        json_fixture("query.json"),
    )
    .await;
    let err = output.unwrap_err();
    assert!(matches!(maia_error(&err), MaiaError::Configuration(_)));
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_query_template() {
    let (output, _) = run_with(
        &[
            "query",
            "up",
            "--format",
            "template",
            "--template",
            "{{data.resultType}}{{#each data.result}} {{value.[1]}}{{/each}}",
        ],
        json_fixture("query.json"),
    )
    .await;
    assert_eq!(output.unwrap(), "vector 0");
}

#[tokio::test]
async fn test_query_template_requires_template() {
    let (output, _) = run_with(&["query", "up", "--format", "template"], json_fixture("query.json")).await;
    assert_eq!(output.unwrap_err().to_string(), "missing --template parameter");
}

#[tokio::test]
async fn test_unexpected_content_type() {
    let mut response = json_fixture("query.json");
    response.content_type = Some("text/html".to_string());
    let (output, _) = run_with(&["query", "up"], response).await;
    let err = output.unwrap_err();
    assert!(matches!(maia_error(&err), MaiaError::UnexpectedContentType(_)));
}

#[tokio::test]
async fn test_global_backend_unavailable() {
    let (output, _) = run_with(
        &["metric-names", "--global"],
        status_response(503, "global keystone not configured"),
    )
    .await;
    assert_eq!(
        output.unwrap_err().to_string(),
        "global keystone backend unavailable: global keystone not configured"
    );

    let (output, _) = run_with(&["metric-names", "--global"], status_response(503, "")).await;
    assert_eq!(
        output.unwrap_err().to_string(),
        "global keystone backend unavailable (HTTP 503)"
    );
}

#[tokio::test]
async fn test_regional_backend_unavailable() {
    let (output, _) = run_with(&["metric-names"], status_response(503, "service unavailable")).await;
    assert_eq!(
        output.unwrap_err().to_string(),
        "server failed with status: 503 Service Unavailable (503)"
    );

    let (output, _) = run_with(&["metric-names"], status_response(503, "")).await;
    assert_eq!(output.unwrap_err().to_string(), "service unavailable (HTTP 503)");
}

#[tokio::test]
async fn test_server_error() {
    let (output, _) = run_with(&["metric-names", "--global"], status_response(500, "internal error")).await;
    let err = output.unwrap_err();
    assert_eq!(err.to_string(), "server failed with status: 500 Internal Server Error (500)");
    assert!(matches!(maia_error(&err), MaiaError::ServerStatus { code: 500, .. }));
}

/// A body that cannot be read fails the command even after a 200
#[tokio::test]
async fn test_unreadable_body_fails() {
    for (args, content_type) in [
        (vec!["snapshot"], "text/plain"),
        (vec!["query", "up"], "application/json"),
    ] {
        let response = BackendResponse {
            status: StatusCode::OK,
            content_type: Some(content_type.to_string()),
            body: Err("connection reset by peer".to_string()),
        };
        let (output, requests) = run_with(&args, response).await;
        let err = output.unwrap_err();
        assert!(matches!(maia_error(&err), MaiaError::Transport(_)));
        assert_eq!(requests.len(), 1);
    }
}

#[tokio::test]
async fn test_query_rejects_sub_second_step() {
    let (output, requests) = run_with(
        &["query", "up", "--start", "2017-07-13T22:00:00Z", "--step", "500ms"],
        json_fixture("query_range_values.json"),
    )
    .await;
    let err = output.unwrap_err();
    assert!(matches!(maia_error(&err), MaiaError::Configuration(_)));
    assert!(requests.is_empty());
}
