//! Turns backend status codes into errors

use log::debug;
use reqwest::StatusCode;

use super::client::BackendResponse;
use crate::error::{MaiaError, Result};

/// Accept `200 OK` with a readable body, classify everything else.
///
/// A 503 from the global backend carries its body in the message. Without the
/// global flag only an empty (or unreadable) 503 body gets the dedicated
/// message; a 503 with content is reported like any other failed status.
pub fn check_response(response: &BackendResponse, global: bool) -> Result<()> {
    let status = response.status;
    if status == StatusCode::OK {
        return match &response.body {
            Ok(_) => Ok(()),
            Err(read_error) => Err(MaiaError::Transport(format!(
                "failed to read response body: {}",
                read_error
            ))),
        };
    }
    debug!("Backend answered with {}", status);

    if status == StatusCode::SERVICE_UNAVAILABLE {
        let prefix = if global {
            "global keystone backend unavailable"
        } else {
            "service unavailable"
        };

        match &response.body {
            Err(read_error) => {
                return Err(MaiaError::BackendUnavailable(format!(
                    "{} (HTTP 503) - failed to read response body: {}",
                    prefix, read_error
                )));
            }
            Ok(body) if body.is_empty() => {
                return Err(MaiaError::BackendUnavailable(format!("{} (HTTP 503)", prefix)));
            }
            Ok(body) if global => {
                return Err(MaiaError::BackendUnavailable(format!(
                    "{}: {}",
                    prefix,
                    String::from_utf8_lossy(body)
                )));
            }
            Ok(_) => {}
        }
    }

    Err(MaiaError::ServerStatus {
        status: status.to_string(),
        code: status.as_u16(),
    })
}
