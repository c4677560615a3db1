/// Auxiliary dashboard panels: test-coverage summary and backend health.
use crate::api::ApiClient;

use super::{FlowError, console_error};

/// Coverage percentage as displayed by the backend, if it reports one.
pub fn coverage_summary(api: &ApiClient) -> Result<Option<String>, FlowError> {
    match api.coverage_report() {
        Ok(report) => Ok(report.percent_display()),
        Err(err) => {
            console_error("Error fetching coverage report", &err);
            Err(FlowError::backend(
                format!("Failed to load coverage report: {}", err.detail_or_message()),
                err,
            ))
        }
    }
}

/// Status string from the backend root endpoint.
pub fn backend_health(api: &ApiClient) -> Result<String, FlowError> {
    api.health().map(|health| health.status).map_err(|err| {
        FlowError::backend(
            format!("Backend unreachable: {}", err.detail_or_message()),
            err,
        )
    })
}
