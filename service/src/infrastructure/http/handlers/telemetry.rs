use axum::Json;
use axum::http::StatusCode;
use serde::Deserialize;

/// Error caught by the admin UI's global handlers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientErrorReport {
    pub message: String,
    pub source: Option<String>,
    pub stack: Option<String>,
    pub url: Option<String>,
}

/// Last-resort sink: logged only, never surfaced to the admin
pub async fn report_client_error(Json(report): Json<ClientErrorReport>) -> StatusCode {
    tracing::warn!(
        source = report.source.as_deref().unwrap_or("unknown"),
        url = report.url.as_deref().unwrap_or_default(),
        stack = report.stack.as_deref().unwrap_or_default(),
        "client error: {}",
        report.message
    );
    StatusCode::ACCEPTED
}
