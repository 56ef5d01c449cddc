use anyhow::Context;
use axum::Router;
use axum::routing::{get, patch, post};
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;

use crate::domain::AppState;
use crate::infrastructure::http::handlers::content::{
    archive_content, check_slug, content_checklist, create_content, delete_content,
    find_content_by_id, list_content, publish_content, schedule_content, suggest_slug,
    unpublish_content, update_content,
};
use crate::infrastructure::http::handlers::editor::{
    before_unload, check_session_slug, close_session, leave_session, open_session,
    publish_session, save_session, session_snapshot, suggest_session_slug, update_field,
};
use crate::infrastructure::http::handlers::meta::{entities_metadata, one_entity_metadata};
use crate::infrastructure::http::handlers::telemetry::report_client_error;
use crate::infrastructure::http::handlers::health_check;

mod admin;
mod api;
mod handlers;
mod querystring;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl AppState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        // see: https://github.com/metrics-rs/metrics
        // see: https://github.com/Ptrskay3/axum-prometheus
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = app_router(state)
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self
            .listener
            .local_addr()
            .context("failed to read listener address")?;
        tracing::info!("listening on {}", address);
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

/// Every route except `/metrics`, whose recorder may only be installed once per process.
fn app_router<S: AppState>(state: S) -> Router {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            tracing::info_span!("http_request", method = ?request.method(), uri)
        },
    );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(trace_layer)
        .with_state(state)
}

fn api_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route("/meta/entities", get(entities_metadata::<S>))
        .route("/meta/entities/{entity}", get(one_entity_metadata::<S>))
        .route(
            "/content/{entity}",
            get(list_content::<S>).post(create_content::<S>),
        )
        .route("/content/{entity}/checklist", post(content_checklist::<S>))
        .route("/content/{entity}/slugs/check", get(check_slug::<S>))
        .route("/content/{entity}/slugs/suggest", get(suggest_slug::<S>))
        .route(
            "/content/{entity}/{id}",
            get(find_content_by_id::<S>)
                .put(update_content::<S>)
                .delete(delete_content::<S>),
        )
        .route("/content/{entity}/{id}/publish", post(publish_content::<S>))
        .route("/content/{entity}/{id}/schedule", post(schedule_content::<S>))
        .route("/content/{entity}/{id}/unpublish", post(unpublish_content::<S>))
        .route("/content/{entity}/{id}/archive", post(archive_content::<S>))
        .route("/editor/sessions", post(open_session::<S>))
        .route(
            "/editor/sessions/{sid}",
            get(session_snapshot::<S>).delete(close_session::<S>),
        )
        .route(
            "/editor/sessions/{sid}/fields",
            patch(update_field::<S>),
        )
        .route("/editor/sessions/{sid}/slug/check", post(check_session_slug::<S>))
        .route("/editor/sessions/{sid}/slug/suggest", post(suggest_session_slug::<S>))
        .route("/editor/sessions/{sid}/save", post(save_session::<S>))
        .route("/editor/sessions/{sid}/publish", post(publish_session::<S>))
        .route("/editor/sessions/{sid}/leave", post(leave_session::<S>))
        .route("/editor/sessions/{sid}/unload", get(before_unload::<S>))
        .route("/telemetry/client-errors", post(report_client_error))
}
