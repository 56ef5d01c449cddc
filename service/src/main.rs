use role_common::{database, load_schemas};

use crate::domain::AppState;
use crate::domain::repository::ContentRepository;
use crate::domain::workflow::WorkflowSettings;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::persistence::memory::InMemoryContentRepository;
use crate::infrastructure::persistence::postgres::PostgresContentRepository;
use crate::infrastructure::settings::{Settings, StorageBackend};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod domain;
mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let schemas = load_schemas(&settings.schema_config_path)?;
    tracing::info!("content schemas loaded");

    match settings.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, content is lost on restart");
            serve(InMemoryContentRepository::new(), schemas, &settings).await
        }
        StorageBackend::Postgres => {
            let database = database::connect(settings.database()?).await?;
            tracing::info!("connected to database");
            serve(PostgresContentRepository::new(database), schemas, &settings).await
        }
    }
}

async fn serve<R: ContentRepository>(
    repository: R,
    schemas: &'static dyn role_common::EntitySchemas,
    settings: &Settings,
) -> anyhow::Result<()> {
    let workflow_settings = WorkflowSettings {
        max_slug_attempts: settings.slug.max_suggestion_attempts,
    };
    let state = AppStateImpl::new(
        schemas,
        repository,
        workflow_settings,
        settings.autosave.default_delay(),
    )
    .with_session_idle_timeout(settings.editor.idle_timeout());
    state.editors().spawn_eviction(settings.editor.eviction_interval());

    let server_config = HttpServerConfig {
        port: &settings.server_port,
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
