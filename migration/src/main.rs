use role_common::{database, load_schemas};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::migration::Migration;
use crate::infrastructure::persistence::PersistenceAdapter;
use crate::infrastructure::settings::Settings;

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let schemas = load_schemas(&settings.schema_config_path)?;
    tracing::info!("content schemas loaded");

    let database = database::connect(&settings.database).await?;
    tracing::info!("connected to database");
    let persistence = PersistenceAdapter::new(database);

    // create the tables of every configured content kind
    let migration = Migration::new(schemas, persistence);
    let applied = migration.migrate().await?;
    tracing::info!(applied, "content tables migrated");

    Ok(())
}
