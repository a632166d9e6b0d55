use std::sync::Arc;

use carpool_api::config::ApiConfig;
use carpool_core::collaborators::Collaborators;
use carpool_db::{PgDirectory, PgSlotStore, create_pool, schema::initialize_database};
use carpool_engine::SlotEngine;
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Wire the engine to PostgreSQL
    let settings = config.engine_settings();
    let store = PgSlotStore::new(db_pool.clone(), settings.transaction_timeout);
    let collaborators = Collaborators::from_shared(Arc::new(PgDirectory::new(db_pool)));
    let engine = SlotEngine::new(Arc::new(store), collaborators, settings);

    // Start API server
    carpool_api::start_server(config, engine).await?;

    Ok(())
}
