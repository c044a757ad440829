//! Macro Util
//!
//! An MCP server for recipe, food journal and macro tracking.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use macro_util::config::Config;
use macro_util::mcp::MacroUtilService;
use macro_util::{build_info, db, lookup};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("macro_util=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database and run migrations
    eprintln!("Initializing database...");
    let database = db::Database::open(&db_path)?;
    let version = database.with_conn(db::migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    let lookup_enabled = config.nutritionix.is_some();
    let lookup: Arc<dyn lookup::FoodLookup> = Arc::from(lookup::from_config(&config));
    eprintln!(
        "Nutritionix lookup: {}",
        if lookup_enabled { "enabled" } else { "disabled" }
    );

    let service = MacroUtilService::new(db_path, database, lookup, lookup_enabled);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
