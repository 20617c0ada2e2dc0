use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("conduit=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let config = config::Config::load(&args.config)?;

    ensure_data_dirs(&config);

    let engine = match config.database.engine {
        config::DatabaseEngine::Sqlite => conduit_db::DatabaseEngine::Sqlite,
        config::DatabaseEngine::Postgres => conduit_db::DatabaseEngine::Postgres,
    };
    let db = conduit_db::create_pool_full(
        &config.database.url,
        config.database.max_connections,
        Some(engine),
        Some(conduit_db::PgConnectOptions {
            statement_timeout_secs: config.database.statement_timeout_secs,
            idle_in_transaction_timeout_secs: config.database.idle_in_transaction_timeout_secs,
        }),
    )
    .await?;
    conduit_db::run_migrations(&db).await?;

    let state = conduit_core::AppState::new(
        db,
        conduit_core::AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            jwt_expiry_secs: config.auth.jwt_expiry_seconds,
            registration_enabled: config.auth.registration_enabled,
            worker_id: config.server.worker_id,
        },
    );

    let app = conduit_api::build_router()
        .with_state(state.clone())
        .merge(conduit_graphql::routes(state, config.graphql.playground));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;

    print_startup_banner(&config);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the database parent directory before sqlx tries to open the file.
fn ensure_data_dirs(config: &config::Config) {
    if let Some(db_path) = config
        .database
        .url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Could not create directory '{}': {}", parent.display(), e);
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {error}");
        return;
    }
    println!();
    tracing::info!("Shutting down (ctrl-c)...");
}

fn print_startup_banner(config: &config::Config) {
    println!();
    println!("   ____                _       _ _");
    println!("  / ___|___  _ __   __| |_   _(_) |_");
    println!(" | |   / _ \\| '_ \\ / _` | | | | | __|");
    println!(" | |__| (_) | | | | (_| | |_| | | |_");
    println!("  \\____\\___/|_| |_|\\__,_|\\__,_|_|\\__|");
    println!();
    println!("  Listening:    http://{}", config.server.bind_address);
    println!("  Database:     {}", config.database.url);
    println!(
        "  GraphQL:      /graphql{}",
        if config.graphql.playground {
            " (GraphiQL enabled)"
        } else {
            ""
        }
    );
    println!(
        "  Registration: {}",
        if config.auth.registration_enabled {
            "open"
        } else {
            "closed"
        }
    );
    println!();
}
