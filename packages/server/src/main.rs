use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::storage::filesystem::FilesystemMediaStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use server::{account, build_router, database};

#[derive(Parser)]
#[command(name = "recipe-server", version, about = "Recipe API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for the database, sync the schema and serve the API (default).
    Serve,
    /// Block until the database accepts connections.
    WaitForDb {
        /// Give up after this many attempts instead of waiting forever.
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Create an active staff superuser.
    CreateSuperuser {
        #[arg(long, env = "RECIPE_SUPERUSER_EMAIL")]
        email: String,
        #[arg(long, env = "RECIPE_SUPERUSER_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::WaitForDb { max_attempts } => {
            database::wait_for_db(&config.database, max_attempts).await?;
            Ok(())
        }
        Command::CreateSuperuser {
            email,
            password,
            name,
        } => {
            let db = database::init_db(&config.database)
                .await
                .context("Failed to connect to database")?;
            let user = account::create_superuser(&db, &email, &password, &name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create superuser: {e:?}"))?;
            info!(id = user.id, email = %user.email, "Superuser created");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    database::wait_for_db(&config.database, None).await?;
    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database schema synced");

    let media = FilesystemMediaStore::new(config.media.root.clone(), config.media.max_upload_bytes)
        .await
        .context("Failed to initialize media storage")?;
    info!(root = %media.root().display(), "Media storage ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        media: Arc::new(media),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
