//! Lexsite server binary.
//!
//! `lexsite serve` runs the website, `lexsite migrate` applies schema
//! migrations, and `lexsite create-user` adds an account from the shell.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lexsite_kernel::config::Config;
use lexsite_kernel::models::{CreateUser, User};
use lexsite_kernel::state::AppState;
use lexsite_kernel::{db, routes, session};

/// Bilingual law firm website and content API.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Apply pending database migrations and exit.
    Migrate,

    /// Create a user account.
    CreateUser {
        /// Login name.
        #[arg(long)]
        name: String,

        /// Email address.
        #[arg(long)]
        mail: String,

        /// Password (at least 8 characters).
        #[arg(long)]
        password: String,

        /// Grant access to user management.
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
        Command::CreateUser {
            name,
            mail,
            password,
            admin,
        } => {
            let input = CreateUser {
                name,
                password,
                mail,
                is_admin: admin,
            };
            create_user(&config, input).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Lexsite");
    info!(port = config.port, "Configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!("Database and Redis connections established");

    let session_layer = session::create_session_layer(
        &config.redis_url,
        session::parse_same_site(&config.cookie_same_site),
        config.cookie_secure,
    )
    .await
    .context("failed to create session layer")?;

    let cors = build_cors_layer(&config);
    let app = routes::app(state, session_layer, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, default_language = %config.default_language, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;
    info!("Migrations applied");
    Ok(())
}

async fn create_user(config: &Config, input: CreateUser) -> Result<()> {
    let errors = input.validate();
    if !errors.is_empty() {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        bail!("invalid user: {}", messages.join(" "));
    }

    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;

    if User::find_by_name(&pool, input.name.trim()).await?.is_some() {
        bail!("username '{}' is taken", input.name.trim());
    }
    if User::find_by_mail(&pool, input.mail.trim()).await?.is_some() {
        bail!("email '{}' is already registered", input.mail.trim());
    }

    let user = User::create(&pool, input).await?;
    info!(user_id = %user.id, name = %user.name, is_admin = user.is_admin, "user created");
    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_credentials(true)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
