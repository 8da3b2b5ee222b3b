use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dormant_catalog::CatalogCache;
use dormant_core::config::DormantConfig;
use dormant_core::types::UserId;
use dormant_store::{CatalogImport, CourseStore, ScheduleStore};
use dormant_users::{session_ttl, SessionManager, User, UserDirectory};
use rusqlite::Connection;
use tracing::{info, warn};

mod app;
mod http;

#[derive(Parser)]
#[command(name = "dormant-gateway")]
#[command(about = "Course schedule builder: HTTP API and catalog tools")]
struct Cli {
    /// Config file (default: ~/.dormant/dormant.toml)
    #[arg(long, env = "DORMANT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,

    /// Load a catalog JSON document `{"courses": [...], "sections": [...]}`.
    Import {
        path: PathBuf,
    },

    /// Create (or update) a user and print a fresh session token.
    IssueSession {
        /// Identity-provider user id; generated when omitted.
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dormant_gateway=info,dormant_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config / DORMANT_CONFIG > ~/.dormant/dormant.toml
    let config = DormantConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        DormantConfig::default()
    });

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    // run all schema migrations (idempotent)
    let db = open_db(&db_path)?;
    dormant_store::init_db(&db)?;
    dormant_users::db::init_db(&db)?;
    drop(db);
    info!("database migrations complete");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Import { path } => import(&db_path, &path),
        Command::IssueSession {
            user_id,
            name,
            email,
        } => issue_session(&config, user_id, name, email),
    }
}

async fn serve(config: DormantConfig) -> anyhow::Result<()> {
    let db_path = config.database.path.clone();

    // build subsystems; each gets its own connection for thread safety
    let courses = CourseStore::new(open_db(&db_path)?);
    let schedules = ScheduleStore::new(open_db(&db_path)?);
    let users = UserDirectory::new(open_db(&db_path)?);
    let sessions = SessionManager::new(open_db(&db_path)?);
    sessions.purge_expired()?;

    // the catalog must be in memory before the first search request
    let catalog = CatalogCache::new();
    let loaded = courses.list_courses().context("loading course catalog")?;
    if loaded.is_empty() {
        warn!("course catalog is empty; run `dormant-gateway import <file>` first");
    }
    catalog.replace(loaded);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(
        config, catalog, courses, schedules, users, sessions,
    ));
    let router = app::build_router(state);

    info!("Dormant gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("gateway stopped");
    Ok(())
}

fn import(db_path: &str, path: &PathBuf) -> anyhow::Result<()> {
    let doc = CatalogImport::from_path(path)
        .with_context(|| format!("reading catalog from {}", path.display()))?;
    let courses = CourseStore::new(open_db(db_path)?);
    let summary = courses.import(&doc)?;
    info!(
        courses = summary.courses,
        sections = summary.sections,
        "catalog imported"
    );
    println!(
        "imported {} courses, {} sections",
        summary.courses, summary.sections
    );
    Ok(())
}

fn issue_session(
    config: &DormantConfig,
    user_id: Option<String>,
    name: String,
    email: String,
) -> anyhow::Result<()> {
    let db_path = &config.database.path;
    let user_id = user_id.map(UserId::from).unwrap_or_default();

    let users = UserDirectory::new(open_db(db_path)?);
    let mut user = User::new(user_id.as_str()).with_name(name).with_email(email);
    if let Some(existing) = users.find_user(user_id.as_str())? {
        // keep profile fields that were not given on the command line
        if user.name.is_empty() {
            user.name = existing.name;
        }
        if user.email.is_empty() {
            user.email = existing.email;
        }
        user.avatar_url = existing.avatar_url;
    }
    users.upsert_user(&user)?;

    let sessions = SessionManager::new(open_db(db_path)?);
    let ttl = session_ttl(config.sessions.ttl_hours)?;
    let issued = sessions.issue(&user_id, ttl)?;

    println!("user_id:    {}", issued.user_id);
    println!("token:      {}", issued.token);
    println!("expires_at: {}", issued.expires_at.to_rfc3339());
    Ok(())
}

/// Open a connection with the pragmas every subsystem expects.
fn open_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("opening database {path}"))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
