use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
};
use rand::distr::{Alphanumeric, SampleString};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use plateshare_api::auth::{self, AppState, AppStateInner};
use plateshare_api::middleware::require_admin;
use plateshare_api::{accounts, challenges, donations, profile};
use plateshare_db::Database;
use plateshare_mail::{MailConfig, Mailer};
use plateshare_types::models::{AccountStatus, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "plateshare_server=debug,plateshare_api=debug,plateshare_db=debug,plateshare_mail=debug,tower_http=debug"
                        .into()
                }),
        )
        .init();

    // Config
    let db_path = std::env::var("PLATESHARE_DB_PATH").unwrap_or_else(|_| "plateshare.db".into());
    let host = std::env::var("PLATESHARE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PLATESHARE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let upload_dir =
        PathBuf::from(std::env::var("PLATESHARE_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

    // Init database
    let db = Database::open(&PathBuf::from(&db_path))?;
    seed_admin_if_missing(&db)?;

    // Outbound mail is optional: without SMTP config every notification fails
    // softly and moderation still works.
    let mailer = match mail_config_from_env()? {
        Some(config) => Mailer::new(&config)?,
        None => {
            warn!("PLATESHARE_SMTP_HOST not set; notification emails will be skipped");
            Mailer::disabled()
        }
    };

    tokio::fs::create_dir_all(&upload_dir).await?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        mailer,
        upload_dir: upload_dir.clone(),
    });

    // Routes
    let public_routes = Router::new()
        .route("/login", get(auth::login_page))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/", get(index))
        .route("/donations", get(donations::donations_page))
        .route("/donations/action", post(donations::donation_action))
        .route("/accounts", get(accounts::accounts_page))
        .route("/accounts/ajax", post(accounts::user_action))
        .route(
            "/profile",
            get(profile::profile_page)
                .post(profile::profile_action)
                // axum's 2 MB default body limit would reject valid pictures
                // before the handler's own 5 MB cap could run.
                .layer(DefaultBodyLimit::max(profile::MAX_UPLOAD_BODY_SIZE)),
        )
        .route("/challenges", get(challenges::challenges_page))
        .route(
            "/challenges/{challenge_id}/participants",
            get(challenges::participants_page),
        )
        .route("/auth/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Plateshare admin panel listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Redirect {
    Redirect::to("/donations")
}

fn mail_config_from_env() -> anyhow::Result<Option<MailConfig>> {
    let Ok(smtp_host) = std::env::var("PLATESHARE_SMTP_HOST") else {
        return Ok(None);
    };

    Ok(Some(MailConfig {
        host: smtp_host,
        port: std::env::var("PLATESHARE_SMTP_PORT")
            .unwrap_or_else(|_| "587".into())
            .parse()?,
        username: std::env::var("PLATESHARE_SMTP_USERNAME").unwrap_or_default(),
        password: std::env::var("PLATESHARE_SMTP_PASSWORD").unwrap_or_default(),
        from_name: std::env::var("PLATESHARE_SMTP_FROM_NAME")
            .unwrap_or_else(|_| "Plateshare".into()),
        from_address: std::env::var("PLATESHARE_SMTP_FROM")
            .unwrap_or_else(|_| "no-reply@plateshare.local".into()),
    }))
}

/// First startup: without an admin account nobody can pass the session gate,
/// so create one and print its generated password to the console once.
fn seed_admin_if_missing(db: &Database) -> anyhow::Result<()> {
    if db.count_admins()? > 0 {
        return Ok(());
    }

    let email =
        std::env::var("PLATESHARE_ADMIN_EMAIL").unwrap_or_else(|_| "admin@plateshare.local".into());
    let password = Alphanumeric.sample_string(&mut rand::rng(), 20);
    let hash = auth::hash_password(&password)?;
    let id = Uuid::new_v4().to_string();

    db.create_user(
        &id,
        "Administrator",
        &email,
        &hash,
        Role::Admin.as_str(),
        AccountStatus::Active.as_str(),
    )?;

    // Sensitive one-shot credentials, printed directly instead of logged.
    println!("=====================================");
    println!("           FIRST STARTUP             ");
    println!("=====================================");
    println!("Admin account created:");
    println!("  email:    {email}");
    println!("  password: {password}");
    println!("=====================================");

    Ok(())
}
