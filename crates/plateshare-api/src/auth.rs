use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::error;
use uuid::Uuid;

use plateshare_db::Database;
use plateshare_mail::Mailer;
use plateshare_types::api::LoginForm;
use plateshare_types::models::{AccountStatus, Role};

use crate::views::{self, LoginPage};

pub const SESSION_COOKIE: &str = "plateshare_session";
const SESSION_TTL_DAYS: i64 = 7;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Mailer,
    pub upload_dir: PathBuf,
}

/// Argon2id PHC hash. Also used by the server binary when seeding the first
/// admin account.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn login_page() -> Result<Html<String>, StatusCode> {
    views::render(&LoginPage {
        error: String::new(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let db = state.clone();
    let email = form.email.trim().to_string();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let Some(user) = user else {
        return denied("Invalid email or password.");
    };
    if !verify_password(&user.password, &form.password) {
        return denied("Invalid email or password.");
    }
    if user.role != Role::Admin.as_str() || user.status != AccountStatus::Active.as_str() {
        return denied("This account does not have administrator access.");
    }

    let session_id = Uuid::new_v4().to_string();
    let db = state.clone();
    let sid = session_id.clone();
    let uid = user.id.clone();
    tokio::task::spawn_blocking(move || db.db.create_session(&sid, &uid, SESSION_TTL_DAYS))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to("/donations")).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let sid = cookie.value().to_string();
        let db = state.clone();
        tokio::task::spawn_blocking(move || db.db.delete_session(&sid))
            .await
            .map_err(join_err)?
            .map_err(db_err)?;
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, Redirect::to("/login")).into_response())
}

/// Re-render the login page with an inline alert.
fn denied(message: &str) -> Result<Response, StatusCode> {
    views::render(&LoginPage {
        error: message.to_string(),
    })
    .map(IntoResponse::into_response)
}

pub(crate) fn join_err(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub(crate) fn db_err(e: anyhow::Error) -> StatusCode {
    error!("database error: {:#}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
