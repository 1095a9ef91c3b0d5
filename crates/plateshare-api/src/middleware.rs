use axum::{
    Json,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use plateshare_types::api::{AdminSession, AjaxResponse};
use plateshare_types::models::{AccountStatus, Role};

use crate::auth::{AppState, SESSION_COOKIE};

/// Session gate for every admin page and action. Resolves the session cookie
/// to an active admin account and stores the identity as a request extension.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_admin(&state, &jar).await {
        Some(admin) => {
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        None => deny(req.method()),
    }
}

async fn resolve_admin(state: &AppState, jar: &CookieJar) -> Option<AdminSession> {
    let session_id = jar.get(SESSION_COOKIE)?.value().to_string();

    let db = state.clone();
    let user = match tokio::task::spawn_blocking(move || db.db.get_session_user(&session_id)).await
    {
        Ok(Ok(user)) => user?,
        Ok(Err(e)) => {
            error!("session lookup failed: {:#}", e);
            return None;
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            return None;
        }
    };

    if user.role != Role::Admin.as_str() || user.status != AccountStatus::Active.as_str() {
        return None;
    }

    Some(AdminSession {
        user_id: user.id,
        full_name: user.full_name,
        email: user.email,
    })
}

/// Browser navigations bounce to the login page; AJAX callers get JSON.
fn deny(method: &Method) -> Response {
    if *method == Method::GET {
        Redirect::to("/login").into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(AjaxResponse::err("authentication required")),
        )
            .into_response()
    }
}
