use axum::{Extension, Form, Json, extract::State, http::StatusCode, response::Html};
use tracing::warn;

use plateshare_types::api::{AdminSession, AjaxResponse, UserActionForm};
use plateshare_types::models::AccountStatus;

use crate::auth::{AppState, db_err, join_err};
use crate::donations::{append_mail_warning, trimmed_reason};
use crate::views::{self, AccountItem, AccountsPage};

const NOT_PENDING: &str = "user not found or already processed";

pub async fn accounts_page(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
) -> Result<Html<String>, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_pending_users())
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let accounts = rows
        .into_iter()
        .map(|row| AccountItem {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            id_document: row.id_document.unwrap_or_default(),
            submitted: row.created_at,
        })
        .collect();

    views::render(&AccountsPage {
        admin_name: admin.full_name,
        accounts,
    })
}

/// POST /accounts/ajax — approve_user_ajax / reject_user_ajax. Same workflow
/// as donation moderation, over user_accounts.
pub async fn user_action(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Form(form): Form<UserActionForm>,
) -> Result<Json<AjaxResponse>, StatusCode> {
    let db = state.clone();
    let id = form.user_id.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let Some(user) = user else {
        return Ok(Json(AjaxResponse::err(NOT_PENDING)));
    };
    if user.status != AccountStatus::Pending.as_str() {
        return Ok(Json(AjaxResponse::err(NOT_PENDING)));
    }

    match form.action.as_str() {
        "approve_user_ajax" => {
            let db = state.clone();
            let id = form.user_id.clone();
            let approver = admin.user_id.clone();
            let transitioned =
                tokio::task::spawn_blocking(move || db.db.approve_user(&id, &approver))
                    .await
                    .map_err(join_err)?
                    .map_err(db_err)?;
            if !transitioned {
                return Ok(Json(AjaxResponse::err(NOT_PENDING)));
            }

            let mail_sent = match state
                .mailer
                .notify_account_approved(&user.full_name, &user.email)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!("account approval email failed: {:#}", e);
                    false
                }
            };
            Ok(Json(AjaxResponse::ok(append_mail_warning(
                "User approved.",
                mail_sent,
            ))))
        }
        "reject_user_ajax" => {
            let Some(reason) = trimmed_reason(&form.reason) else {
                return Ok(Json(AjaxResponse::err("a rejection reason is required")));
            };

            let db = state.clone();
            let id = form.user_id.clone();
            let reason_clone = reason.clone();
            let transitioned =
                tokio::task::spawn_blocking(move || db.db.reject_user(&id, &reason_clone))
                    .await
                    .map_err(join_err)?
                    .map_err(db_err)?;
            if !transitioned {
                return Ok(Json(AjaxResponse::err(NOT_PENDING)));
            }

            let mail_sent = match state
                .mailer
                .notify_account_rejected(&user.full_name, &user.email, &reason)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!("account rejection email failed: {:#}", e);
                    false
                }
            };
            Ok(Json(AjaxResponse::ok(append_mail_warning(
                "User registration rejected.",
                mail_sent,
            ))))
        }
        _ => Ok(Json(AjaxResponse::err("unknown action"))),
    }
}
