use axum::{Extension, Form, Json, extract::State, http::StatusCode, response::Html};
use tracing::warn;

use plateshare_db::models::DonationWithOwnerRow;
use plateshare_types::api::{AdminSession, AjaxResponse, DonationActionForm};
use plateshare_types::models::DonationStatus;

use crate::auth::{AppState, db_err, join_err};
use crate::views::{self, DonationItem, DonationsPage};

const NOT_PENDING: &str = "donation not found or already processed";

pub async fn donations_page(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
) -> Result<Html<String>, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_pending_donations())
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let donations = rows.into_iter().map(donation_item).collect();
    views::render(&DonationsPage {
        admin_name: admin.full_name,
        donations,
    })
}

fn donation_item(row: DonationWithOwnerRow) -> DonationItem {
    DonationItem {
        id: row.id,
        title: row.title,
        donor: row.owner_name,
        quantity: row.quantity,
        expires_at: row.expires_at.unwrap_or_else(|| "n/a".to_string()),
        // `images` is a JSON-serialized list of file names.
        image_count: serde_json::from_str::<Vec<String>>(&row.images)
            .map(|v| v.len())
            .unwrap_or(0),
        submitted: row.created_at,
    }
}

/// POST /donations/action — the approve/reject AJAX handler. Applies exactly
/// one pending -> terminal transition, then sends the owner a best-effort
/// notification email.
pub async fn donation_action(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Form(form): Form<DonationActionForm>,
) -> Result<Json<AjaxResponse>, StatusCode> {
    let db = state.clone();
    let id = form.donation_id.clone();
    let donation = tokio::task::spawn_blocking(move || db.db.get_donation_with_owner(&id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let Some(donation) = donation else {
        return Ok(Json(AjaxResponse::err(NOT_PENDING)));
    };
    if donation.status != DonationStatus::Pending.as_str() {
        return Ok(Json(AjaxResponse::err(NOT_PENDING)));
    }

    match form.action.as_str() {
        "approve" => {
            let db = state.clone();
            let id = form.donation_id.clone();
            let approver = admin.user_id.clone();
            let transitioned =
                tokio::task::spawn_blocking(move || db.db.approve_donation(&id, &approver))
                    .await
                    .map_err(join_err)?
                    .map_err(db_err)?;
            if !transitioned {
                // Lost a race against another admin.
                return Ok(Json(AjaxResponse::err(NOT_PENDING)));
            }

            let mail_sent = match state
                .mailer
                .notify_donation_approved(&donation.owner_name, &donation.owner_email, &donation.title)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!("donation approval email failed: {:#}", e);
                    false
                }
            };
            Ok(Json(AjaxResponse::ok(append_mail_warning(
                "Donation approved.",
                mail_sent,
            ))))
        }
        "reject" => {
            let Some(reason) = trimmed_reason(&form.reason) else {
                return Ok(Json(AjaxResponse::err("a rejection reason is required")));
            };

            let db = state.clone();
            let id = form.donation_id.clone();
            let reason_clone = reason.clone();
            let transitioned =
                tokio::task::spawn_blocking(move || db.db.reject_donation(&id, &reason_clone))
                    .await
                    .map_err(join_err)?
                    .map_err(db_err)?;
            if !transitioned {
                return Ok(Json(AjaxResponse::err(NOT_PENDING)));
            }

            let mail_sent = match state
                .mailer
                .notify_donation_rejected(
                    &donation.owner_name,
                    &donation.owner_email,
                    &donation.title,
                    &reason,
                )
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!("donation rejection email failed: {:#}", e);
                    false
                }
            };
            Ok(Json(AjaxResponse::ok(append_mail_warning(
                "Donation rejected.",
                mail_sent,
            ))))
        }
        _ => Ok(Json(AjaxResponse::err("unknown action"))),
    }
}

/// A rejection must carry a non-empty reason.
pub(crate) fn trimmed_reason(reason: &str) -> Option<String> {
    let reason = reason.trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

/// The notification is fire-and-forget: a failed send never fails the action,
/// it only annotates the success message.
pub(crate) fn append_mail_warning(base: &str, mail_sent: bool) -> String {
    if mail_sent {
        base.to_string()
    } else {
        format!("{base} (the email notification could not be sent)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reasons_are_refused() {
        assert_eq!(trimmed_reason("  "), None);
        assert_eq!(trimmed_reason(""), None);
        assert_eq!(
            trimmed_reason("  expired food  ").as_deref(),
            Some("expired food")
        );
    }

    #[test]
    fn mail_failure_becomes_a_soft_warning() {
        assert_eq!(append_mail_warning("Donation approved.", true), "Donation approved.");
        assert_eq!(
            append_mail_warning("Donation approved.", false),
            "Donation approved. (the email notification could not be sent)"
        );
    }

    #[test]
    fn status_guards_match_the_stored_defaults() {
        use plateshare_types::models::{AccountStatus, Role};

        let db = plateshare_db::Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_accounts (id, full_name, email, password)
                 VALUES ('u1', 'Maya', 'maya@example.com', '$argon2id$fake')",
                [],
            )?;
            conn.execute(
                "INSERT INTO food_donations (id, user_id, title, quantity)
                 VALUES ('d1', 'u1', 'Rice', '2 kg')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        // The handlers compare row statuses against the typed constants, so
        // the constants must equal what the schema writes by default.
        let user = db.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(user.status, AccountStatus::Pending.as_str());
        assert_eq!(user.role, Role::Member.as_str());

        let donation = db.get_donation_with_owner("d1").unwrap().unwrap();
        assert_eq!(donation.status, DonationStatus::Pending.as_str());
    }

    #[test]
    fn image_count_survives_malformed_json() {
        let row = DonationWithOwnerRow {
            id: "d1".into(),
            title: "Rice".into(),
            quantity: "2 kg".into(),
            images: "not json".into(),
            expires_at: None,
            status: "pending".into(),
            created_at: "2026-01-01 10:00:00".into(),
            owner_name: "Maya".into(),
            owner_email: "maya@example.com".into(),
        };
        let item = donation_item(row);
        assert_eq!(item.image_count, 0);
        assert_eq!(item.expires_at, "n/a");
    }
}
