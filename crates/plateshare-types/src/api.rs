use serde::{Deserialize, Serialize};

// -- Session --

/// Identity of the authenticated administrator, resolved from the session
/// cookie by the auth middleware. Canonical definition lives here so both the
/// middleware and the page handlers share one type.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// -- Moderation actions --

#[derive(Debug, Deserialize)]
pub struct DonationActionForm {
    pub action: String,
    pub donation_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct UserActionForm {
    pub action: String,
    pub user_id: String,
    #[serde(default)]
    pub reason: String,
}

// -- AJAX responses --

/// Wire shape for every AJAX action: `{success, message}` on the happy path,
/// `{success: false, error}` otherwise.
#[derive(Debug, Serialize)]
pub struct AjaxResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AjaxResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
