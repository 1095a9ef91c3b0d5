//! askama page templates. Templates live in `templates/` at the crate root;
//! pages hold plain display-ready strings so the templates stay simple.

use askama::Template;
use axum::{http::StatusCode, response::Html};
use tracing::error;

pub fn render<T: Template>(template: &T) -> Result<Html<String>, StatusCode> {
    template.render().map(Html).map_err(|e| {
        error!("template render failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: String,
}

#[derive(Template)]
#[template(path = "donations.html")]
pub struct DonationsPage {
    pub admin_name: String,
    pub donations: Vec<DonationItem>,
}

pub struct DonationItem {
    pub id: String,
    pub title: String,
    pub donor: String,
    pub quantity: String,
    pub expires_at: String,
    pub image_count: usize,
    pub submitted: String,
}

#[derive(Template)]
#[template(path = "accounts.html")]
pub struct AccountsPage {
    pub admin_name: String,
    pub accounts: Vec<AccountItem>,
}

pub struct AccountItem {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub id_document: String,
    pub submitted: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub admin_name: String,
    pub full_name: String,
    pub email: String,
    pub profile_image: String,
}

#[derive(Template)]
#[template(path = "challenges.html")]
pub struct ChallengesPage {
    pub admin_name: String,
    pub challenges: Vec<ChallengeItem>,
}

pub struct ChallengeItem {
    pub id: String,
    pub title: String,
    pub target_value: i64,
    pub participant_count: i64,
}

#[derive(Template)]
#[template(path = "participants.html")]
pub struct ParticipantsPage {
    pub admin_name: String,
    pub challenge_title: String,
    pub target_value: i64,
    pub participants: Vec<ParticipantItem>,
}

pub struct ParticipantItem {
    pub full_name: String,
    pub email: String,
    pub progress: i64,
    pub completed: bool,
    pub joined: String,
}
