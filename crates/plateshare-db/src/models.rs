//! Database row types mapping directly to SQLite rows.
//! Distinct from plateshare-types API models to keep the DB layer independent.

pub struct UserAccountRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub profile_image: Option<String>,
    pub id_document: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
}

/// Pending donation joined with its owner, as shown on the moderation page
/// and used to address the notification email.
pub struct DonationWithOwnerRow {
    pub id: String,
    pub title: String,
    pub quantity: String,
    pub images: String,
    pub expires_at: Option<String>,
    pub status: String,
    pub created_at: String,
    pub owner_name: String,
    pub owner_email: String,
}

pub struct ChallengeRow {
    pub id: String,
    pub title: String,
    pub target_value: i64,
    pub created_at: String,
}

pub struct ChallengeSummaryRow {
    pub id: String,
    pub title: String,
    pub target_value: i64,
    pub participant_count: i64,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub progress: i64,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub joined_at: String,
}
