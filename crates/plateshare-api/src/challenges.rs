use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};

use plateshare_types::api::AdminSession;

use crate::auth::{AppState, db_err, join_err};
use crate::views::{self, ChallengeItem, ChallengesPage, ParticipantItem, ParticipantsPage};

pub async fn challenges_page(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
) -> Result<Html<String>, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_challenges())
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let challenges = rows
        .into_iter()
        .map(|row| ChallengeItem {
            id: row.id,
            title: row.title,
            target_value: row.target_value,
            participant_count: row.participant_count,
        })
        .collect();

    views::render(&ChallengesPage {
        admin_name: admin.full_name,
        challenges,
    })
}

pub async fn participants_page(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Path(challenge_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let db = state.clone();
    let id = challenge_id.clone();
    let challenge = tokio::task::spawn_blocking(move || db.db.get_challenge(&id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_participants(&challenge_id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    let participants = rows
        .into_iter()
        .map(|row| ParticipantItem {
            full_name: row.full_name,
            email: row.email,
            progress: row.progress,
            completed: row.completed,
            joined: row.joined_at,
        })
        .collect();

    views::render(&ParticipantsPage {
        admin_name: admin.full_name,
        challenge_title: challenge.title,
        target_value: challenge.target_value,
        participants,
    })
}
