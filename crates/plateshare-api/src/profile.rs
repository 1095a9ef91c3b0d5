use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::Html,
};
use tracing::error;
use uuid::Uuid;

use plateshare_types::api::{AdminSession, AjaxResponse};

use crate::auth::{self, AppState, db_err, join_err};
use crate::views::{self, ProfilePage};

/// 5 MB cap on profile pictures.
pub const MAX_PICTURE_SIZE: usize = 5 * 1024 * 1024;

/// Body limit for the profile endpoint: the picture plus form-field overhead.
/// axum's 2 MB default would otherwise reject uploads before the handler's
/// own size check runs; the server layers this onto the /profile route.
pub const MAX_UPLOAD_BODY_SIZE: usize = MAX_PICTURE_SIZE + 64 * 1024;

/// Extension allow-listing is the only content validation on uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub async fn profile_page(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
) -> Result<Html<String>, StatusCode> {
    let db = state.clone();
    let id = admin.user_id.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?
        .ok_or(StatusCode::NOT_FOUND)?;

    views::render(&ProfilePage {
        admin_name: admin.full_name,
        full_name: user.full_name,
        email: user.email,
        profile_image: user.profile_image.unwrap_or_default(),
    })
}

#[derive(Default)]
struct ProfileForm {
    action: String,
    full_name: String,
    email: String,
    current_password: String,
    new_password: String,
    confirm_password: String,
    picture: Option<(String, Vec<u8>)>,
}

/// POST /profile — one endpoint, three actions, discriminated by the `action`
/// field. The page posts FormData, so everything arrives as multipart and the
/// picture rides along as a file part.
pub async fn profile_action(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    mut multipart: Multipart,
) -> Result<Json<AjaxResponse>, StatusCode> {
    // A body over the route limit surfaces as a multipart read error; report
    // it in the same JSON shape as every other profile failure.
    let form = match read_profile_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            error!("multipart parse error: {}", e);
            return Ok(Json(AjaxResponse::err(
                "the submission could not be read; an upload may exceed the size limit",
            )));
        }
    };

    match form.action.as_str() {
        "update_profile" => update_profile(&state, &admin, &form.full_name, &form.email).await,
        "update_password" => {
            update_password(
                &state,
                &admin,
                &form.current_password,
                &form.new_password,
                &form.confirm_password,
            )
            .await
        }
        "update_picture" => update_picture(&state, &admin, form.picture).await,
        _ => Ok(Json(AjaxResponse::err("unknown action"))),
    }
}

async fn read_profile_form(multipart: &mut Multipart) -> Result<ProfileForm, MultipartError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "picture" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            form.picture = Some((file_name, data.to_vec()));
        } else {
            let value = field.text().await?;
            match name.as_str() {
                "action" => form.action = value,
                "full_name" => form.full_name = value,
                "email" => form.email = value,
                "current_password" => form.current_password = value,
                "new_password" => form.new_password = value,
                "confirm_password" => form.confirm_password = value,
                _ => {}
            }
        }
    }

    Ok(form)
}

async fn update_profile(
    state: &AppState,
    admin: &AdminSession,
    full_name: &str,
    email: &str,
) -> Result<Json<AjaxResponse>, StatusCode> {
    let full_name = full_name.trim().to_string();
    let email = email.trim().to_string();
    if full_name.is_empty() {
        return Ok(Json(AjaxResponse::err("name must not be empty")));
    }
    if !email.contains('@') {
        return Ok(Json(AjaxResponse::err("a valid email address is required")));
    }

    let db = state.clone();
    let id = admin.user_id.clone();
    let updated = tokio::task::spawn_blocking(move || db.db.update_profile(&id, &full_name, &email))
        .await
        .map_err(join_err)?;

    // The unique constraint on email is the common failure here.
    match updated {
        Ok(()) => Ok(Json(AjaxResponse::ok("Profile updated."))),
        Err(e) => {
            error!("profile update failed: {:#}", e);
            Ok(Json(AjaxResponse::err(
                "could not update profile; the email may already be in use",
            )))
        }
    }
}

async fn update_password(
    state: &AppState,
    admin: &AdminSession,
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<Json<AjaxResponse>, StatusCode> {
    if new_password.len() < 8 {
        return Ok(Json(AjaxResponse::err(
            "the new password must be at least 8 characters",
        )));
    }
    if new_password != confirm_password {
        return Ok(Json(AjaxResponse::err("the password confirmation does not match")));
    }

    let db = state.clone();
    let id = admin.user_id.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await
        .map_err(join_err)?
        .map_err(db_err)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !auth::verify_password(&user.password, current_password) {
        return Ok(Json(AjaxResponse::err("the current password is incorrect")));
    }

    let hash = auth::hash_password(new_password).map_err(db_err)?;
    let db = state.clone();
    let id = admin.user_id.clone();
    tokio::task::spawn_blocking(move || db.db.update_password(&id, &hash))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    Ok(Json(AjaxResponse::ok("Password updated.")))
}

async fn update_picture(
    state: &AppState,
    admin: &AdminSession,
    picture: Option<(String, Vec<u8>)>,
) -> Result<Json<AjaxResponse>, StatusCode> {
    let Some((file_name, data)) = picture else {
        return Ok(Json(AjaxResponse::err("no picture was uploaded")));
    };
    let ext = match validate_picture(&file_name, data.len()) {
        Ok(ext) => ext,
        Err(message) => return Ok(Json(AjaxResponse::err(message))),
    };

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(io_err)?;

    // Old pictures stay on disk; nothing in the panel deletes rows or files.
    let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = state.upload_dir.join(&stored_name);
    tokio::fs::write(&path, &data).await.map_err(io_err)?;

    let db = state.clone();
    let id = admin.user_id.clone();
    let name_clone = stored_name.clone();
    tokio::task::spawn_blocking(move || db.db.update_profile_image(&id, &name_clone))
        .await
        .map_err(join_err)?
        .map_err(db_err)?;

    Ok(Json(AjaxResponse::ok("Profile picture updated.")))
}

/// Size and extension checks for an uploaded picture. Returns the normalized
/// extension to store the file under, or the error message for the caller's
/// JSON response.
fn validate_picture(file_name: &str, size: usize) -> Result<String, &'static str> {
    if size == 0 {
        return Err("no picture was uploaded");
    }
    if size > MAX_PICTURE_SIZE {
        return Err("the picture exceeds the 5 MB limit");
    }
    allowed_extension(file_name).ok_or("only jpg, jpeg, png, gif and webp files are accepted")
}

fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn io_err(e: std::io::Error) -> StatusCode {
    error!("upload write failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert_eq!(allowed_extension("me.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("avatar.webp").as_deref(), Some("webp"));
        assert_eq!(allowed_extension("photo.tar.png").as_deref(), Some("png"));
    }

    #[test]
    fn disallowed_extensions_are_refused() {
        assert_eq!(allowed_extension("script.php"), None);
        assert_eq!(allowed_extension("document.pdf"), None);
        assert_eq!(allowed_extension("noextension"), None);
    }

    #[test]
    fn pictures_between_default_and_cap_are_accepted() {
        // 3 MB sits above axum's 2 MB default body limit; the /profile route
        // raises the limit so this size must reach and pass the cap check.
        assert!(MAX_UPLOAD_BODY_SIZE > MAX_PICTURE_SIZE);
        assert_eq!(
            validate_picture("dinner.jpg", 3 * 1024 * 1024).as_deref(),
            Ok("jpg")
        );
    }

    #[test]
    fn oversized_or_empty_pictures_are_refused() {
        assert_eq!(
            validate_picture("dinner.jpg", MAX_PICTURE_SIZE + 1),
            Err("the picture exceeds the 5 MB limit")
        );
        assert_eq!(validate_picture("dinner.jpg", 0), Err("no picture was uploaded"));
        assert!(validate_picture("dinner.php", 1024).is_err());
    }
}
