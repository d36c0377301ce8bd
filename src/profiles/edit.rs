use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use validator::Validate;

use crate::{accounts::password, include_res, res::{self, html_escape}, session, AppResult};

use super::Availability;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EditProfileForm {
    #[validate(length(max = 2000, message = "Bio is too long"))]
    bio: String,
    #[validate(length(max = 100, message = "Category is too long"))]
    category: String,
    #[validate(length(max = 500, message = "Too many tags"))]
    tags: String,
    #[validate(length(max = 100))]
    location: String,
    #[validate(length(max = 50))]
    hourly_rate: String,
    availability: Availability,
    #[validate(length(max = 200))]
    security_question: String,
    #[serde(default)]
    security_answer: String,
}

/// New values for the editable part of a profile.
#[derive(Debug, Clone)]
pub struct ProfileUpdate<'a> {
    pub bio: &'a str,
    pub category: &'a str,
    pub tags: &'a str,
    pub location: &'a str,
    pub hourly_rate: &'a str,
    pub availability: Availability,
    pub security_question: &'a str,
    pub security_answer: &'a str,
}

/// Saves a profile. Blank category and tags become NULL so the matcher skips
/// them; a blank security answer keeps the stored hash.
pub async fn update_profile(db_pool: &SqlitePool, user_id: &str, update: &ProfileUpdate<'_>) -> AppResult<()> {
    let blank_to_null = |s: &str| Some(s.trim().to_owned()).filter(|s| !s.is_empty());
    sqlx::query("UPDATE profiles SET bio=?,category=?,tags=?,location=?,hourly_rate=?,availability=?,security_question=? WHERE user_id=?")
        .bind(update.bio.trim())
        .bind(blank_to_null(update.category))
        .bind(blank_to_null(update.tags))
        .bind(update.location.trim())
        .bind(update.hourly_rate.trim())
        .bind(update.availability.as_str())
        .bind(update.security_question.trim())
        .bind(user_id)
        .execute(db_pool)
        .await?;

    if !update.security_answer.trim().is_empty() {
        sqlx::query("UPDATE profiles SET security_answer_hash=? WHERE user_id=?")
            .bind(password::hash_answer(update.security_answer)?)
            .bind(user_id)
            .execute(db_pool)
            .await?;
    }

    info!(%user_id, "profile updated");
    Ok(())
}

#[debug_handler]
pub(crate) async fn edit_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/p/edit"));
    };
    let Some(profile) = super::load(&db_pool, &user_id).await? else {
        return res::sorry("profile");
    };

    let mut availability_options = String::new();
    for option in [Availability::Available, Availability::Busy, Availability::Unavailable] {
        let value = option.as_str();
        let selected = if value == profile.availability { " selected" } else { "" };
        availability_options += &format!("<option value=\"{value}\"{selected}>{value}</option>");
    }

    Ok(res::page(
        "Edit profile",
        &include_res!(str, "/pages/profiles/edit.html")
            .replace("{bio}", &html_escape(&profile.bio))
            .replace("{category}", &html_escape(profile.category.as_deref().unwrap_or("")))
            .replace("{tags}", &html_escape(profile.tags.as_deref().unwrap_or("")))
            .replace("{location}", &html_escape(&profile.location))
            .replace("{hourly_rate}", &html_escape(&profile.hourly_rate))
            .replace("{availability_options}", &availability_options)
            .replace("{security_question}", &html_escape(&profile.security_question)),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<EditProfileForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/p/edit"));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let update = ProfileUpdate {
        bio: &form.bio,
        category: &form.category,
        tags: &form.tags,
        location: &form.location,
        hourly_rate: &form.hourly_rate,
        availability: form.availability,
        security_question: &form.security_question,
        security_answer: &form.security_answer,
    };
    update_profile(&db_pool, &user_id, &update).await?;

    Ok(Redirect::to(&format!("/p/{user_id}")).into_response())
}
