//! Password reset by security question.
//!
//! Starting a reset stores a random token server-side with an expiry; the
//! client carries it through the question and new-password forms. Nothing
//! about the reset lives in the session.

use std::fmt::Write;

use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

use crate::{config::Config, db, include_res, res::{self, html_escape}, AppResult};

use super::password;

pub struct ResetToken;

impl ResetToken {
    fn generate() -> String {
        let bytes: [u8; 32] = rand::random();
        bytes.iter().fold(String::with_capacity(64), |mut hex, b| {
            let _ = write!(hex, "{b:02x}");
            hex
        })
    }

    async fn purge_expired(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM reset_tokens WHERE expires_at<=?")
            .bind(db::now())
            .execute(db_pool)
            .await?;
        Ok(())
    }

    /// Starts a reset for `username`; returns the token and the account's
    /// security question. `None` when there is no such account or it never
    /// set a question.
    pub async fn issue(db_pool: &SqlitePool, username: &str, ttl_minutes: i64) -> Result<Option<(String, String)>, sqlx::Error> {
        Self::purge_expired(db_pool).await?;

        let Some((user_id, question)): Option<(String, String)> = sqlx::query_as(
            "SELECT u.id,p.security_question FROM users u JOIN profiles p ON p.user_id=u.id WHERE u.username=? AND p.security_answer_hash<>''",
        )
        .bind(username)
        .fetch_optional(db_pool)
        .await?
        else {
            return Ok(None);
        };

        let token = Self::generate();
        sqlx::query("INSERT INTO reset_tokens (token,user_id,expires_at) VALUES (?,?,?)")
            .bind(&token)
            .bind(&user_id)
            .bind(db::now() + ttl_minutes * 60)
            .execute(db_pool)
            .await?;

        info!(%user_id, "password reset started");
        Ok(Some((token, question)))
    }

    /// Checks the answer and, if right, marks the token verified.
    pub async fn verify_answer(db_pool: &SqlitePool, token: &str, answer: &str) -> AppResult<bool> {
        let Some((user_id, answer_hash)): Option<(String, String)> = sqlx::query_as(
            "SELECT t.user_id,p.security_answer_hash FROM reset_tokens t JOIN profiles p ON p.user_id=t.user_id WHERE t.token=? AND t.expires_at>?",
        )
        .bind(token)
        .bind(db::now())
        .fetch_optional(db_pool)
        .await?
        else {
            return Ok(false);
        };

        if !password::verify_answer(answer, &answer_hash)? {
            warn!(%user_id, "wrong security answer");
            return Ok(false);
        }

        sqlx::query("UPDATE reset_tokens SET verified=1 WHERE token=?")
            .bind(token)
            .execute(db_pool)
            .await?;
        Ok(true)
    }

    /// Sets the new password if the token is verified and unexpired, then
    /// drops every outstanding token of that account.
    pub async fn complete(db_pool: &SqlitePool, token: &str, new_password: &str) -> AppResult<bool> {
        let Some((user_id,)): Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM reset_tokens WHERE token=? AND verified=1 AND expires_at>?")
                .bind(token)
                .bind(db::now())
                .fetch_optional(db_pool)
                .await?
        else {
            return Ok(false);
        };

        let password_hash = password::hash_password(new_password)?;
        let mut tx = db_pool.begin().await?;
        sqlx::query("UPDATE users SET password_hash=? WHERE id=?")
            .bind(password_hash)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM reset_tokens WHERE user_id=?")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(%user_id, "password reset completed");
        Ok(true)
    }
}

#[derive(Deserialize)]
pub(crate) struct StartResetForm {
    username: String,
}

#[derive(Deserialize)]
pub(crate) struct AnswerForm {
    token: String,
    answer: String,
}

#[derive(Deserialize, Validate)]
pub(crate) struct NewPasswordForm {
    token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password1: String,
    #[validate(must_match(other = "password1", message = "Passwords don't match"))]
    password2: String,
}

#[debug_handler]
pub(crate) async fn reset_page() -> impl IntoResponse {
    res::page("Reset password", include_res!(str, "/pages/reset.html"))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn start_reset(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    Form(StartResetForm { username }): Form<StartResetForm>,
) -> AppResult<Response> {
    let Some((token, question)) = ResetToken::issue(&db_pool, username.trim(), config.reset_token_minutes).await? else {
        return Ok(res::refuse("We couldn't start a reset for that account."));
    };

    Ok(res::page(
        "Security question",
        &include_res!(str, "/pages/reset_question.html")
            .replace("{token}", &token)
            .replace("{question}", &html_escape(&question)),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn answer(
    State(db_pool): State<SqlitePool>,
    Form(AnswerForm { token, answer }): Form<AnswerForm>,
) -> AppResult<Response> {
    if !ResetToken::verify_answer(&db_pool, &token, &answer).await? {
        return Ok(res::refuse("That answer doesn't match, or the reset has expired."));
    }

    Ok(res::page(
        "New password",
        &include_res!(str, "/pages/reset_password.html").replace("{token}", &html_escape(&token)),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn set_password(
    State(db_pool): State<SqlitePool>,
    Form(form): Form<NewPasswordForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    if !ResetToken::complete(&db_pool, &form.token, &form.password1).await? {
        return Ok(res::refuse("This reset has expired. Please start again."));
    }

    Ok(Redirect::to("/login").into_response())
}
