mod login;
mod logout;
pub mod password;
mod register;
pub mod reset;

use axum::{routing::{get, post}, Router};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{db, AppResult, AppState};

pub use reset::ResetToken;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
        .route("/register", get(register::register_page).post(register::register))
        .route("/reset", get(reset::reset_page).post(reset::start_reset))
        .route("/reset/answer", post(reset::answer))
        .route("/reset/password", post(reset::set_password))
}

#[derive(Deserialize)]
pub(crate) struct ReturnUrlQuery {
    pub(crate) return_url: Option<String>,
}

/// Only local paths are followed after login/logout.
pub(crate) fn safe_return_url(return_url: Option<String>) -> String {
    return_url
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| "/".to_owned())
}

#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub security_question: &'a str,
    pub security_answer: &'a str,
}

/// Creates an account and its profile together. `None` if the username is taken.
pub async fn create_user(db_pool: &SqlitePool, account: NewAccount<'_>) -> AppResult<Option<String>> {
    let password_hash = password::hash_password(account.password)?;
    let answer_hash = if account.security_answer.trim().is_empty() {
        String::new()
    } else {
        password::hash_answer(account.security_answer)?
    };

    let mut tx = db_pool.begin().await?;
    if sqlx::query("SELECT 1 FROM users WHERE username=?")
        .bind(account.username)
        .fetch_optional(&mut *tx)
        .await?
        .is_some()
    {
        return Ok(None);
    }

    let user_id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO users (id,username,email,first_name,last_name,password_hash,created_at) VALUES (?,?,?,?,?,?,?)")
        .bind(&user_id)
        .bind(account.username)
        .bind(account.email)
        .bind(account.first_name)
        .bind(account.last_name)
        .bind(password_hash)
        .bind(db::now())
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO profiles (user_id,security_question,security_answer_hash) VALUES (?,?,?)")
        .bind(&user_id)
        .bind(account.security_question)
        .bind(answer_hash)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(username = account.username, %user_id, "account created");
    Ok(Some(user_id))
}

/// Checks a username/password pair and returns the account id.
pub async fn authenticate(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<Option<String>> {
    let Some((user_id, password_hash)): Option<(String, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(db_pool)
            .await?
    else {
        return Ok(None);
    };

    Ok(password::verify_password(password, &password_hash)?.then_some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_url_stays_local() {
        assert_eq!(safe_return_url(Some("/c/new".to_owned())), "/c/new");
        assert_eq!(safe_return_url(Some("https://evil.example".to_owned())), "/");
        assert_eq!(safe_return_url(Some("//evil.example".to_owned())), "/");
        assert_eq!(safe_return_url(None), "/");
    }
}
