use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{include_res, res::{self, html_escape}, session::USER_ID, AppResult};

use super::{authenticate, safe_return_url, ReturnUrlQuery};

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
    return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(ReturnUrlQuery { return_url }): Query<ReturnUrlQuery>,
) -> impl IntoResponse {
    res::page(
        "Log in",
        &include_res!(str, "/pages/login.html")
            .replace("{return_url}", &html_escape(&safe_return_url(return_url))),
    )
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { username, password, return_url }): Form<LoginForm>,
) -> AppResult<Response> {
    let username = username.trim();
    let Some(user_id) = authenticate(&db_pool, username, &password).await? else {
        warn!(username, "failed login");
        return Ok(res::refuse("Invalid username or password."));
    };

    session.cycle_id().await?;
    session.insert(USER_ID, &user_id).await?;
    info!(username, "welcome back");

    Ok(Redirect::to(&safe_return_url(return_url)).into_response())
}
