use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::AppResult;

pub const USER_ID: &str = "user_id";

pub async fn user_id(session: &Session) -> AppResult<Option<String>> {
    Ok(session.get::<String>(USER_ID).await?)
}

pub fn login_redirect(return_url: &str) -> Response {
    Redirect::to(&format!("/login?return_url={return_url}")).into_response()
}
