use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use validator::{Validate, ValidationError};

use crate::{include_res, res, session::USER_ID, AppResult};

use super::{create_user, NewAccount};

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub(crate) struct RegisterForm {
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3 to 30 characters"),
        custom(function = "username_chars")
    )]
    username: String,
    #[validate(length(min = 1, max = 30, message = "First name is required"))]
    first_name: String,
    #[validate(length(min = 1, max = 30, message = "Last name is required"))]
    last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password1: String,
    password2: String,
    #[validate(length(min = 1, max = 200, message = "Pick a security question"))]
    security_question: String,
    #[validate(length(min = 1, max = 200, message = "Answer your security question"))]
    security_answer: String,
}

fn username_chars(username: &str) -> Result<(), ValidationError> {
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username_chars").with_message("Username may only use letters, digits and _".into()));
    }
    Ok(())
}

fn passwords_match(form: &RegisterForm) -> Result<(), ValidationError> {
    if form.password1 != form.password2 {
        return Err(ValidationError::new("password_mismatch").with_message("Passwords don't match".into()));
    }
    Ok(())
}

#[debug_handler]
pub(crate) async fn register_page() -> impl IntoResponse {
    res::page("Join", include_res!(str, "/pages/register.html"))
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let account = NewAccount {
        username: form.username.trim(),
        email: form.email.trim(),
        first_name: form.first_name.trim(),
        last_name: form.last_name.trim(),
        password: &form.password1,
        security_question: form.security_question.trim(),
        security_answer: &form.security_answer,
    };
    let Some(user_id) = create_user(&db_pool, account).await? else {
        return Ok(res::refuse("That username is taken."));
    };

    session.cycle_id().await?;
    session.insert(USER_ID, &user_id).await?;

    Ok(Redirect::to("/p/edit").into_response())
}
