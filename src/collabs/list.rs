use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::{macros::format_description, Date};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{db, include_res, res::{self, html_escape}, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    category: Option<String>,
}

/// Fields shared by the create and edit forms.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CollabForm {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub(crate) title: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub(crate) description: String,
    #[validate(length(max = 100, message = "Category is too long"))]
    pub(crate) category: String,
    #[validate(length(max = 500, message = "Too many tags"))]
    pub(crate) tags: String,
    #[validate(length(max = 2000, message = "Too many requirements"))]
    pub(crate) requirements: String,
    #[validate(custom(function = "deadline_format"))]
    #[serde(default)]
    pub(crate) deadline: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub(crate) budget: String,
}

impl CollabForm {
    pub(crate) fn deadline(&self) -> Option<&str> {
        Some(self.deadline.trim()).filter(|d| !d.is_empty())
    }
}

fn deadline_format(deadline: &str) -> Result<(), ValidationError> {
    let deadline = deadline.trim();
    if deadline.is_empty() || Date::parse(deadline, format_description!("[year]-[month]-[day]")).is_ok() {
        return Ok(());
    }
    Err(ValidationError::new("deadline").with_message("Deadline must look like 2025-12-31".into()))
}

#[debug_handler]
pub(crate) async fn list(
    Query(ListQuery { category }): Query<ListQuery>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let category = category.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty());
    let rows: Vec<(String, String, String, String, String)> = match &category {
        Some(category) => {
            sqlx::query_as("SELECT id,title,category,tags,budget FROM collaborations WHERE status='open' AND category=? COLLATE NOCASE ORDER BY created_at DESC, id DESC")
                .bind(category)
                .fetch_all(&db_pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id,title,category,tags,budget FROM collaborations WHERE status='open' ORDER BY created_at DESC, id DESC")
                .fetch_all(&db_pool)
                .await?
        }
    };

    let mut items = String::new();
    for (id, title, category, tags, budget) in rows {
        items += &include_res!(str, "/pages/collabs/item.html")
            .replace("{id}", &id)
            .replace("{title}", &html_escape(&title))
            .replace("{category}", &html_escape(&category))
            .replace("{tags}", &res::chips(&tags))
            .replace("{budget}", &html_escape(&budget));
    }
    if items.is_empty() {
        items = "<p>No open collaborations yet.</p>".to_owned();
    }

    Ok(res::page(
        "Collaborations",
        &include_res!(str, "/pages/collabs/list.html")
            .replace("{category}", &html_escape(category.as_deref().unwrap_or("")))
            .replace("{items}", &items),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_collab_page(session: Session) -> AppResult<Response> {
    if session::user_id(&session).await?.is_none() {
        return Ok(session::login_redirect("/c/new"));
    }

    Ok(res::page(
        "New collaboration",
        &include_res!(str, "/pages/collabs/form.html")
            .replace("{action}", "/c/new")
            .replace("{title}", "")
            .replace("{description}", "")
            .replace("{category}", "")
            .replace("{tags}", "")
            .replace("{requirements}", "")
            .replace("{deadline}", "")
            .replace("{budget}", ""),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_collab(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<CollabForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/c/new"));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let uuid = Uuid::now_v7();
    sqlx::query("INSERT INTO collaborations (id,owner_id,title,description,category,tags,requirements,deadline,budget,created_at) VALUES (?,?,?,?,?,?,?,?,?,?)")
        .bind(uuid.to_string())
        .bind(&user_id)
        .bind(form.title.trim())
        .bind(form.description.trim())
        .bind(form.category.trim())
        .bind(form.tags.trim())
        .bind(form.requirements.trim())
        .bind(form.deadline())
        .bind(form.budget.trim())
        .bind(db::now())
        .execute(&db_pool)
        .await?;

    info!(%uuid, owner = %user_id, "collaboration created");
    Ok(Redirect::to(&format!("/c/{uuid}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_accepts_blank_and_iso_dates() {
        assert!(deadline_format("").is_ok());
        assert!(deadline_format(" 2025-12-31 ").is_ok());
        assert!(deadline_format("31/12/2025").is_err());
        assert!(deadline_format("2025-02-30").is_err());
    }
}
