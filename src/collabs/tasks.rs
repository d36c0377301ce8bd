use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;
use validator::Validate;

use crate::{db, res::{self, http_link}, session, AppResult};

use super::{is_participant, participants};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TaskForm {
    #[validate(length(min = 1, max = 200, message = "Task title is required"))]
    title: String,
    #[serde(default)]
    assignee: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct FileForm {
    #[validate(length(min = 1, max = 200, message = "File name is required"))]
    name: String,
    #[validate(custom(function = "http_link"))]
    url: String,
}

/// Adds a task for a team member. Assignees outside the team are dropped.
/// `None` when `user_id` isn't on the team.
pub async fn create_task(
    db_pool: &SqlitePool,
    collaboration_id: &str,
    user_id: &str,
    title: &str,
    assignee: Option<&str>,
) -> Result<Option<Uuid>, sqlx::Error> {
    let members = participants(db_pool, collaboration_id).await?;
    if !members.iter().any(|m| m == user_id) {
        return Ok(None);
    }
    let assignee = assignee
        .map(str::trim)
        .filter(|a| members.iter().any(|m| m == a));

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO tasks (id,collaboration_id,title,assignee_id,created_at) VALUES (?,?,?,?,?)")
        .bind(id.to_string())
        .bind(collaboration_id)
        .bind(title.trim())
        .bind(assignee)
        .bind(db::now())
        .execute(db_pool)
        .await?;
    Ok(Some(id))
}

/// Flips a task between done and open. Returns its collaboration and the
/// new state, or `None` for a missing task or an outsider.
pub async fn toggle_done(db_pool: &SqlitePool, task_id: &str, user_id: &str) -> Result<Option<(String, bool)>, sqlx::Error> {
    let Some((collaboration_id,)): Option<(String,)> = sqlx::query_as("SELECT collaboration_id FROM tasks WHERE id=?")
        .bind(task_id)
        .fetch_optional(db_pool)
        .await?
    else {
        return Ok(None);
    };
    if !is_participant(db_pool, &collaboration_id, user_id).await? {
        return Ok(None);
    }

    let (done,): (bool,) = sqlx::query_as("UPDATE tasks SET done=NOT done WHERE id=? RETURNING done")
        .bind(task_id)
        .fetch_one(db_pool)
        .await?;
    Ok(Some((collaboration_id, done)))
}

/// Records a named link in the workspace. `None` for outsiders.
pub async fn attach_file(
    db_pool: &SqlitePool,
    collaboration_id: &str,
    user_id: &str,
    name: &str,
    url: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    if !is_participant(db_pool, collaboration_id, user_id).await? {
        return Ok(None);
    }

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO collaboration_files (id,collaboration_id,uploader_id,name,url,created_at) VALUES (?,?,?,?,?,?)")
        .bind(id.to_string())
        .bind(collaboration_id)
        .bind(user_id)
        .bind(name.trim())
        .bind(url.trim())
        .bind(db::now())
        .execute(db_pool)
        .await?;
    Ok(Some(id))
}

#[debug_handler]
pub(crate) async fn add_task(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    if create_task(&db_pool, &collab_id, &user_id, &form.title, Some(form.assignee.as_str())).await?.is_none() {
        return res::sorry("collaboration");
    }
    Ok(Redirect::to(&format!("/c/{collab_id}#tasks")).into_response())
}

#[debug_handler]
pub(crate) async fn toggle_task(
    Path(task_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/c"));
    };
    let Some((collab_id, _)) = toggle_done(&db_pool, &task_id.to_string(), &user_id).await? else {
        return res::sorry("task");
    };

    Ok(Redirect::to(&format!("/c/{collab_id}#tasks")).into_response())
}

#[debug_handler]
pub(crate) async fn add_file(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<FileForm>,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    if attach_file(&db_pool, &collab_id, &user_id, &form.name, &form.url).await?.is_none() {
        return res::sorry("collaboration");
    }
    Ok(Redirect::to(&format!("/c/{collab_id}#files")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_links_must_be_web_links() {
        let form = |url: &str| FileForm {
            name: "brief".to_owned(),
            url: url.to_owned(),
        };
        assert!(form("https://example.com/brief.pdf").validate().is_ok());
        assert!(form(" http://example.com ").validate().is_ok());
        assert!(form("javascript:alert(document.cookie)").validate().is_err());
        assert!(form("data:text/html,<script>alert(1)</script>").validate().is_err());
        assert!(form("brief.pdf").validate().is_err());
    }
}
