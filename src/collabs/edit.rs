use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{include_res, res::{self, html_escape}, session, AppResult};

use super::{list::CollabForm, Status};

#[derive(Deserialize)]
pub(crate) struct StatusForm {
    status: Status,
}

pub async fn set_collab_status(db_pool: &SqlitePool, collaboration_id: &str, owner_id: &str, status: Status) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("UPDATE collaborations SET status=? WHERE id=? AND owner_id=?")
        .bind(status.as_str())
        .bind(collaboration_id)
        .bind(owner_id)
        .execute(db_pool)
        .await?
        .rows_affected()
        > 0)
}

#[debug_handler]
pub(crate) async fn edit_page(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}/edit")));
    };
    let Some(collab) = super::load(&db_pool, &collab_id.to_string()).await? else {
        return res::sorry("collaboration");
    };
    if collab.owner_id != user_id {
        return res::sorry("collaboration");
    }

    Ok(res::page(
        "Edit collaboration",
        &include_res!(str, "/pages/collabs/form.html")
            .replace("{action}", &format!("/c/{}/edit", collab.id))
            .replace("{title}", &html_escape(&collab.title))
            .replace("{description}", &html_escape(&collab.description))
            .replace("{category}", &html_escape(&collab.category))
            .replace("{tags}", &html_escape(&collab.tags))
            .replace("{requirements}", &html_escape(&collab.requirements))
            .replace("{deadline}", &html_escape(collab.deadline.as_deref().unwrap_or("")))
            .replace("{budget}", &html_escape(&collab.budget)),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<CollabForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}/edit")));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let updated = sqlx::query(
        "UPDATE collaborations SET title=?,description=?,category=?,tags=?,requirements=?,deadline=?,budget=? WHERE id=? AND owner_id=?",
    )
    .bind(form.title.trim())
    .bind(form.description.trim())
    .bind(form.category.trim())
    .bind(form.tags.trim())
    .bind(form.requirements.trim())
    .bind(form.deadline())
    .bind(form.budget.trim())
    .bind(collab_id.to_string())
    .bind(&user_id)
    .execute(&db_pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return res::sorry("collaboration");
    }

    Ok(Redirect::to(&format!("/c/{collab_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn set_status(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(StatusForm { status }): Form<StatusForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if !set_collab_status(&db_pool, &collab_id.to_string(), &user_id, status).await? {
        return res::sorry("collaboration");
    }

    info!(%collab_id, status = status.as_str(), "status changed");
    Ok(Redirect::to(&format!("/c/{collab_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn delete(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };

    let deleted = sqlx::query("DELETE FROM collaborations WHERE id=? AND owner_id=?")
        .bind(collab_id.to_string())
        .bind(&user_id)
        .execute(&db_pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return res::sorry("collaboration");
    }

    info!(%collab_id, "collaboration deleted");
    Ok(Redirect::to("/").into_response())
}
