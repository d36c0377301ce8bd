use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, res::{self, html_escape}, session, AppResult};

#[debug_handler]
pub(crate) async fn feed(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/n"));
    };

    let notifications = super::recent(&db_pool, &user_id).await?;
    let unread = super::unread_count(&db_pool, &user_id).await?;

    let mut items = String::new();
    for n in notifications {
        let body = match &n.link {
            Some(link) => format!("<a href=\"{}\">{}</a>", html_escape(link), html_escape(&n.body)),
            None => html_escape(&n.body).into_owned(),
        };
        let mark = if n.is_read {
            String::new()
        } else {
            format!("<form method=\"post\" action=\"/n/{}/read\"><button>mark read</button></form>", n.id)
        };
        items += &format!(
            "<li class=\"notification {kind}{unread}\">{body} <small>{when}</small>{mark}</li>",
            kind = n.kind,
            unread = if n.is_read { "" } else { " unread" },
            when = db::format_timestamp(n.created_at),
        );
    }

    Ok(res::page(
        "Notifications",
        &format!(
            "<h1>Notifications ({unread} unread)</h1><form method=\"post\" action=\"/n/read\"><button>mark all read</button></form><ul>{items}</ul>"
        ),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn read_one(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/n"));
    };

    super::mark_read(&db_pool, &id.to_string(), &user_id).await?;

    Ok(Redirect::to("/n").into_response())
}

#[debug_handler]
pub(crate) async fn read_all(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/n"));
    };

    super::mark_all_read(&db_pool, &user_id).await?;

    Ok(Redirect::to("/n").into_response())
}
