use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::{
    db, include_res,
    notifications::{self, NewNotification, NotificationKind},
    res::{self, html_escape},
    session, AppResult,
};

use super::Category;

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Deserialize)]
pub(crate) struct CommentForm {
    content: String,
}

/// Stores a comment and tells the artwork's owner. `None` for blank
/// comments or a missing artwork.
pub async fn add_comment(db_pool: &SqlitePool, artwork_id: &str, author_id: &str, content: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }
    let Some((owner_id, title)): Option<(String, String)> = sqlx::query_as("SELECT owner_id,title FROM artworks WHERE id=?")
        .bind(artwork_id)
        .fetch_optional(db_pool)
        .await?
    else {
        return Ok(None);
    };

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO artwork_comments (id,artwork_id,author_id,content,created_at) VALUES (?,?,?,?,?)")
        .bind(id.to_string())
        .bind(artwork_id)
        .bind(author_id)
        .bind(content.chars().take(MAX_COMMENT_LEN).collect::<String>())
        .bind(db::now())
        .execute(db_pool)
        .await?;

    notifications::notify(
        db_pool,
        NewNotification::new(owner_id, NotificationKind::Comment, format!("New comment on \"{title}\""))
            .actor(author_id)
            .link(format!("/a/{artwork_id}")),
    )
    .await?;

    Ok(Some(id))
}

#[debug_handler]
pub(crate) async fn artwork(
    Path(artwork_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let artwork_id = artwork_id.to_string();
    let Some((owner_id, username, title, description, image_url, category)): Option<(String, String, String, String, String, String)> =
        sqlx::query_as("SELECT a.owner_id,u.username,a.title,a.description,a.image_url,a.category FROM artworks a JOIN users u ON u.id=a.owner_id WHERE a.id=?")
            .bind(&artwork_id)
            .fetch_optional(&db_pool)
            .await?
    else {
        return res::sorry("artwork");
    };
    let viewer = session::user_id(&session).await?;

    let comments: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT u.username,c.content,c.created_at FROM artwork_comments c JOIN users u ON u.id=c.author_id \
         WHERE c.artwork_id=? ORDER BY c.created_at, c.id",
    )
    .bind(&artwork_id)
    .fetch_all(&db_pool)
    .await?;
    let mut comment_items = String::new();
    for (author, content, created_at) in comments {
        comment_items += &format!(
            "<div class=\"comment\"><b>@{}</b> <small>{}</small>{}</div>",
            html_escape(&author),
            db::format_timestamp(created_at),
            res::markdown(&content),
        );
    }

    let (favorites,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE artwork_id=?")
        .bind(&artwork_id)
        .fetch_one(&db_pool)
        .await?;
    let favorited = match &viewer {
        Some(viewer) => sqlx::query("SELECT 1 FROM favorites WHERE artwork_id=? AND user_id=?")
            .bind(&artwork_id)
            .bind(viewer)
            .fetch_optional(&db_pool)
            .await?
            .is_some(),
        None => false,
    };

    let actions = match viewer.as_deref() {
        Some(v) if v == owner_id => format!(
            "<form method=\"post\" action=\"/a/{artwork_id}/delete\"><button>delete</button></form>"
        ),
        Some(_) => include_res!(str, "/pages/artworks/comment_form.html").replace("{id}", &artwork_id),
        None => String::new(),
    };

    let category = Category::parse(&category).unwrap_or_default();
    Ok(res::page(
        &title,
        &include_res!(str, "/pages/artworks/detail.html")
            .replace("{id}", &artwork_id)
            .replace("{title}", &html_escape(&title))
            .replace("{owner_id}", &owner_id)
            .replace("{username}", &html_escape(&username))
            .replace("{image_url}", &html_escape(&image_url))
            .replace("{category}", category.label())
            .replace("{description}", &res::markdown(&description))
            .replace("{favorites}", &favorites.to_string())
            .replace("{heart}", if favorited { "❤️" } else { "🤍" })
            .replace("{comments}", &comment_items)
            .replace("{actions}", &actions),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn comment(
    Path(artwork_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(CommentForm { content }): Form<CommentForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/a/{artwork_id}")));
    };

    add_comment(&db_pool, &artwork_id.to_string(), &user_id, &content).await?;
    Ok(Redirect::to(&format!("/a/{artwork_id}#comments")).into_response())
}

#[debug_handler]
pub(crate) async fn delete(
    Path(artwork_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/a/{artwork_id}")));
    };

    let deleted = sqlx::query("DELETE FROM artworks WHERE id=? AND owner_id=?")
        .bind(artwork_id.to_string())
        .bind(&user_id)
        .execute(&db_pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return res::sorry("artwork");
    }

    info!(%artwork_id, "artwork deleted");
    Ok(Redirect::to(&format!("/p/{user_id}")).into_response())
}
