use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db, include_res,
    notifications::{self, NewNotification, NotificationKind},
    res::{self, html_escape},
    session, AppResult,
};

#[derive(Debug, Serialize)]
pub(crate) struct FavoriteState {
    favorited: bool,
}

/// Flips the favorite flag; returns whether it is now set, or `None` for a
/// missing artwork.
pub async fn toggle_favorite(db_pool: &SqlitePool, artwork_id: &str, user_id: &str) -> Result<Option<bool>, sqlx::Error> {
    let Some((owner_id, title)): Option<(String, String)> = sqlx::query_as("SELECT owner_id,title FROM artworks WHERE id=?")
        .bind(artwork_id)
        .fetch_optional(db_pool)
        .await?
    else {
        return Ok(None);
    };

    let removed = sqlx::query("DELETE FROM favorites WHERE user_id=? AND artwork_id=?")
        .bind(user_id)
        .bind(artwork_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed > 0 {
        return Ok(Some(false));
    }

    sqlx::query("INSERT INTO favorites (user_id,artwork_id,created_at) VALUES (?,?,?) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(artwork_id)
        .bind(db::now())
        .execute(db_pool)
        .await?;

    // the owner hears about each fan once, however often they toggle
    let link = format!("/a/{artwork_id}");
    let already_notified = sqlx::query("SELECT 1 FROM notifications WHERE user_id=? AND actor_id=? AND kind=? AND link=?")
        .bind(&owner_id)
        .bind(user_id)
        .bind(NotificationKind::Favorite.as_str())
        .bind(&link)
        .fetch_optional(db_pool)
        .await?
        .is_some();
    if !already_notified {
        notifications::notify(
            db_pool,
            NewNotification::new(owner_id, NotificationKind::Favorite, format!("Someone favorited \"{title}\""))
                .actor(user_id)
                .link(link),
        )
        .await?;
    }

    Ok(Some(true))
}

#[debug_handler]
pub(crate) async fn favorite(
    Path(artwork_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/a/{artwork_id}")));
    };

    let Some(favorited) = toggle_favorite(&db_pool, &artwork_id.to_string(), &user_id).await? else {
        return res::sorry("artwork");
    };
    Ok(Json(FavoriteState { favorited }).into_response())
}

#[debug_handler]
pub(crate) async fn favorites(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/a/favorites"));
    };

    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT a.id,a.title,a.image_url,u.username FROM favorites f JOIN artworks a ON a.id=f.artwork_id \
         JOIN users u ON u.id=a.owner_id WHERE f.user_id=? ORDER BY f.created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&db_pool)
    .await?;

    let mut items = String::new();
    for (id, title, image_url, username) in rows {
        items += &include_res!(str, "/pages/artworks/item.html")
            .replace("{id}", &id)
            .replace("{title}", &html_escape(&title))
            .replace("{image_url}", &html_escape(&image_url))
            .replace("{username}", &html_escape(&username));
    }
    if items.is_empty() {
        items = "<p>No favorites yet.</p>".to_owned();
    }

    Ok(res::page("Favorites", &format!("<h1>Favorites</h1><div class=\"grid\">{items}</div>")).into_response())
}
