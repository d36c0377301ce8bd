use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Response}};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{include_res, res::{self, html_escape}, AppResult};

#[debug_handler]
pub(crate) async fn profile(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(profile) = super::load(&db_pool, &profile_id.to_string()).await? else {
        return res::sorry("profile");
    };

    let artworks: Vec<(String, String, String)> =
        sqlx::query_as("SELECT id,title,image_url FROM artworks WHERE owner_id=? ORDER BY created_at DESC, id DESC")
            .bind(&profile.user_id)
            .fetch_all(&db_pool)
            .await?;

    let mut artwork_items = String::new();
    for (id, title, image_url) in artworks {
        artwork_items += &format!(
            "<a class=\"artwork\" href=\"/a/{id}\"><img src=\"{}\" alt=\"{title}\"><span>{title}</span></a>",
            html_escape(&image_url),
            title = html_escape(&title),
        );
    }

    Ok(res::page(
        &profile.username,
        &include_res!(str, "/pages/profiles/profile.html")
            .replace("{name}", &html_escape(&format!("{} {}", profile.first_name, profile.last_name)))
            .replace("{username}", &html_escape(&profile.username))
            .replace("{category}", &html_escape(profile.category.as_deref().unwrap_or("")))
            .replace("{tags}", &res::chips(profile.tags.as_deref().unwrap_or("")))
            .replace("{bio}", &res::markdown(&profile.bio))
            .replace("{location}", &html_escape(&profile.location))
            .replace("{hourly_rate}", &html_escape(&profile.hourly_rate))
            .replace("{availability}", &profile.availability)
            .replace("{artworks}", &artwork_items),
    )
    .into_response())
}
