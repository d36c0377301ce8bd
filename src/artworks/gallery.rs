use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{db, include_res, res::{self, html_escape, http_link}, session, AppResult};

use super::Category;

#[derive(Deserialize)]
pub(crate) struct GalleryQuery {
    category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ArtworkForm {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    title: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    #[serde(default)]
    description: String,
    #[validate(custom(function = "http_link"))]
    image_url: String,
    #[serde(default)]
    category: Category,
}

fn category_options(selected: Option<Category>) -> String {
    Category::ALL
        .iter()
        .map(|c| {
            let sel = if Some(*c) == selected { " selected" } else { "" };
            format!("<option value=\"{}\"{sel}>{}</option>", c.as_str(), c.label())
        })
        .collect()
}

#[debug_handler]
pub(crate) async fn gallery(
    Query(GalleryQuery { category }): Query<GalleryQuery>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    // unknown categories show everything
    let category = category.as_deref().and_then(Category::parse);
    let rows: Vec<(String, String, String, String)> = match category {
        Some(category) => {
            sqlx::query_as("SELECT a.id,a.title,a.image_url,u.username FROM artworks a JOIN users u ON u.id=a.owner_id WHERE a.category=? ORDER BY a.created_at DESC, a.id DESC")
                .bind(category.as_str())
                .fetch_all(&db_pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT a.id,a.title,a.image_url,u.username FROM artworks a JOIN users u ON u.id=a.owner_id ORDER BY a.created_at DESC, a.id DESC")
                .fetch_all(&db_pool)
                .await?
        }
    };

    let mut items = String::new();
    for (id, title, image_url, username) in rows {
        items += &include_res!(str, "/pages/artworks/item.html")
            .replace("{id}", &id)
            .replace("{title}", &html_escape(&title))
            .replace("{image_url}", &html_escape(&image_url))
            .replace("{username}", &html_escape(&username));
    }

    Ok(res::page(
        "Gallery",
        &include_res!(str, "/pages/artworks/gallery.html")
            .replace("{category_options}", &category_options(category))
            .replace("{items}", &items),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_artwork_page(session: Session) -> AppResult<Response> {
    if session::user_id(&session).await?.is_none() {
        return Ok(session::login_redirect("/a/new"));
    }

    Ok(res::page(
        "Share artwork",
        &include_res!(str, "/pages/artworks/new.html")
            .replace("{category_options}", &category_options(Some(Category::default()))),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_artwork(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<ArtworkForm>,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/a/new"));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let uuid = Uuid::now_v7();
    sqlx::query("INSERT INTO artworks (id,owner_id,title,description,image_url,category,created_at) VALUES (?,?,?,?,?,?,?)")
        .bind(uuid.to_string())
        .bind(&user_id)
        .bind(form.title.trim())
        .bind(form.description.trim())
        .bind(form.image_url.trim())
        .bind(form.category.as_str())
        .bind(db::now())
        .execute(&db_pool)
        .await?;

    info!(%uuid, owner = %user_id, "artwork shared");
    Ok(Redirect::to(&format!("/a/{uuid}")).into_response())
}
