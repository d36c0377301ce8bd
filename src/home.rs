use axum::{debug_handler, extract::State, http::header, response::{IntoResponse, Redirect, Response}, routing::get, Router};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{include_res, matching, notifications, res::{self, html_escape}, session, AppResult, AppState};

/// Recommendations shown on the dashboard.
const RECOMMENDATIONS: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/app.js", get(script))
}

#[debug_handler]
pub(crate) async fn index(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    let Some((username,)): Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id=?")
        .bind(&user_id)
        .fetch_optional(&db_pool)
        .await?
    else {
        // account is gone but the session survived
        session.flush().await?;
        return Ok(Redirect::to("/login").into_response());
    };

    let mut collab_items = String::new();
    let collabs: Vec<(String, String, String)> =
        sqlx::query_as("SELECT id,title,status FROM collaborations WHERE owner_id=? ORDER BY created_at DESC, id DESC")
            .bind(&user_id)
            .fetch_all(&db_pool)
            .await?;
    for (id, title, status) in collabs {
        collab_items += &format!(
            "<li><a href=\"/c/{id}\">{}</a> <small>{status}</small> · <a href=\"/c/{id}/matches\">matches</a></li>",
            html_escape(&title),
        );
    }

    let mut recommendation_items = String::new();
    for r in matching::recommend_for_user(&db_pool, &user_id).await?.into_iter().take(RECOMMENDATIONS) {
        recommendation_items += &include_res!(str, "/pages/recommendation.html")
            .replace("{user_id}", &r.candidate.user_id)
            .replace("{username}", &html_escape(&r.candidate.username))
            .replace("{name}", &html_escape(&r.candidate.display_name))
            .replace("{category}", &html_escape(r.candidate.category.as_deref().unwrap_or("")))
            .replace("{score}", &r.score.to_string())
            .replace("{reasons}", &html_escape(&r.reasons.join(" · ")));
    }
    if recommendation_items.is_empty() {
        recommendation_items = "<p>Add a category and tags to your <a href=\"/p/edit\">profile</a> to get recommendations.</p>".to_owned();
    }

    let unread = notifications::unread_count(&db_pool, &user_id).await?;

    Ok(res::page(
        "Dashboard",
        &include_res!(str, "/pages/index.html")
            .replace("{user_id}", &user_id)
            .replace("{username}", &html_escape(&username))
            .replace("{unread}", &unread.to_string())
            .replace("{collab_items}", &collab_items)
            .replace("{recommendations}", &recommendation_items),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_res!(str, "/app.js"),
    )
}
