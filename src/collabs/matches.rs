use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    include_res,
    matching::{self, MatchRecord},
    res::{self, html_escape},
    session, AppResult,
};

fn match_to_html(record: &MatchRecord) -> String {
    let reasons: String = record
        .reasons
        .iter()
        .map(|r| format!("<li>{}</li>", html_escape(r)))
        .collect();
    let contact = if record.contacted {
        "<span class=\"contacted\">contacted</span>".to_owned()
    } else {
        format!("<form method=\"post\" action=\"/c/matches/{}/contact\"><button>contact</button></form>", record.id)
    };

    include_res!(str, "/pages/collabs/match_item.html")
        .replace("{candidate_id}", &record.candidate_id)
        .replace("{username}", &html_escape(&record.candidate_username))
        .replace("{score}", &record.score.to_string())
        .replace("{new}", if record.viewed { "" } else { " new" })
        .replace("{reasons}", &reasons)
        .replace("{contact}", &contact)
}

#[debug_handler]
pub(crate) async fn matches(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}/matches")));
    };
    let Some(collab) = super::load(&db_pool, &collab_id).await? else {
        return res::sorry("collaboration");
    };
    if collab.owner_id != user_id {
        return res::sorry("collaboration");
    }

    let records = matching::get_or_generate_matches(&db_pool, &collab_id).await?;
    let mut items: String = records.iter().map(match_to_html).collect();
    if items.is_empty() {
        items = "<p>No matches yet. Add a category and tags to your profile to find collaborators.</p>".to_owned();
    }
    matching::mark_viewed(&db_pool, &collab_id).await?;

    Ok(res::page(
        "Matches",
        &include_res!(str, "/pages/collabs/matches.html")
            .replace("{id}", &collab_id)
            .replace("{title}", &html_escape(&collab.title))
            .replace("{items}", &items),
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn contact(
    Path(match_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/"));
    };
    let match_id = match_id.to_string();
    let Some(collab_id) = matching::mark_contacted(&db_pool, &match_id, &user_id).await? else {
        return res::sorry("match");
    };

    Ok(Redirect::to(&format!("/c/{collab_id}/matches")).into_response())
}
