use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db, include_res,
    notifications::{self, NewNotification, NotificationKind},
    res::{self, html_escape},
    session, AppResult,
};

use super::{is_participant, participants, ChatHub};

pub const MAX_MESSAGE_LEN: usize = 4000;

#[derive(Deserialize)]
pub(crate) struct SendMessageQuery {
    pub(crate) content: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub content: String,
    pub created_at: i64,
}

pub async fn history(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as(
        "SELECT m.id,m.sender_id,u.username AS sender_username,m.content,m.created_at FROM messages m JOIN users u ON u.id=m.sender_id \
         WHERE m.collaboration_id=? ORDER BY m.created_at, m.id",
    )
    .bind(collaboration_id)
    .fetch_all(db_pool)
    .await
}

/// Stores a message, notifies the other participants and pushes it to open
/// sockets. Blank messages are dropped and yield `None`.
pub async fn send_msg(
    db_pool: &SqlitePool,
    hub: &ChatHub,

    collaboration_id: &str,
    sender_id: &str,

    content: &str,
) -> AppResult<Option<Uuid>> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }
    let content: String = content.chars().take(MAX_MESSAGE_LEN).collect();

    let id = Uuid::now_v7();
    let created_at = db::now();
    sqlx::query("INSERT INTO messages (id,collaboration_id,sender_id,content,created_at) VALUES (?,?,?,?,?)")
        .bind(id.to_string())
        .bind(collaboration_id)
        .bind(sender_id)
        .bind(&content)
        .bind(created_at)
        .execute(db_pool)
        .await?;

    let (sender_username,): (String,) = sqlx::query_as("SELECT username FROM users WHERE id=?")
        .bind(sender_id)
        .fetch_one(db_pool)
        .await?;
    let (title,): (String,) = sqlx::query_as("SELECT title FROM collaborations WHERE id=?")
        .bind(collaboration_id)
        .fetch_one(db_pool)
        .await?;

    let members = participants(db_pool, collaboration_id).await?;
    notifications::fan_out(db_pool, &members, |recipient| {
        NewNotification::new(recipient, NotificationKind::Message, format!("@{sender_username} wrote in \"{title}\""))
            .actor(sender_id)
            .link(format!("/c/{collaboration_id}"))
    })
    .await?;

    hub.publish(collaboration_id, msg_to_html(&sender_username, &content, created_at));
    Ok(Some(id))
}

pub fn msg_to_html(sender_username: &str, content: &str, created_at: i64) -> String {
    include_res!(str, "/pages/collabs/message.html")
        .replace("{username}", &html_escape(sender_username))
        .replace("{when}", &db::format_timestamp(created_at))
        .replace("{content}", &res::markdown(content))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post_msg(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(hub): State<ChatHub>,
    session: Session,
    Form(SendMessageQuery { content }): Form<SendMessageQuery>,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if !is_participant(&db_pool, &collab_id, &user_id).await? {
        return res::sorry("collaboration");
    }

    send_msg(&db_pool, &hub, &collab_id, &user_id, &content).await?;
    Ok(Redirect::to(&format!("/c/{collab_id}#messages")).into_response())
}
