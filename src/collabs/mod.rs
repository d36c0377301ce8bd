mod edit;
pub mod feedback;
mod list;
mod matches;
pub mod msg;
mod page;
pub mod roles;
pub mod tasks;
mod ws;

use axum::{routing::{get, post}, Router};
use serde::Deserialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::AppState;

pub use edit::set_collab_status;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list))
        .route("/new", get(list::new_collab_page).post(list::new_collab))
        .route("/{uuid}", get(page::collab))
        .route("/{uuid}/edit", get(edit::edit_page).post(edit::edit))
        .route("/{uuid}/status", post(edit::set_status))
        .route("/{uuid}/delete", post(edit::delete))
        .route("/{uuid}/roles", post(roles::add_role))
        .route("/{uuid}/tasks", post(tasks::add_task))
        .route("/{uuid}/files", post(tasks::add_file))
        .route("/{uuid}/messages", post(msg::post_msg))
        .route("/{uuid}/ws", get(ws::collab_ws))
        .route("/{uuid}/feedback", post(feedback::post_feedback))
        .route("/{uuid}/matches", get(matches::matches))
        .route("/roles/{uuid}/apply", post(roles::apply))
        .route("/applications/{uuid}/accept", post(roles::accept))
        .route("/applications/{uuid}/reject", post(roles::reject))
        .route("/applications/{uuid}/withdraw", post(roles::withdraw))
        .route("/tasks/{uuid}/toggle", post(tasks::toggle_task))
        .route("/matches/{uuid}/contact", post(matches::contact))
}

/// Owner-set lifecycle label. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Open, Status::InProgress, Status::Completed, Status::Cancelled];

    pub fn as_str(&self) -> &'static str {
        use Status::*;
        match self {
            Open => "open",
            InProgress => "in_progress",
            Completed => "completed",
            Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        use Status::*;
        match self {
            Open => "Open",
            InProgress => "In progress",
            Completed => "Completed",
            Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Collaboration {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub requirements: String,
    pub status: String,
    pub deadline: Option<String>,
    pub budget: String,
    pub created_at: i64,
}

pub async fn load(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Option<Collaboration>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.id,c.owner_id,u.username AS owner_username,c.title,c.description,c.category,c.tags,c.requirements,c.status,c.deadline,c.budget,c.created_at \
         FROM collaborations c JOIN users u ON u.id=c.owner_id WHERE c.id=?",
    )
    .bind(collaboration_id)
    .fetch_optional(db_pool)
    .await
}

/// The owner plus everyone filling a role, owner first.
pub async fn participants(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT owner_id FROM collaborations WHERE id=? \
         UNION ALL \
         SELECT DISTINCT filled_by FROM roles WHERE collaboration_id=? AND filled_by IS NOT NULL",
    )
    .bind(collaboration_id)
    .bind(collaboration_id)
    .fetch_all(db_pool)
    .await?;

    let mut ids: Vec<String> = Vec::with_capacity(rows.len());
    for (id,) in rows {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub async fn is_participant(db_pool: &SqlitePool, collaboration_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    Ok(participants(db_pool, collaboration_id)
        .await?
        .iter()
        .any(|id| id == user_id))
}

#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub collaboration_id: String,
    pub html: String,
}

/// Fan-out of rendered chat messages to open websockets.
#[derive(Debug, Clone)]
pub struct ChatHub(broadcast::Sender<ChatEvent>);

impl Default for ChatHub {
    fn default() -> Self {
        Self(broadcast::channel(64).0)
    }
}

impl ChatHub {
    pub fn publish(&self, collaboration_id: &str, html: String) {
        // no subscribers is fine
        let _ = self.0.send(ChatEvent {
            collaboration_id: collaboration_id.to_owned(),
            html,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.0.subscribe()
    }
}
