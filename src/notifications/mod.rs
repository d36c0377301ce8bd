mod feed;

use axum::{routing::{get, post}, Router};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::{db, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::feed))
        .route("/read", post(feed::read_all))
        .route("/{id}/read", post(feed::read_one))
}

pub const FEED_SIZE: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Message,
    Application,
    ApplicationDecision,
    Feedback,
    Match,
    Comment,
    Favorite,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        use NotificationKind::*;
        match self {
            Message => "message",
            Application => "application",
            ApplicationDecision => "application_decision",
            Feedback => "feedback",
            Match => "match",
            Comment => "comment",
            Favorite => "favorite",
        }
    }
}

/// A notification waiting to be stored. Build with [`NewNotification::new`]
/// and the optional [`actor`](NewNotification::actor) / [`link`](NewNotification::link).
#[derive(Debug, Clone)]
pub struct NewNotification {
    recipient: String,
    kind: NotificationKind,
    body: String,
    actor: Option<String>,
    link: Option<String>,
}

impl NewNotification {
    pub fn new(recipient: impl Into<String>, kind: NotificationKind, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            kind,
            body: body.into(),
            actor: None,
            link: None,
        }
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Stores a notification. Returns `None` when the actor would be notifying themselves.
pub async fn notify(db_pool: &SqlitePool, n: NewNotification) -> Result<Option<Uuid>, sqlx::Error> {
    if n.actor.as_deref() == Some(n.recipient.as_str()) {
        return Ok(None);
    }

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO notifications (id,user_id,actor_id,kind,body,link,created_at) VALUES (?,?,?,?,?,?,?)")
        .bind(id.to_string())
        .bind(&n.recipient)
        .bind(&n.actor)
        .bind(n.kind.as_str())
        .bind(&n.body)
        .bind(&n.link)
        .bind(db::now())
        .execute(db_pool)
        .await?;

    debug!(recipient = %n.recipient, kind = n.kind.as_str(), "notified");
    Ok(Some(id))
}

/// Builds and stores one notification per recipient.
pub async fn fan_out<'a, I, F>(db_pool: &SqlitePool, recipients: I, build: F) -> Result<usize, sqlx::Error>
where
    I: IntoIterator<Item = &'a String>,
    F: Fn(&str) -> NewNotification,
{
    let mut sent = 0;
    for recipient in recipients {
        if notify(db_pool, build(recipient)).await?.is_some() {
            sent += 1;
        }
    }
    Ok(sent)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub actor_id: Option<String>,
    pub kind: String,
    pub body: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: i64,
}

pub async fn recent(db_pool: &SqlitePool, user_id: &str) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT id,actor_id,kind,body,link,is_read,created_at FROM notifications WHERE user_id=? ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(user_id)
        .bind(FEED_SIZE)
        .fetch_all(db_pool)
        .await
}

pub async fn unread_count(db_pool: &SqlitePool, user_id: &str) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id=? AND is_read=0")
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

/// Marks one of `user_id`'s notifications read; someone else's id is a no-op.
pub async fn mark_read(db_pool: &SqlitePool, notification_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("UPDATE notifications SET is_read=1 WHERE id=? AND user_id=? AND is_read=0")
        .bind(notification_id)
        .bind(user_id)
        .execute(db_pool)
        .await?
        .rows_affected()
        > 0)
}

pub async fn mark_all_read(db_pool: &SqlitePool, user_id: &str) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("UPDATE notifications SET is_read=1 WHERE user_id=? AND is_read=0")
        .bind(user_id)
        .execute(db_pool)
        .await?
        .rows_affected())
}
