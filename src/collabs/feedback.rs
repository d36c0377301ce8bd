use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db,
    notifications::{self, NewNotification, NotificationKind},
    res, session, AppResult,
};

use super::participants;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feedback {
    pub reviewer_id: String,
    pub reviewer_username: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Saved,
    AlreadyReviewed,
    NotAllowed,
}

pub async fn for_collaboration(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as(
        "SELECT f.reviewer_id,u.username AS reviewer_username,f.rating,f.comment,f.created_at FROM feedback f \
         JOIN users u ON u.id=f.reviewer_id WHERE f.collaboration_id=? ORDER BY f.created_at DESC, f.id DESC",
    )
    .bind(collaboration_id)
    .fetch_all(db_pool)
    .await
}

pub fn average_rating(entries: &[Feedback]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let total: u32 = entries.iter().map(|e| u32::from(e.rating)).sum();
    Some(f64::from(total) / entries.len() as f64)
}

/// Team members other than the owner may review once.
pub async fn leave_feedback(db_pool: &SqlitePool, collaboration_id: &str, reviewer_id: &str, rating: u8, comment: &str) -> AppResult<FeedbackOutcome> {
    let members = participants(db_pool, collaboration_id).await?;
    let Some(owner_id) = members.first() else {
        return Ok(FeedbackOutcome::NotAllowed);
    };
    if owner_id == reviewer_id || !members.iter().any(|m| m == reviewer_id) {
        return Ok(FeedbackOutcome::NotAllowed);
    }

    let inserted = sqlx::query(
        "INSERT INTO feedback (id,collaboration_id,reviewer_id,rating,comment,created_at) VALUES (?,?,?,?,?,?) \
         ON CONFLICT(collaboration_id,reviewer_id) DO NOTHING",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(collaboration_id)
    .bind(reviewer_id)
    .bind(rating)
    .bind(comment.trim())
    .bind(db::now())
    .execute(db_pool)
    .await?
    .rows_affected();
    if inserted == 0 {
        return Ok(FeedbackOutcome::AlreadyReviewed);
    }

    notifications::notify(
        db_pool,
        NewNotification::new(owner_id, NotificationKind::Feedback, format!("New {rating}-star feedback on your collaboration"))
            .actor(reviewer_id)
            .link(format!("/c/{collaboration_id}")),
    )
    .await?;

    info!(collaboration_id, reviewer_id, rating, "feedback left");
    Ok(FeedbackOutcome::Saved)
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct FeedbackForm {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    rating: u8,
    #[validate(length(max = 2000, message = "Comment is too long"))]
    #[serde(default)]
    comment: String,
}

#[debug_handler]
pub(crate) async fn post_feedback(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<FeedbackForm>,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    match leave_feedback(&db_pool, &collab_id, &user_id, form.rating, &form.comment).await? {
        FeedbackOutcome::Saved => Ok(Redirect::to(&format!("/c/{collab_id}#feedback")).into_response()),
        FeedbackOutcome::AlreadyReviewed => Ok(res::refuse("You already left feedback for this collaboration.")),
        FeedbackOutcome::NotAllowed => res::sorry("collaboration"),
    }
}
