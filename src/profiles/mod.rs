mod edit;
mod page;

use axum::{routing::get, Router};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::AppState;

pub use edit::{update_profile, ProfileUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/edit", get(edit::edit_page).post(edit::edit))
        .route("/{uuid}", get(page::profile))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
            Availability::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub location: String,
    pub hourly_rate: String,
    pub availability: String,
    pub security_question: String,
}

pub async fn load(db_pool: &SqlitePool, user_id: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as(
        "SELECT p.user_id,u.username,u.first_name,u.last_name,p.bio,p.category,p.tags,p.location,p.hourly_rate,p.availability,p.security_question \
         FROM profiles p JOIN users u ON u.id=p.user_id WHERE p.user_id=?",
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await
}
