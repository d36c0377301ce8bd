//! Collaborator matching.
//!
//! Profiles are compared by primary category and comma-separated tags;
//! [`ranker`] orders a pool of candidates and [`cache`] stores the result
//! for a collaboration the first time anyone asks.

pub mod cache;
pub mod matcher;
pub mod ranker;
pub mod tags;

use sqlx::SqlitePool;

pub use cache::{get_or_generate_matches, mark_contacted, mark_viewed, MatchRecord};
pub use matcher::{score, InterestProfile, MatchScore};
pub use ranker::{rank_candidates, Candidate, Ranked};
pub use tags::{parse_tags, Delimiter, TagSet};

/// An account as the matcher sees it.
#[derive(Debug, Clone)]
pub struct Artist {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub category: Option<String>,
    interests: InterestProfile,
}

impl Candidate for Artist {
    fn candidate_id(&self) -> &str {
        &self.user_id
    }

    fn interests(&self) -> &InterestProfile {
        &self.interests
    }
}

/// Every account with a profile, oldest first.
pub async fn artists(db_pool: &SqlitePool) -> Result<Vec<Artist>, sqlx::Error> {
    let rows: Vec<(String, String, String, String, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT u.id,u.username,u.first_name,u.last_name,p.category,p.tags FROM users u JOIN profiles p ON p.user_id=u.id ORDER BY u.created_at, u.id",
    )
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, username, first_name, last_name, category, tags)| Artist {
            interests: InterestProfile::new(category.as_deref(), tags.as_deref()),
            display_name: format!("{first_name} {last_name}").trim().to_owned(),
            user_id,
            username,
            category,
        })
        .collect())
}

/// Ranks everyone else against `user_id`'s own profile. Nothing is stored.
pub async fn recommend_for_user(db_pool: &SqlitePool, user_id: &str) -> Result<Vec<Ranked<Artist>>, sqlx::Error> {
    let pool = artists(db_pool).await?;
    let reference = pool
        .iter()
        .find(|artist| artist.user_id == user_id)
        .map(|artist| artist.interests.clone())
        .unwrap_or_default();

    Ok(rank_candidates(user_id, &reference, pool))
}
