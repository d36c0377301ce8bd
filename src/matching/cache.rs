use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{db, notifications::{self, NewNotification, NotificationKind}};

use super::{artists, rank_candidates};

/// A stored match between a collaboration and a candidate account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: String,
    pub collaboration_id: String,
    pub candidate_id: String,
    pub candidate_username: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub viewed: bool,
    pub contacted: bool,
    pub created_at: i64,
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: String,
    collaboration_id: String,
    candidate_id: String,
    candidate_username: String,
    score: u32,
    reasons: String,
    viewed: bool,
    contacted: bool,
    created_at: i64,
}

impl From<MatchRow> for MatchRecord {
    fn from(row: MatchRow) -> Self {
        MatchRecord {
            reasons: serde_json::from_str(&row.reasons).unwrap_or_default(),
            id: row.id,
            collaboration_id: row.collaboration_id,
            candidate_id: row.candidate_id,
            candidate_username: row.candidate_username,
            score: row.score,
            viewed: row.viewed,
            contacted: row.contacted,
            created_at: row.created_at,
        }
    }
}

pub async fn stored_matches(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Vec<MatchRecord>, sqlx::Error> {
    let rows: Vec<MatchRow> = sqlx::query_as(
        "SELECT m.id,m.collaboration_id,m.candidate_id,u.username AS candidate_username,m.score,m.reasons,m.viewed,m.contacted,m.created_at \
         FROM matches m JOIN users u ON u.id=m.candidate_id \
         WHERE m.collaboration_id=? ORDER BY m.score DESC, m.created_at DESC, m.id DESC",
    )
    .bind(collaboration_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().map(MatchRecord::from).collect())
}

/// Returns the stored matches of a collaboration, computing and storing them
/// first if there are none yet.
///
/// Matches are generated once against the owner's profile. Accounts that
/// join later are not added to an existing list. Two first views racing
/// each other both insert with `ON CONFLICT DO NOTHING`, so the pair
/// (collaboration, candidate) stays unique and neither request fails.
pub async fn get_or_generate_matches(db_pool: &SqlitePool, collaboration_id: &str) -> Result<Vec<MatchRecord>, sqlx::Error> {
    let existing = stored_matches(db_pool, collaboration_id).await?;
    if !existing.is_empty() {
        debug!(collaboration_id, count = existing.len(), "matches served from cache");
        return Ok(existing);
    }

    let Some((owner_id,)): Option<(String,)> = sqlx::query_as("SELECT owner_id FROM collaborations WHERE id=?")
        .bind(collaboration_id)
        .fetch_optional(db_pool)
        .await?
    else {
        return Ok(Vec::new());
    };

    let pool = artists(db_pool).await?;
    let reference = pool
        .iter()
        .find(|artist| artist.user_id == owner_id)
        .map(|artist| artist.interests.clone())
        .unwrap_or_default();
    let ranked = rank_candidates(&owner_id, &reference, pool);

    let mut tx = db_pool.begin().await?;
    let created_at = db::now();
    let mut inserted = 0;
    for r in &ranked {
        let reasons = serde_json::to_string(&r.reasons).unwrap_or_else(|_| "[]".to_owned());
        inserted += sqlx::query(
            "INSERT INTO matches (id,collaboration_id,candidate_id,score,reasons,created_at) VALUES (?,?,?,?,?,?) \
             ON CONFLICT(collaboration_id,candidate_id) DO NOTHING",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(collaboration_id)
        .bind(&r.candidate.user_id)
        .bind(r.score)
        .bind(reasons)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;

    info!(collaboration_id, candidates = ranked.len(), inserted, "matches generated");
    stored_matches(db_pool, collaboration_id).await
}

pub async fn mark_viewed(db_pool: &SqlitePool, collaboration_id: &str) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("UPDATE matches SET viewed=1 WHERE collaboration_id=? AND viewed=0")
        .bind(collaboration_id)
        .execute(db_pool)
        .await?
        .rows_affected())
}

/// Flags a match as contacted and tells the candidate. Only the collaboration
/// owner may do this. Returns the collaboration id, or `None` when the match
/// isn't theirs.
pub async fn mark_contacted(db_pool: &SqlitePool, match_id: &str, owner_id: &str) -> Result<Option<String>, sqlx::Error> {
    let Some((collaboration_id, candidate_id, title)): Option<(String, String, String)> = sqlx::query_as(
        "SELECT m.collaboration_id,m.candidate_id,c.title FROM matches m JOIN collaborations c ON c.id=m.collaboration_id \
         WHERE m.id=? AND c.owner_id=?",
    )
    .bind(match_id)
    .bind(owner_id)
    .fetch_optional(db_pool)
    .await?
    else {
        return Ok(None);
    };

    sqlx::query("UPDATE matches SET contacted=1 WHERE id=?")
        .bind(match_id)
        .execute(db_pool)
        .await?;

    notifications::notify(
        db_pool,
        NewNotification::new(
            candidate_id,
            NotificationKind::Match,
            format!("You were matched with the collaboration \"{title}\""),
        )
        .actor(owner_id)
        .link(format!("/c/{collaboration_id}")),
    )
    .await?;

    Ok(Some(collaboration_id))
}
