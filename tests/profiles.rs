mod common;

use common::{artist, pool};
use palettepartner::{
    accounts::ResetToken,
    profiles::{self, update_profile, Availability, ProfileUpdate},
};

fn update<'a>(answer: &'a str) -> ProfileUpdate<'a> {
    ProfileUpdate {
        bio: "Inks comics.",
        category: "  ",
        tags: " ink, comics ",
        location: "Lisbon",
        hourly_rate: "40",
        availability: Availability::Busy,
        security_question: "First pet?",
        security_answer: answer,
    }
}

async fn answer_passes(db_pool: &sqlx::SqlitePool, answer: &str) -> bool {
    let (token, _) = ResetToken::issue(db_pool, "mira", 15).await.unwrap().unwrap();
    ResetToken::verify_answer(db_pool, &token, answer).await.unwrap()
}

#[tokio::test]
async fn blank_answer_keeps_the_stored_one() {
    let db_pool = pool().await;
    let user_id = artist(&db_pool, "mira", Some("Inker"), Some("ink")).await;

    update_profile(&db_pool, &user_id, &update("   ")).await.unwrap();

    let profile = profiles::load(&db_pool, &user_id).await.unwrap().unwrap();
    assert_eq!(profile.category, None);
    assert_eq!(profile.tags.as_deref(), Some("ink, comics"));
    assert_eq!(profile.availability, "busy");
    assert!(answer_passes(&db_pool, "Mittens").await);
}

#[tokio::test]
async fn new_answer_replaces_the_old_one() {
    let db_pool = pool().await;
    let user_id = artist(&db_pool, "mira", None, None).await;

    update_profile(&db_pool, &user_id, &update("Rex")).await.unwrap();

    assert!(!answer_passes(&db_pool, "Mittens").await);
    assert!(answer_passes(&db_pool, " rex").await);
}
