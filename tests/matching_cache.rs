mod common;

use common::{artist, collaboration, count, notification_kinds, pool};
use palettepartner::matching::{get_or_generate_matches, mark_contacted, mark_viewed, recommend_for_user};

#[tokio::test]
async fn generates_ranked_matches_for_the_owner_profile() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Illustrator"), Some("fantasy,portrait")).await;
    let both = artist(&db_pool, "both", Some("Digital Illustrator"), Some("Fantasy")).await;
    let tags = artist(&db_pool, "tags", Some("Sculptor"), Some("portrait, scifi")).await;
    artist(&db_pool, "nobody", Some("Photographer"), Some("nature")).await;
    let collab = collaboration(&db_pool, &owner, "Book cover").await;

    let matches = get_or_generate_matches(&db_pool, &collab).await.unwrap();

    let ids: Vec<&str> = matches.iter().map(|m| m.candidate_id.as_str()).collect();
    assert_eq!(ids, vec![both.as_str(), tags.as_str()]);
    assert_eq!(matches[0].score, 70);
    assert_eq!(matches[0].candidate_username, "both");
    assert_eq!(
        matches[0].reasons,
        vec!["Similar category: Digital Illustrator".to_owned(), "Shared interests: fantasy".to_owned()]
    );
    assert_eq!(matches[1].score, 20);
    assert!(matches.iter().all(|m| !m.viewed && !m.contacted));
    assert!(!ids.contains(&owner.as_str()));
}

#[tokio::test]
async fn second_call_reads_the_cache() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Painter"), Some("oil")).await;
    artist(&db_pool, "a", Some("Oil Painter"), None).await;
    artist(&db_pool, "b", None, Some("OIL")).await;
    let collab = collaboration(&db_pool, &owner, "Mural").await;

    let first = get_or_generate_matches(&db_pool, &collab).await.unwrap();
    let second = get_or_generate_matches(&db_pool, &collab).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM matches WHERE collaboration_id=?", &collab).await, 2);
}

#[tokio::test]
async fn late_joiners_are_not_added_to_an_existing_list() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Painter"), None).await;
    artist(&db_pool, "early", Some("painter"), None).await;
    let collab = collaboration(&db_pool, &owner, "Mural").await;
    assert_eq!(get_or_generate_matches(&db_pool, &collab).await.unwrap().len(), 1);

    artist(&db_pool, "late", Some("Painter"), None).await;
    let again = get_or_generate_matches(&db_pool, &collab).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].candidate_username, "early");
}

#[tokio::test]
async fn racing_first_views_do_not_duplicate_rows() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Animator"), Some("2d,loops")).await;
    artist(&db_pool, "x", Some("2D Animator"), Some("loops")).await;
    artist(&db_pool, "y", None, Some("2d")).await;
    let collab = collaboration(&db_pool, &owner, "Short film").await;

    let (a, b) = tokio::join!(
        get_or_generate_matches(&db_pool, &collab),
        get_or_generate_matches(&db_pool, &collab),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM matches WHERE collaboration_id=?", &collab).await, 2);
}

#[tokio::test]
async fn owner_without_interests_gets_nothing() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    artist(&db_pool, "someone", Some("Painter"), Some("oil")).await;
    let collab = collaboration(&db_pool, &owner, "Anything").await;

    assert!(get_or_generate_matches(&db_pool, &collab).await.unwrap().is_empty());
    assert!(get_or_generate_matches(&db_pool, "no-such-collaboration").await.unwrap().is_empty());
}

#[tokio::test]
async fn viewing_and_contacting() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Writer"), None).await;
    let candidate = artist(&db_pool, "candidate", Some("Comic Writer"), None).await;
    let stranger = artist(&db_pool, "stranger", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Comic").await;
    let matches = get_or_generate_matches(&db_pool, &collab).await.unwrap();
    let match_id = &matches[0].id;

    assert_eq!(mark_viewed(&db_pool, &collab).await.unwrap(), 1);
    assert_eq!(mark_viewed(&db_pool, &collab).await.unwrap(), 0);

    assert_eq!(mark_contacted(&db_pool, match_id, &stranger).await.unwrap(), None);
    assert_eq!(mark_contacted(&db_pool, match_id, &owner).await.unwrap(), Some(collab.clone()));

    let stored = get_or_generate_matches(&db_pool, &collab).await.unwrap();
    assert!(stored[0].viewed);
    assert!(stored[0].contacted);
    assert_eq!(notification_kinds(&db_pool, &candidate).await, vec!["match"]);
}

#[tokio::test]
async fn recommendations_are_computed_not_stored() {
    let db_pool = pool().await;
    let me = artist(&db_pool, "me", Some("Illustrator"), Some("fantasy")).await;
    artist(&db_pool, "close", Some("Illustrator"), Some("fantasy")).await;
    artist(&db_pool, "partial", None, Some("Fantasy")).await;
    artist(&db_pool, "far", Some("Potter"), Some("clay")).await;

    let ranked = recommend_for_user(&db_pool, &me).await.unwrap();
    let names: Vec<&str> = ranked.iter().map(|r| r.candidate.username.as_str()).collect();
    assert_eq!(names, vec!["close", "partial"]);
    assert_eq!(ranked[0].score, 70);
    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM matches WHERE candidate_id<>?", "").await, 0);
}
