mod common;

use common::{artist, pool};
use palettepartner::accounts::{self, authenticate, NewAccount, ResetToken};

#[tokio::test]
async fn usernames_are_unique() {
    let db_pool = pool().await;
    let first = artist(&db_pool, "mira", None, None).await;

    let again = accounts::create_user(
        &db_pool,
        NewAccount {
            username: "mira",
            email: "other@example.com",
            first_name: "Other",
            last_name: "Person",
            password: "whatever-else",
            security_question: "",
            security_answer: "",
        },
    )
    .await
    .unwrap();
    assert!(again.is_none());

    assert_eq!(authenticate(&db_pool, "mira", "correct-horse").await.unwrap(), Some(first));
    assert_eq!(authenticate(&db_pool, "mira", "wrong").await.unwrap(), None);
    assert_eq!(authenticate(&db_pool, "nobody", "correct-horse").await.unwrap(), None);
}

#[tokio::test]
async fn reset_by_security_question() {
    let db_pool = pool().await;
    let user_id = artist(&db_pool, "mira", None, None).await;

    assert!(ResetToken::issue(&db_pool, "nobody", 15).await.unwrap().is_none());
    let (token, question) = ResetToken::issue(&db_pool, "mira", 15).await.unwrap().unwrap();
    assert_eq!(question, "First pet?");

    // unverified tokens can't set a password
    assert!(!ResetToken::complete(&db_pool, &token, "new-password").await.unwrap());
    assert!(!ResetToken::verify_answer(&db_pool, &token, "Rex").await.unwrap());
    assert!(ResetToken::verify_answer(&db_pool, &token, "  mittens ").await.unwrap());
    assert!(ResetToken::complete(&db_pool, &token, "new-password").await.unwrap());

    assert_eq!(authenticate(&db_pool, "mira", "new-password").await.unwrap(), Some(user_id));
    assert_eq!(authenticate(&db_pool, "mira", "correct-horse").await.unwrap(), None);

    assert!(!ResetToken::complete(&db_pool, &token, "third-password").await.unwrap());
}

#[tokio::test]
async fn expired_tokens_are_refused() {
    let db_pool = pool().await;
    artist(&db_pool, "mira", None, None).await;

    let (token, _) = ResetToken::issue(&db_pool, "mira", -1).await.unwrap().unwrap();
    assert!(!ResetToken::verify_answer(&db_pool, &token, "Mittens").await.unwrap());
}

#[tokio::test]
async fn no_reset_without_a_security_answer() {
    let db_pool = pool().await;
    accounts::create_user(
        &db_pool,
        NewAccount {
            username: "quiet",
            email: "quiet@example.com",
            first_name: "Q",
            last_name: "Uiet",
            password: "correct-horse",
            security_question: "",
            security_answer: "  ",
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert!(ResetToken::issue(&db_pool, "quiet", 15).await.unwrap().is_none());
}
