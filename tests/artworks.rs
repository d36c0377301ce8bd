mod common;

use common::{artist, count, notification_kinds, pool};
use palettepartner::{artworks::{add_comment, toggle_favorite}, db::now};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn artwork(db_pool: &SqlitePool, owner_id: &str) -> String {
    let id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO artworks (id,owner_id,title,image_url,created_at) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(owner_id)
        .bind("Harbor at dusk")
        .bind("https://example.com/harbor.png")
        .bind(now())
        .execute(db_pool)
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn comments_notify_the_owner_but_not_themselves() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let fan = artist(&db_pool, "fan", None, None).await;
    let art = artwork(&db_pool, &owner).await;

    assert!(add_comment(&db_pool, &art, &fan, "   ").await.unwrap().is_none());
    assert!(add_comment(&db_pool, "missing", &fan, "hello").await.unwrap().is_none());
    assert!(add_comment(&db_pool, &art, &fan, "Lovely light").await.unwrap().is_some());
    assert!(add_comment(&db_pool, &art, &owner, "Thanks!").await.unwrap().is_some());

    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM artwork_comments WHERE artwork_id=?", &art).await, 2);
    assert_eq!(notification_kinds(&db_pool, &owner).await, vec!["comment"]);
}

#[tokio::test]
async fn favorite_toggles() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let fan = artist(&db_pool, "fan", None, None).await;
    let art = artwork(&db_pool, &owner).await;

    assert_eq!(toggle_favorite(&db_pool, &art, &fan).await.unwrap(), Some(true));
    assert_eq!(toggle_favorite(&db_pool, &art, &fan).await.unwrap(), Some(false));
    assert_eq!(toggle_favorite(&db_pool, &art, &fan).await.unwrap(), Some(true));
    assert_eq!(toggle_favorite(&db_pool, "missing", &fan).await.unwrap(), None);

    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM favorites WHERE artwork_id=?", &art).await, 1);
    assert_eq!(notification_kinds(&db_pool, &owner).await, vec!["favorite"]);
}

#[tokio::test]
async fn each_fan_is_announced_once() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let first = artist(&db_pool, "first", None, None).await;
    let second = artist(&db_pool, "second", None, None).await;
    let art = artwork(&db_pool, &owner).await;

    for _ in 0..4 {
        toggle_favorite(&db_pool, &art, &first).await.unwrap();
    }
    toggle_favorite(&db_pool, &art, &second).await.unwrap();
    toggle_favorite(&db_pool, &art, &owner).await.unwrap();

    assert_eq!(notification_kinds(&db_pool, &owner).await, vec!["favorite", "favorite"]);
}
