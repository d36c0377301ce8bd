#![allow(dead_code)]

use palettepartner::{
    accounts::{self, NewAccount},
    collabs::roles::{apply_to_role, decide},
    db,
    db::now,
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn pool() -> SqlitePool {
    db::connect("sqlite::memory:").await.unwrap()
}

/// Registers `username` with a profile category and tags.
pub async fn artist(db_pool: &SqlitePool, username: &str, category: Option<&str>, tags: Option<&str>) -> String {
    let user_id = accounts::create_user(
        db_pool,
        NewAccount {
            username,
            email: "artist@example.com",
            first_name: "Test",
            last_name: username,
            password: "correct-horse",
            security_question: "First pet?",
            security_answer: "Mittens",
        },
    )
    .await
    .unwrap()
    .unwrap();

    sqlx::query("UPDATE profiles SET category=?,tags=? WHERE user_id=?")
        .bind(category)
        .bind(tags)
        .bind(&user_id)
        .execute(db_pool)
        .await
        .unwrap();
    user_id
}

pub async fn collaboration(db_pool: &SqlitePool, owner_id: &str, title: &str) -> String {
    let id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO collaborations (id,owner_id,title,created_at) VALUES (?,?,?,?)")
        .bind(&id)
        .bind(owner_id)
        .bind(title)
        .bind(now())
        .execute(db_pool)
        .await
        .unwrap();
    id
}

pub async fn role(db_pool: &SqlitePool, collaboration_id: &str, title: &str) -> String {
    let id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO roles (id,collaboration_id,title) VALUES (?,?,?)")
        .bind(&id)
        .bind(collaboration_id)
        .bind(title)
        .execute(db_pool)
        .await
        .unwrap();
    id
}

pub async fn count(db_pool: &SqlitePool, sql: &str, bind: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).bind(bind).fetch_one(db_pool).await.unwrap();
    n
}

pub async fn notification_kinds(db_pool: &SqlitePool, user_id: &str) -> Vec<String> {
    sqlx::query_as::<_, (String,)>("SELECT kind FROM notifications WHERE user_id=? ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(db_pool)
        .await
        .unwrap()
        .into_iter()
        .map(|(kind,)| kind)
        .collect()
}

/// Registers `username` and puts them on the team through an accepted application.
pub async fn member(db_pool: &SqlitePool, collaboration_id: &str, owner_id: &str, username: &str) -> String {
    let user_id = artist(db_pool, username, None, None).await;
    let role_id = role(db_pool, collaboration_id, username).await;
    apply_to_role(db_pool, &role_id, &user_id, "").await.unwrap();
    let (application_id,): (String,) = sqlx::query_as("SELECT id FROM applications WHERE role_id=? AND applicant_id=?")
        .bind(&role_id)
        .bind(&user_id)
        .fetch_one(db_pool)
        .await
        .unwrap();
    assert!(decide(db_pool, &application_id, owner_id, true).await.unwrap());
    user_id
}
