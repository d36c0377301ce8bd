mod common;

use common::{artist, collaboration, count, notification_kinds, pool, role};
use palettepartner::{
    collabs::{
        self,
        feedback::{leave_feedback, FeedbackOutcome},
        msg::send_msg,
        roles::{apply_to_role, decide, withdraw_application, ApplyOutcome},
        set_collab_status, ChatHub, Status,
    },
    matching::get_or_generate_matches,
};

async fn application_id(db_pool: &sqlx::SqlitePool, role_id: &str, applicant_id: &str) -> String {
    let (id,): (String,) = sqlx::query_as("SELECT id FROM applications WHERE role_id=? AND applicant_id=?")
        .bind(role_id)
        .bind(applicant_id)
        .fetch_one(db_pool)
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn one_application_per_role_and_applicant() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let applicant = artist(&db_pool, "applicant", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;
    let role_id = role(&db_pool, &collab, "Inker").await;

    assert_eq!(apply_to_role(&db_pool, &role_id, &applicant, "hi").await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(apply_to_role(&db_pool, &role_id, &applicant, "again").await.unwrap(), ApplyOutcome::AlreadyApplied);
    assert_eq!(apply_to_role(&db_pool, &role_id, &owner, "me").await.unwrap(), ApplyOutcome::OwnCollaboration);
    assert_eq!(apply_to_role(&db_pool, "missing", &applicant, "").await.unwrap(), ApplyOutcome::NoSuchRole);

    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM applications WHERE role_id=?", &role_id).await, 1);
    assert_eq!(notification_kinds(&db_pool, &owner).await, vec!["application"]);
}

#[tokio::test]
async fn accepting_fills_the_role_and_closes_other_applications() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let alice = artist(&db_pool, "alice", None, None).await;
    let bob = artist(&db_pool, "bob", None, None).await;
    let carol = artist(&db_pool, "carol", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;
    let role_id = role(&db_pool, &collab, "Colorist").await;

    apply_to_role(&db_pool, &role_id, &alice, "").await.unwrap();
    apply_to_role(&db_pool, &role_id, &bob, "").await.unwrap();
    let alice_app = application_id(&db_pool, &role_id, &alice).await;

    assert!(!decide(&db_pool, &alice_app, &bob, true).await.unwrap());
    assert!(decide(&db_pool, &alice_app, &owner, true).await.unwrap());
    assert!(!decide(&db_pool, &alice_app, &owner, false).await.unwrap());

    let statuses: Vec<(String, String)> = sqlx::query_as("SELECT applicant_id,status FROM applications WHERE role_id=? ORDER BY created_at, id")
        .bind(&role_id)
        .fetch_all(&db_pool)
        .await
        .unwrap();
    assert!(statuses.contains(&(alice.clone(), "accepted".to_owned())));
    assert!(statuses.contains(&(bob.clone(), "rejected".to_owned())));

    assert_eq!(collabs::participants(&db_pool, &collab).await.unwrap(), vec![owner.clone(), alice.clone()]);
    assert_eq!(apply_to_role(&db_pool, &role_id, &carol, "").await.unwrap(), ApplyOutcome::RoleFilled);
    assert_eq!(notification_kinds(&db_pool, &alice).await, vec!["application_decision"]);
    assert_eq!(notification_kinds(&db_pool, &bob).await, vec!["application_decision"]);
}

#[tokio::test]
async fn withdraw_only_pending_own_application() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let alice = artist(&db_pool, "alice", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;
    let role_id = role(&db_pool, &collab, "Letterer").await;
    apply_to_role(&db_pool, &role_id, &alice, "").await.unwrap();
    let app = application_id(&db_pool, &role_id, &alice).await;

    assert!(!withdraw_application(&db_pool, &app, &owner).await.unwrap());
    assert!(withdraw_application(&db_pool, &app, &alice).await.unwrap());
    assert!(!withdraw_application(&db_pool, &app, &alice).await.unwrap());
    assert!(!decide(&db_pool, &app, &owner, true).await.unwrap());
}

#[tokio::test]
async fn messages_notify_every_other_participant() {
    let db_pool = pool().await;
    let hub = ChatHub::default();
    let mut rx = hub.subscribe();
    let owner = artist(&db_pool, "owner", None, None).await;
    let alice = artist(&db_pool, "alice", None, None).await;
    let outsider = artist(&db_pool, "outsider", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;
    let role_id = role(&db_pool, &collab, "Writer").await;
    apply_to_role(&db_pool, &role_id, &alice, "").await.unwrap();
    let app = application_id(&db_pool, &role_id, &alice).await;
    decide(&db_pool, &app, &owner, true).await.unwrap();

    assert!(send_msg(&db_pool, &hub, &collab, &owner, "   ").await.unwrap().is_none());
    assert!(send_msg(&db_pool, &hub, &collab, &owner, "**Kickoff** tomorrow").await.unwrap().is_some());

    let event = rx.try_recv().unwrap();
    assert_eq!(event.collaboration_id, collab);
    assert!(event.html.contains("<strong>Kickoff</strong>"));
    assert!(event.html.contains("@owner"));

    assert_eq!(notification_kinds(&db_pool, &alice).await, vec!["application_decision", "message"]);
    assert_eq!(notification_kinds(&db_pool, &owner).await, vec!["application"]);
    assert!(notification_kinds(&db_pool, &outsider).await.is_empty());
}

#[tokio::test]
async fn feedback_once_per_member_and_never_by_owner() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let alice = artist(&db_pool, "alice", None, None).await;
    let outsider = artist(&db_pool, "outsider", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;
    let role_id = role(&db_pool, &collab, "Writer").await;
    apply_to_role(&db_pool, &role_id, &alice, "").await.unwrap();
    let app = application_id(&db_pool, &role_id, &alice).await;
    decide(&db_pool, &app, &owner, true).await.unwrap();

    assert_eq!(leave_feedback(&db_pool, &collab, &owner, 5, "").await.unwrap(), FeedbackOutcome::NotAllowed);
    assert_eq!(leave_feedback(&db_pool, &collab, &outsider, 5, "").await.unwrap(), FeedbackOutcome::NotAllowed);
    assert_eq!(leave_feedback(&db_pool, &collab, &alice, 4, "great").await.unwrap(), FeedbackOutcome::Saved);
    assert_eq!(leave_feedback(&db_pool, &collab, &alice, 1, "changed my mind").await.unwrap(), FeedbackOutcome::AlreadyReviewed);

    let entries = collabs::feedback::for_collaboration(&db_pool, &collab).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].rating, 4);
    assert_eq!(collabs::feedback::average_rating(&entries), Some(4.0));
    assert!(notification_kinds(&db_pool, &owner).await.contains(&"feedback".to_owned()));
}

#[tokio::test]
async fn owner_sets_any_status_in_any_order() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", None, None).await;
    let other = artist(&db_pool, "other", None, None).await;
    let collab = collaboration(&db_pool, &owner, "Zine").await;

    for status in [Status::Completed, Status::Open, Status::Cancelled, Status::InProgress] {
        assert!(set_collab_status(&db_pool, &collab, &owner, status).await.unwrap());
        let loaded = collabs::load(&db_pool, &collab).await.unwrap().unwrap();
        assert_eq!(loaded.status, status.as_str());
    }
    assert!(!set_collab_status(&db_pool, &collab, &other, Status::Open).await.unwrap());
}

#[tokio::test]
async fn deleting_a_collaboration_cascades() {
    let db_pool = pool().await;
    let owner = artist(&db_pool, "owner", Some("Painter"), None).await;
    let alice = artist(&db_pool, "alice", Some("painter"), None).await;
    let collab = collaboration(&db_pool, &owner, "Mural").await;
    let role_id = role(&db_pool, &collab, "Assistant").await;
    apply_to_role(&db_pool, &role_id, &alice, "").await.unwrap();
    assert_eq!(get_or_generate_matches(&db_pool, &collab).await.unwrap().len(), 1);

    sqlx::query("DELETE FROM collaborations WHERE id=?")
        .bind(&collab)
        .execute(&db_pool)
        .await
        .unwrap();

    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM roles WHERE collaboration_id=?", &collab).await, 0);
    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM applications WHERE role_id=?", &role_id).await, 0);
    assert_eq!(count(&db_pool, "SELECT COUNT(*) FROM matches WHERE collaboration_id=?", &collab).await, 0);
}
