use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    notifications::{self, NewNotification, NotificationKind},
    db, res, session, AppResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    AlreadyApplied,
    OwnCollaboration,
    RoleFilled,
    NoSuchRole,
}

/// One application per (role, applicant); the unique index decides races.
pub async fn apply_to_role(db_pool: &SqlitePool, role_id: &str, applicant_id: &str, message: &str) -> AppResult<ApplyOutcome> {
    let Some((collaboration_id, owner_id, title, filled_by)): Option<(String, String, String, Option<String>)> = sqlx::query_as(
        "SELECT c.id,c.owner_id,r.title,r.filled_by FROM roles r JOIN collaborations c ON c.id=r.collaboration_id WHERE r.id=?",
    )
    .bind(role_id)
    .fetch_optional(db_pool)
    .await?
    else {
        return Ok(ApplyOutcome::NoSuchRole);
    };

    if owner_id == applicant_id {
        return Ok(ApplyOutcome::OwnCollaboration);
    }
    if filled_by.is_some() {
        return Ok(ApplyOutcome::RoleFilled);
    }

    let inserted = sqlx::query(
        "INSERT INTO applications (id,role_id,applicant_id,message,created_at) VALUES (?,?,?,?,?) \
         ON CONFLICT(role_id,applicant_id) DO NOTHING",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(role_id)
    .bind(applicant_id)
    .bind(message.trim())
    .bind(db::now())
    .execute(db_pool)
    .await?
    .rows_affected();
    if inserted == 0 {
        return Ok(ApplyOutcome::AlreadyApplied);
    }

    notifications::notify(
        db_pool,
        NewNotification::new(owner_id, NotificationKind::Application, format!("New application for \"{title}\""))
            .actor(applicant_id)
            .link(format!("/c/{collaboration_id}")),
    )
    .await?;

    info!(role_id, applicant_id, "application received");
    Ok(ApplyOutcome::Applied)
}

/// Accepts or rejects a pending application. Accepting fills the role and
/// rejects every other pending application for it. Returns `false` when the
/// application isn't pending or `owner_id` doesn't own the collaboration.
pub async fn decide(db_pool: &SqlitePool, application_id: &str, owner_id: &str, accept: bool) -> AppResult<bool> {
    let Some((role_id, applicant_id, collaboration_id, title)): Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT a.role_id,a.applicant_id,c.id,r.title FROM applications a \
         JOIN roles r ON r.id=a.role_id JOIN collaborations c ON c.id=r.collaboration_id \
         WHERE a.id=? AND a.status='pending' AND c.owner_id=?",
    )
    .bind(application_id)
    .bind(owner_id)
    .fetch_optional(db_pool)
    .await?
    else {
        return Ok(false);
    };

    let mut rejected: Vec<(String,)> = Vec::new();
    let mut tx = db_pool.begin().await?;
    if accept {
        let filled = sqlx::query("UPDATE roles SET filled_by=? WHERE id=? AND filled_by IS NULL")
            .bind(&applicant_id)
            .bind(&role_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if filled == 0 {
            return Ok(false);
        }
        rejected = sqlx::query_as("SELECT applicant_id FROM applications WHERE role_id=? AND status='pending' AND id<>?")
            .bind(&role_id)
            .bind(application_id)
            .fetch_all(&mut *tx)
            .await?;
        sqlx::query("UPDATE applications SET status='rejected' WHERE role_id=? AND status='pending' AND id<>?")
            .bind(&role_id)
            .bind(application_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("UPDATE applications SET status=? WHERE id=?")
        .bind(if accept { "accepted" } else { "rejected" })
        .bind(application_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let link = format!("/c/{collaboration_id}");
    let verdict = if accept { "accepted" } else { "declined" };
    notifications::notify(
        db_pool,
        NewNotification::new(&applicant_id, NotificationKind::ApplicationDecision, format!("Your application for \"{title}\" was {verdict}"))
            .actor(owner_id)
            .link(&link),
    )
    .await?;
    for (other,) in &rejected {
        notifications::notify(
            db_pool,
            NewNotification::new(other, NotificationKind::ApplicationDecision, format!("\"{title}\" has been filled"))
                .actor(owner_id)
                .link(&link),
        )
        .await?;
    }

    info!(application_id, accept, "application decided");
    Ok(true)
}

pub async fn withdraw_application(db_pool: &SqlitePool, application_id: &str, applicant_id: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("UPDATE applications SET status='withdrawn' WHERE id=? AND applicant_id=? AND status='pending'")
        .bind(application_id)
        .bind(applicant_id)
        .execute(db_pool)
        .await?
        .rows_affected()
        > 0)
}

/// Collaboration that an application belongs to, for redirects.
async fn collaboration_of(db_pool: &SqlitePool, application_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT r.collaboration_id FROM applications a JOIN roles r ON r.id=a.role_id WHERE a.id=?",
    )
    .bind(application_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RoleForm {
    #[validate(length(min = 1, max = 100, message = "Role title is required"))]
    title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    description: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    skills: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    compensation: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    time_commitment: String,
}

#[derive(Deserialize)]
pub(crate) struct ApplyForm {
    #[serde(default)]
    message: String,
}

#[debug_handler]
pub(crate) async fn add_role(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RoleForm>,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect(&format!("/c/{collab_id}")));
    };
    if let Err(errors) = form.validate() {
        return Ok(res::invalid(&errors));
    }

    let inserted = sqlx::query(
        "INSERT INTO roles (id,collaboration_id,title,description,skills,compensation,time_commitment) \
         SELECT ?,id,?,?,?,?,? FROM collaborations WHERE id=? AND owner_id=?",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(form.title.trim())
    .bind(form.description.trim())
    .bind(form.skills.trim())
    .bind(form.compensation.trim())
    .bind(form.time_commitment.trim())
    .bind(&collab_id)
    .bind(&user_id)
    .execute(&db_pool)
    .await?
    .rows_affected();
    if inserted == 0 {
        return res::sorry("collaboration");
    }

    Ok(Redirect::to(&format!("/c/{collab_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn apply(
    Path(role_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(ApplyForm { message }): Form<ApplyForm>,
) -> AppResult<Response> {
    let role_id = role_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/c"));
    };

    let collab: Option<(String,)> = sqlx::query_as("SELECT collaboration_id FROM roles WHERE id=?")
        .bind(&role_id)
        .fetch_optional(&db_pool)
        .await?;

    match apply_to_role(&db_pool, &role_id, &user_id, &message).await? {
        ApplyOutcome::Applied => {}
        ApplyOutcome::AlreadyApplied => return Ok(res::refuse("You already applied for this role.")),
        ApplyOutcome::OwnCollaboration => return Ok(res::refuse("You can't apply to your own collaboration.")),
        ApplyOutcome::RoleFilled => return Ok(res::refuse("This role has already been filled.")),
        ApplyOutcome::NoSuchRole => return res::sorry("role"),
    }

    let target = collab.map(|(id,)| format!("/c/{id}")).unwrap_or_else(|| "/c".to_owned());
    Ok(Redirect::to(&target).into_response())
}

async fn decide_handler(db_pool: SqlitePool, session: Session, application_id: Uuid, accept: bool) -> AppResult<Response> {
    let application_id = application_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/c"));
    };
    let Some(collab_id) = collaboration_of(&db_pool, &application_id).await? else {
        return res::sorry("application");
    };
    if !decide(&db_pool, &application_id, &user_id, accept).await? {
        return Ok(res::refuse("That application can no longer be changed."));
    }

    Ok(Redirect::to(&format!("/c/{collab_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn accept(
    Path(application_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    decide_handler(db_pool, session, application_id, true).await
}

#[debug_handler]
pub(crate) async fn reject(
    Path(application_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    decide_handler(db_pool, session, application_id, false).await
}

#[debug_handler]
pub(crate) async fn withdraw(
    Path(application_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let application_id = application_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return Ok(session::login_redirect("/c"));
    };
    let Some(collab_id) = collaboration_of(&db_pool, &application_id).await? else {
        return res::sorry("application");
    };
    withdraw_application(&db_pool, &application_id, &user_id).await?;

    Ok(Redirect::to(&format!("/c/{collab_id}")).into_response())
}
