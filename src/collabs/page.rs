use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db, include_res,
    matching::{parse_tags, Delimiter},
    res::{self, html_escape},
    session, AppResult,
};

use super::{feedback, msg, participants, Collaboration, Status};

#[debug_handler]
pub(crate) async fn collab(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(collab) = super::load(&db_pool, &collab_id.to_string()).await? else {
        return res::sorry("collaboration");
    };
    let viewer = session::user_id(&session).await?;
    let is_owner = viewer.as_deref() == Some(collab.owner_id.as_str());
    let members = participants(&db_pool, &collab.id).await?;
    let is_member = viewer.as_ref().is_some_and(|v| members.contains(v));

    let requirements: String = parse_tags(Some(&collab.requirements), Delimiter::Newline)
        .display()
        .map(|r| format!("<li>{}</li>", html_escape(r)))
        .collect();
    let status = Status::ALL
        .iter()
        .find(|s| s.as_str() == collab.status)
        .map_or("Unknown", |s| s.label());

    let owner_controls = if is_owner { owner_controls(&collab) } else { String::new() };
    let roles = roles(&db_pool, &collab, viewer.as_deref(), is_owner).await?;
    let workspace = if is_member {
        workspace(&db_pool, &collab, &members).await?
    } else {
        String::new()
    };
    let feedback = feedback_section(&db_pool, &collab, viewer.as_deref(), is_member && !is_owner).await?;

    Ok(res::page(
        &collab.title,
        &include_res!(str, "/pages/collabs/detail.html")
            .replace("{title}", &html_escape(&collab.title))
            .replace("{owner_id}", &collab.owner_id)
            .replace("{owner}", &html_escape(&collab.owner_username))
            .replace("{status}", status)
            .replace("{category}", &html_escape(&collab.category))
            .replace("{tags}", &res::chips(&collab.tags))
            .replace("{requirements}", &requirements)
            .replace("{description}", &res::markdown(&collab.description))
            .replace("{deadline}", &html_escape(collab.deadline.as_deref().unwrap_or("none")))
            .replace("{budget}", &html_escape(&collab.budget))
            .replace("{owner_controls}", &owner_controls)
            .replace("{roles}", &roles)
            .replace("{workspace}", &workspace)
            .replace("{feedback}", &feedback),
    )
    .into_response())
}

fn owner_controls(collab: &Collaboration) -> String {
    let mut options = String::new();
    for status in Status::ALL {
        let selected = if status.as_str() == collab.status { " selected" } else { "" };
        options += &format!("<option value=\"{}\"{selected}>{}</option>", status.as_str(), status.label());
    }

    include_res!(str, "/pages/collabs/owner_controls.html")
        .replace("{id}", &collab.id)
        .replace("{status_options}", &options)
}

async fn roles(db_pool: &SqlitePool, collab: &Collaboration, viewer: Option<&str>, is_owner: bool) -> AppResult<String> {
    let roles: Vec<(String, String, String, String, String, String, Option<String>)> = sqlx::query_as(
        "SELECT r.id,r.title,r.description,r.skills,r.compensation,r.time_commitment,u.username \
         FROM roles r LEFT JOIN users u ON u.id=r.filled_by WHERE r.collaboration_id=? ORDER BY r.rowid",
    )
    .bind(&collab.id)
    .fetch_all(db_pool)
    .await?;

    let mut out = String::new();
    for (role_id, title, description, skills, compensation, time_commitment, filled_by) in roles {
        let state = match &filled_by {
            Some(username) => format!("Filled by @{}", html_escape(username)),
            None => "Open".to_owned(),
        };

        let mut actions = String::new();
        if is_owner {
            let applications: Vec<(String, String, String, String)> = sqlx::query_as(
                "SELECT a.id,u.username,a.message,a.status FROM applications a JOIN users u ON u.id=a.applicant_id \
                 WHERE a.role_id=? ORDER BY a.created_at, a.id",
            )
            .bind(&role_id)
            .fetch_all(db_pool)
            .await?;
            for (application_id, username, message, status) in applications {
                let decide = if status == "pending" {
                    format!(
                        "<form method=\"post\" action=\"/c/applications/{application_id}/accept\"><button>accept</button></form>\
                         <form method=\"post\" action=\"/c/applications/{application_id}/reject\"><button>reject</button></form>"
                    )
                } else {
                    String::new()
                };
                actions += &format!(
                    "<div class=\"application\">@{} ({status}): {}{decide}</div>",
                    html_escape(&username),
                    html_escape(&message),
                );
            }
        } else if let Some(viewer) = viewer {
            let mine: Option<(String, String)> =
                sqlx::query_as("SELECT id,status FROM applications WHERE role_id=? AND applicant_id=?")
                    .bind(&role_id)
                    .bind(viewer)
                    .fetch_optional(db_pool)
                    .await?;
            actions = match mine {
                Some((application_id, status)) if status == "pending" => format!(
                    "<p>You applied.</p><form method=\"post\" action=\"/c/applications/{application_id}/withdraw\"><button>withdraw</button></form>"
                ),
                Some((_, status)) => format!("<p>Your application: {status}</p>"),
                None if filled_by.is_none() => include_res!(str, "/pages/collabs/apply.html").replace("{role_id}", &role_id),
                None => String::new(),
            };
        }

        out += &format!(
            "<div class=\"role\"><h3>{}</h3><p>{}</p><div>{}</div><p>{} · {}</p><p>{state}</p>{actions}</div>",
            html_escape(&title),
            html_escape(&description),
            res::chips(&skills),
            html_escape(&compensation),
            html_escape(&time_commitment),
        );
    }
    if out.is_empty() {
        out = "<p>No roles yet.</p>".to_owned();
    }
    Ok(out)
}

async fn workspace(db_pool: &SqlitePool, collab: &Collaboration, members: &[String]) -> AppResult<String> {
    let tasks: Vec<(String, String, Option<String>, bool)> = sqlx::query_as(
        "SELECT t.id,t.title,u.username,t.done FROM tasks t LEFT JOIN users u ON u.id=t.assignee_id \
         WHERE t.collaboration_id=? ORDER BY t.created_at, t.id",
    )
    .bind(&collab.id)
    .fetch_all(db_pool)
    .await?;
    let mut task_items = String::new();
    for (task_id, title, assignee, done) in tasks {
        task_items += &format!(
            "<li class=\"{}\">{}{} <form method=\"post\" action=\"/c/tasks/{task_id}/toggle\"><button>{}</button></form></li>",
            if done { "done" } else { "todo" },
            html_escape(&title),
            assignee.map(|a| format!(" → @{}", html_escape(&a))).unwrap_or_default(),
            if done { "reopen" } else { "done" },
        );
    }

    let mut assignees = "<option value=\"\">nobody</option>".to_owned();
    for member in members {
        let (username,): (String,) = sqlx::query_as("SELECT username FROM users WHERE id=?")
            .bind(member)
            .fetch_one(db_pool)
            .await?;
        assignees += &format!("<option value=\"{member}\">@{}</option>", html_escape(&username));
    }

    let files: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT f.name,f.url,u.username FROM collaboration_files f JOIN users u ON u.id=f.uploader_id \
         WHERE f.collaboration_id=? ORDER BY f.created_at, f.id",
    )
    .bind(&collab.id)
    .fetch_all(db_pool)
    .await?;
    let file_items: String = files
        .iter()
        .map(|(name, url, username)| {
            format!(
                "<li><a href=\"{}\">{}</a> by @{}</li>",
                html_escape(url),
                html_escape(name),
                html_escape(username)
            )
        })
        .collect();

    let mut messages = String::new();
    for m in msg::history(db_pool, &collab.id).await? {
        messages += &msg::msg_to_html(&m.sender_username, &m.content, m.created_at);
    }

    Ok(include_res!(str, "/pages/collabs/workspace.html")
        .replace("{id}", &collab.id)
        .replace("{tasks}", &task_items)
        .replace("{assignees}", &assignees)
        .replace("{files}", &file_items)
        .replace("{messages}", &messages))
}

async fn feedback_section(db_pool: &SqlitePool, collab: &Collaboration, viewer: Option<&str>, can_review: bool) -> AppResult<String> {
    let entries = feedback::for_collaboration(db_pool, &collab.id).await?;
    let mut out = String::new();
    if let Some(average) = feedback::average_rating(&entries) {
        out += &format!("<p>Average rating: {average:.1} / 5 ({} reviews)</p>", entries.len());
    }
    for entry in &entries {
        out += &format!(
            "<div class=\"feedback\">{} @{}: {} <small>{}</small></div>",
            "★".repeat(entry.rating as usize),
            html_escape(&entry.reviewer_username),
            html_escape(&entry.comment),
            db::format_timestamp(entry.created_at),
        );
    }

    let already = viewer.is_some_and(|v| entries.iter().any(|e| e.reviewer_id == v));
    if can_review && !already {
        out += &include_res!(str, "/pages/collabs/feedback_form.html").replace("{id}", &collab.id);
    }
    Ok(out)
}
