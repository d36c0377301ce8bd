pub mod accounts;
pub mod artworks;
pub mod collabs;
pub mod config;
pub mod db;
pub mod home;
pub mod matching;
pub mod notifications;
pub mod profiles;
pub mod res;
pub mod session;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use collabs::ChatHub;
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub hub: ChatHub,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            db_pool,
            config,
            hub: ChatHub::default(),
        }
    }
}

pub fn router(app_state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            app_state.config.session_idle_minutes,
        )));

    Router::new()
        .merge(home::router())
        .merge(accounts::router())
        .nest("/p", profiles::router())
        .nest("/c", collabs::router())
        .nest("/a", artworks::router())
        .nest("/n", notifications::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // details stay in the log; they can carry SQL
        tracing::error!("request failed: {:#}\n{}", self.0, self.0.backtrace());
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            res::page(
                "Something went wrong",
                "<h1>Something went wrong</h1><p>Please try again in a moment.</p><a href=\"/\">go home</a>",
            ),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn internal_errors_hide_their_details() {
        let err = AppError::from(anyhow::anyhow!("no such table: secrets (SELECT * FROM secrets)"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Something went wrong"));
        assert!(!body.contains("secrets"));
    }
}
