use axum::{debug_handler, extract::Query, response::Redirect};
use tower_sessions::Session;

use crate::AppResult;

use super::{safe_return_url, ReturnUrlQuery};

#[debug_handler]
pub(crate) async fn logout(
    Query(ReturnUrlQuery { return_url }): Query<ReturnUrlQuery>,
    session: Session,
) -> AppResult<Redirect> {
    session.flush().await?;
    Ok(Redirect::to(&safe_return_url(return_url)))
}
