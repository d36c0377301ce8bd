use axum::{debug_handler, extract::{ws::Message, Path, State, WebSocketUpgrade}, response::{IntoResponse, Response}};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::broadcast::error::RecvError;
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{res, session, AppResult};

use super::{is_participant, msg::{self, SendMessageQuery}, ChatHub};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn collab_ws(
    Path(collab_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(hub): State<ChatHub>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let collab_id = collab_id.to_string();
    let Some(user_id) = session::user_id(&session).await? else {
        return res::sorry("collaboration");
    };
    if !is_participant(&db_pool, &collab_id, &user_id).await? {
        return res::sorry("collaboration");
    }

    Ok(ws.on_upgrade(async move |stream| {
        let mut rx = hub.subscribe();
        let (mut sender, mut receiver) = stream.split();

        let watched = collab_id.clone();
        let mut broadcast_task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.collaboration_id == watched => {
                        if sender.send(Message::text(event.html)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "chat socket lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(SendMessageQuery { content }) = serde_json::from_slice(&frame.into_data()) else {
                continue;
            };

            if let Err(e) = msg::send_msg(&db_pool, &hub, &collab_id, &user_id, &content).await {
                warn!("chat message dropped: {:#}", e.0);
            }
        }

        broadcast_task.abort();
        let _ = (&mut broadcast_task).await;
    })
    .into_response())
}
