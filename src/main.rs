use palettepartner::{db, router, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palettepartner=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db_pool = db::connect(&config.database_url).await?;
    info!(database = %config.database_url, "database ready");

    let listen_addr = config.listen_addr;
    let app = router(AppState::new(db_pool, config));

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("listening on http://{listen_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
