use mediarelay_api::app::{create_cors, AppState};
use mediarelay_api::routes::create_router;
use mediarelay_api::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mediarelay_api=info,mediarelay_providers=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let addr = settings.bind_addr;
    let state = AppState::from_settings(settings)?;

    let app = create_router(state.clone())
        .layer(create_cors()) // Apply CORS to ALL routes
        .with_state(state);

    tracing::info!("MediaRelay API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
