use alt_text_analyzer::{
    auth::ServiceAccountTokenSource,
    gate::PasswordGate,
    model::VertexClient,
    storage::BucketUploader,
    web::{self, AppState},
    Analyzer, Config,
};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing(); // after dotenv so RUST_LOG from .env applies
    match dotenv {
        Ok(path) => tracing::info!(".env read from {}", path.display()),
        Err(e) => tracing::debug!("no .env loaded: {e}"),
    }

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::debug!("{:?}", config);

    // temp copies of uploads are kept here and never removed
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let store = BucketUploader::gcs(&config.bucket_name, &config.credentials_json)
        .context("failed to initialise Cloud Storage")?;

    let http = reqwest::Client::new();
    let tokens = ServiceAccountTokenSource::new(http.clone(), config.credentials.clone());
    let describer = VertexClient::new(
        http,
        &config.project_id,
        &config.location,
        &config.model,
        Arc::new(tokens),
    );
    tracing::info!("model endpoint: {}", describer.endpoint());

    let state = Arc::new(AppState {
        analyzer: Analyzer::new(
            Arc::new(store),
            Arc::new(describer),
            config.upload_dir.clone(),
        ),
        gate: Arc::new(PasswordGate::new(config.password.clone())),
    });

    let app = web::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alt_text_analyzer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
