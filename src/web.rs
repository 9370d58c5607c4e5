use crate::{
    gate::CredentialCheck,
    pipeline::{Analyzer, BatchReport, UploadedImage},
    prompts::{self, Category, CategoryInfo},
    ui,
};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const ACCESS_DENIED: &str = "Access denied.";

pub struct AppState {
    pub analyzer: Analyzer,
    pub gate: Arc<dyn CredentialCheck>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied.")]
    AccessDenied,
    #[error("unknown image category: {0}")]
    UnknownCategory(String),
    #[error("unsupported file {0:?}: only .jpg, .png and .jpeg images are accepted")]
    UnsupportedFile(String),
    #[error("invalid form data: {0}")]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied => StatusCode::UNAUTHORIZED,
            ApiError::UnknownCategory(_) | ApiError::UnsupportedFile(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Multipart(e) => e.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/categories", get(categories))
        .route("/api/login", post(login))
        .route("/api/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(ui::INDEX_HTML)
}

async fn categories() -> Json<Vec<CategoryInfo>> {
    Json(prompts::catalog())
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<StatusCode, ApiError> {
    if state.gate.verify(&request.password) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::AccessDenied)
    }
}

/// The analyze form, fully read before anything is checked.
#[derive(Default)]
struct AnalyzeForm {
    password: Option<String>,
    category: Option<String>,
    images: Vec<UploadedImage>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, ApiError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("password") => form.password = Some(field.text().await?),
            Some("category") => form.category = Some(field.text().await?),
            Some("images") => {
                let raw_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // browsers send an empty part when nothing was picked
                if raw_name.is_empty() && data.is_empty() {
                    continue;
                }
                let image = UploadedImage::new(&raw_name, content_type.as_deref(), data)
                    .ok_or(ApiError::UnsupportedFile(raw_name))?;
                form.images.push(image);
            }
            other => tracing::debug!("ignoring form field {:?}", other),
        }
    }

    Ok(form)
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, ApiError> {
    let form = read_form(multipart).await?;

    let authorized = form
        .password
        .as_deref()
        .is_some_and(|password| state.gate.verify(password));
    if !authorized {
        return Err(ApiError::AccessDenied);
    }

    let category = match form.category.as_deref() {
        None | Some("") => Category::default(),
        Some(label) => {
            Category::from_label(label).ok_or_else(|| ApiError::UnknownCategory(label.into()))?
        }
    };

    tracing::info!(
        "analyzing {} image(s) as {}",
        form.images.len(),
        category.label()
    );
    let report = state.analyzer.run(category, form.images).await;
    Ok(Json(report))
}
