use crate::config::ServerConfig;
use crate::database::{BookStore, StoreError};
use crate::ids::UuidIds;
use crate::models::Book;
use crate::staging;
use crate::state::{AppState, ContentDirs};
use crate::upload::{self, UploadError};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState, upload_limit: usize) -> Router {
    let uploads = ServeDir::new(&state.dirs.uploads);
    let public = ServeDir::new(&state.dirs.public);

    Router::new()
        .route("/upload-book", post(upload_book))
        .route("/books", get(list_books))
        .route("/books/:id", get(get_book))
        .nest_service("/uploads", uploads)
        .fallback_service(public)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the store, syncs the schema and serves until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = BookStore::open(&config.database)?;
    tracing::info!("Database ready at {}", config.database.display());

    let dirs = ContentDirs::new(&config.public_dir, &config.uploads_dir);
    for dir in [&dirs.uploads, &dirs.books] {
        let removed = staging::sweep(dir)?;
        if removed > 0 {
            tracing::warn!("Removed {} unfinished upload files from {}", removed, dir.display());
        }
    }
    let state = AppState::new(store, UuidIds, dirs);
    let app = router(state, config.upload_limit);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Book server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        tracing::error!("Error uploading book: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading book").into_response()
    }
}

async fn upload_book(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, UploadError> {
    let (form, image) = upload::read_multipart(multipart?).await?;
    let (_book, html) =
        tokio::task::spawn_blocking(move || upload::publish_book(&state, form, image)).await??;
    Ok(Html(html))
}

async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.store().and_then(|store| store.list()).map_err(|e| {
        tracing::error!("Error fetching books: {}", e);
        ApiError::Internal("Unable to fetch books")
    })?;
    Ok(Json(books))
}

async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Some(page_id) = id
        .strip_prefix("book_")
        .and_then(|rest| rest.strip_suffix(".html"))
    {
        return match book_page(&state, page_id).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => e.into_response(),
        };
    }

    match find_book(&state, &id) {
        Ok(Some(book)) => Json(book).into_response(),
        Ok(None) => ApiError::NotFound("Book not found").into_response(),
        Err(e) => {
            tracing::error!("Error fetching book {}: {}", id, e);
            ApiError::Internal("Unable to fetch book").into_response()
        }
    }
}

fn find_book(state: &AppState, id: &str) -> Result<Option<Book>, StoreError> {
    state.store()?.get_by_id(id)
}

/// Serves a generated page. The row is authoritative: a page whose file has
/// gone missing is rendered again from the stored record.
async fn book_page(state: &AppState, id: &str) -> Result<String, ApiError> {
    let book = match find_book(state, id) {
        Ok(Some(book)) => book,
        Ok(None) => return Err(ApiError::NotFound("Book not found")),
        Err(e) => {
            tracing::error!("Error fetching book {}: {}", id, e);
            return Err(ApiError::Internal("Unable to fetch book"));
        }
    };

    let path = state.dirs.books.join(book.page_file_name());
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let state = state.clone();
            let id = book.id.clone();
            tokio::task::spawn_blocking(move || upload::regenerate_page(&state, &book))
                .await
                .map_err(UploadError::from)
                .and_then(|regenerated| regenerated)
                .map_err(|e| {
                    tracing::error!("Error regenerating page for {}: {}", id, e);
                    ApiError::Internal("Unable to render book page")
                })
        }
        Err(e) => {
            tracing::error!("Error reading {}: {}", path.display(), e);
            Err(ApiError::Internal("Unable to read book page"))
        }
    }
}
