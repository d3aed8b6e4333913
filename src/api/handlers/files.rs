use crate::api::error::AppError;
use crate::utils::validation::is_valid_filename;
use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Handles `GET /:file`: streams a stored file back. The name is validated
/// before any filesystem access so traversal attempts never reach the
/// store.
pub async fn download_file(
    State(state): State<crate::AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    if !is_valid_filename(&name) {
        return Err(AppError::BadRequest("Invalid file name!".to_string()));
    }

    let path = state.store.final_path(&name);
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found!".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Body::from_stream(ReaderStream::new(file)).into_response())
}

/// Handles `OPTIONS /:file`. The CORS layer fills in the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
