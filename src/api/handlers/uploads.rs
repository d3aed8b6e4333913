use crate::api::error::AppError;
use crate::utils::auth::{check_token, client_address};
use axum::{
    RequestExt,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode, header},
};
use std::net::SocketAddr;

fn authorize(state: &crate::AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if check_token(state.config.token.as_deref(), supplied) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid token!".to_string()))
    }
}

/// Handles `GET /`: newline-joined listing of stored files, temp area
/// excluded.
pub async fn list_files(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
) -> Result<String, AppError> {
    authorize(&state, &headers)?;

    let names = state.store.list().await?;
    Ok(names.join("\n"))
}

/// Handles `POST /`: ingests the raw request body as a new file and
/// returns its public URL. The body is consumed as a stream exactly once;
/// it is never buffered whole.
pub async fn upload_file(
    State(state): State<crate::AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<String, AppError> {
    authorize(&state, request.headers())?;

    let client = client_address(request.headers(), peer.map(|ConnectInfo(addr)| addr));
    let stream = request.into_limited_body().into_data_stream();

    let stored = state.uploads.handle_upload(stream, &client).await?;

    Ok(format!("{}{}", state.config.base_url, stored.name()))
}

/// Handles `OPTIONS /`. The CORS layer fills in the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
