use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;

use super::protocol::{
    CatalogResponse, DownloadBody, DownloadResponse, ErrorResponse, EventsQuery, EventsResponse,
    FilesResponse, PublishResponse, QueryRequest, ShareRequest, ShareResponse,
};
use crate::error::PeerError;
use crate::files::download::{DownloadRequest, DownloadSource};
use crate::peer::node::PeerNode;

const DEFAULT_QUERY_WAIT: Duration = Duration::from_millis(2000);

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn status_for(error: &PeerError) -> StatusCode {
    match error {
        PeerError::NoLeader | PeerError::LeaderAddressUnknown => StatusCode::SERVICE_UNAVAILABLE,
        PeerError::CatalogMiss { .. } | PeerError::FileNotFound(_) => StatusCode::NOT_FOUND,
        PeerError::QueryTimeout => StatusCode::GATEWAY_TIMEOUT,
        PeerError::Transfer(_) => StatusCode::BAD_GATEWAY,
        PeerError::Transport(_) | PeerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn peer_error(error: PeerError) -> Response {
    tracing::warn!("Control request failed: {}", error);
    error_response(status_for(&error), error)
}

pub async fn handle_status(Extension(node): Extension<Arc<PeerNode>>) -> Response {
    (StatusCode::OK, Json(node.status())).into_response()
}

pub async fn handle_events(
    Extension(node): Extension<Arc<PeerNode>>,
    Query(query): Query<EventsQuery>,
) -> (StatusCode, Json<EventsResponse>) {
    let events = node.events_since(query.since);
    let latest_seq = events.last().map(|event| event.seq).unwrap_or(query.since);

    (StatusCode::OK, Json(EventsResponse { latest_seq, events }))
}

pub async fn handle_files(Extension(node): Extension<Arc<PeerNode>>) -> Response {
    match node.store().list_files().await {
        Ok(files) => (StatusCode::OK, Json(FilesResponse { files })).into_response(),
        Err(e) => {
            tracing::error!("Failed to list shared files: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn handle_catalog(Extension(node): Extension<Arc<PeerNode>>) -> (StatusCode, Json<CatalogResponse>) {
    (
        StatusCode::OK,
        Json(CatalogResponse {
            catalog: node.catalog_view(),
        }),
    )
}

pub async fn handle_share(Extension(node): Extension<Arc<PeerNode>>, Json(req): Json<ShareRequest>) -> Response {
    match node.share(&req.path).await {
        Ok(filename) => (StatusCode::OK, Json(ShareResponse { filename })).into_response(),
        Err(e) => peer_error(e),
    }
}

pub async fn handle_publish(Extension(node): Extension<Arc<PeerNode>>) -> Response {
    match node.publish().await {
        Ok(published) => (StatusCode::OK, Json(PublishResponse { published })).into_response(),
        Err(e) => peer_error(e),
    }
}

pub async fn handle_query(Extension(node): Extension<Arc<PeerNode>>, body: Option<Json<QueryRequest>>) -> Response {
    let wait = body
        .and_then(|Json(req)| req.wait_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_QUERY_WAIT);

    match node.query_and_wait(wait).await {
        Ok(catalog) => (StatusCode::OK, Json(CatalogResponse { catalog })).into_response(),
        Err(e) => peer_error(e),
    }
}

pub async fn handle_download(Extension(node): Extension<Arc<PeerNode>>, Json(req): Json<DownloadBody>) -> Response {
    let source = match (req.host, req.port) {
        (Some(host), Some(port)) => DownloadSource::Direct { host, port },
        (None, None) => DownloadSource::Catalog(req.policy),
        _ => {
            return error_response(StatusCode::BAD_REQUEST, "host and port must be given together");
        }
    };

    let request = DownloadRequest {
        filename: req.filename,
        source,
        save_dir: req.save_dir,
        expected_hash: req.expected_hash,
    };

    match node.download(request).await {
        Ok(report) => (StatusCode::OK, Json(DownloadResponse { report })).into_response(),
        Err(e) => peer_error(e),
    }
}
