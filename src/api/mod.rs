//! Control API
//!
//! Local HTTP surface for the console: it reads status and events and calls
//! the public peer operations. No coordination logic lives here.

pub mod handlers;
pub mod protocol;


use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;

use crate::peer::node::PeerNode;
use handlers::{
    handle_catalog, handle_download, handle_events, handle_files, handle_publish, handle_query, handle_share,
    handle_status,
};
use protocol::{
    ENDPOINT_CATALOG, ENDPOINT_DOWNLOAD, ENDPOINT_EVENTS, ENDPOINT_FILES, ENDPOINT_PUBLISH, ENDPOINT_QUERY,
    ENDPOINT_SHARE, ENDPOINT_STATUS,
};

pub fn router(node: Arc<PeerNode>) -> Router {
    Router::new()
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_EVENTS, get(handle_events))
        .route(ENDPOINT_FILES, get(handle_files))
        .route(ENDPOINT_CATALOG, get(handle_catalog))
        .route(ENDPOINT_SHARE, post(handle_share))
        .route(ENDPOINT_PUBLISH, post(handle_publish))
        .route(ENDPOINT_QUERY, post(handle_query))
        .route(ENDPOINT_DOWNLOAD, post(handle_download))
        .layer(Extension(node))
}
