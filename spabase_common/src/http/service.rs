use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::{path_base::path_base, static_files::static_file};

pub fn service(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(static_file)
        .layer(middleware::from_fn_with_state(state.clone(), path_base))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
