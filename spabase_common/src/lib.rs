pub mod error;
pub mod files;
pub mod http;
pub mod options;
pub mod request;
pub mod rewriting;
pub mod spa_static_files;
pub mod state;

use std::{future::Future, sync::Arc};

use error::Result;
use request::TaskLocalRequestContext;
use scorched::{logf, LogData, LogImportance};
use spa_static_files::SpaStaticFiles;
use state::{AppState, Config};

/// Builds the application state for `config`, failing before anything is served when the
/// rewrite settings are unusable.
pub fn app_state(config: Arc<Config>) -> Result<Arc<AppState>> {
    let files = SpaStaticFiles::builder()
        .content_root(&config.content_root)
        .request_accessor(Arc::new(TaskLocalRequestContext))
        .configure(|options| config.apply(options))
        .build()?;

    Ok(Arc::new(AppState {
        config,
        files: Arc::new(files),
    }))
}

pub async fn serve<F>(config: Arc<Config>, graceful_shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = app_state(config.clone())?;

    let app = http::service::service(state);

    let listener = tokio::net::TcpListener::bind(config.host).await?;
    logf!(Info, "Serving {} on {}", config.root_path, config.host);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
