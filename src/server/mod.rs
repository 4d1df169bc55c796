mod handlers;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::API;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{pages, predictions};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/predict", post(pages::predict))
        .route("/api/predictions", post(predictions::create))
        .route("/health", get(health))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|err| unexpected_error(format!("could not bind {}: {}", addr, err)))?
        .serve(app.into_make_service())
        .await
        .map_err(|err| unexpected_error(format!("server error: {}", err)))
}

async fn health() -> &'static str {
    "ok"
}
