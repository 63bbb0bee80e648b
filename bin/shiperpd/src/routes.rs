//! Route registration — collects all module routes + system endpoints.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use shiperp_core::Authenticator;

/// Build the complete router with all routes.
///
/// Module routes are mounted under `/{module_name}` and wrapped in the
/// injected authenticator; system endpoints stay public.
pub fn build_router(
    authenticator: Arc<dyn Authenticator>,
    module_routes: Vec<(&str, Router)>,
) -> Router {
    // System endpoints (public).
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    // Mount each module's routes under /{module_name}, behind auth.
    // Module routes are already Router<()> (they called .with_state() internally).
    for (name, router) in module_routes {
        let auth = authenticator.clone();
        let permission = format!("{name}:access");
        let guarded = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let auth = auth.clone();
            let permission = permission.clone();
            async move {
                if let Err(e) = auth.check(req.headers(), &permission) {
                    return e.into_response();
                }
                next.run(req).await
            }
        }));
        app = app.nest(&format!("/{name}"), guarded);
    }

    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "shiperpd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
