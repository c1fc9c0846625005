//! WebSocket handshake authentication -> SessionContext in extensions
//!
//! Runs the guard once per upgrade request, before the upgrade handler.
//! On success the populated `SessionContext` travels to the handler through
//! request extensions; on failure the request ends here with a 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::realtime::SessionContext;
use crate::state::AppState;

/// Put the handshake guard in front of the routes of `router`.
///
/// ```ignore
/// let realtime = Router::new().route("/ws", get(ws::upgrade));
/// let realtime = middleware::auth::handshake::apply(realtime, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // route_layer: unmatched paths keep their 404 instead of turning into 401
    router.route_layer(middleware::from_fn_with_state(state, handshake_middleware))
}

async fn handshake_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let mut context = SessionContext::new();
    state.auth.authenticate_headers(req.headers(), &mut context)?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
