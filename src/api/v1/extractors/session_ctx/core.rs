use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::realtime::SessionContext;
use crate::state::AppState;

/// Handler で SessionContext を受け取るための extractor
/// ガードが通した後に middleware が request.extensions() に insert 済みである前提
/// 見つからない場合は 500 を返す（ミドルウェア未設定 = サーバ側の配線ミス）
pub struct SessionCtx(pub SessionContext);

impl FromRequestParts<AppState> for SessionCtx {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // remove, not clone: the connection becomes the sole owner
        parts
            .extensions
            .remove::<SessionContext>()
            .map(SessionCtx)
            .ok_or_else(|| {
                tracing::error!("session context missing; is the handshake middleware applied?");
                AppError::Internal
            })
    }
}
