/*!
 * Session context extractor
 *
 * Responsibility:
 * - ハンドシェイク middleware が埋めた SessionContext を upgrade handler に渡す
 * - axum 依存は core に閉じ込める
 *
 * Public API:
 * - SessionCtx
 */

mod core;

pub use core::SessionCtx;
