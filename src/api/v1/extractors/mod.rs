mod session_ctx;

pub use session_ctx::SessionCtx;
