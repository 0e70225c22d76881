//! HTTP API layer for bacefook-rs.
//!
//! - **Endpoints**: user, friendship and analytics routes under `/users`
//! - **State**: services shared by every handler
//! - **Responses**: `{"data": ...}` success envelope
//!
//! Built on Axum 0.8. Errors are rendered by
//! [`AppError`](bacefook_common::AppError) itself.

pub mod endpoints;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
