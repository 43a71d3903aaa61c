//! HTTP API surface: shared state and router assembly.

pub mod routes;

pub use routes::{create_router, AppState};
