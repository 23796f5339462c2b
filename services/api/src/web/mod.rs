pub mod auth;
pub mod middleware;
pub mod rest;
pub mod routes;
pub mod state;

// Re-export the router builder and state to make them easily accessible
// to the binary that serves them.
pub use middleware::require_auth;
pub use routes::build_router;
pub use state::{AppState, CurrentAccount};
